//! Serializable run reports and stage timings.
//!
//! Solvers fill a `TimingBreakdown` as they go; the tools turn the final
//! `GenerationResults` into `GenerationReport`s and write them as JSON.

pub mod report;
pub mod timing;

pub use report::{
    GenerationReport, HeightToolReport, InputDescriptor, NormalDiffReport, NormalScore,
};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
