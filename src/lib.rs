#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod batch;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod height;
pub mod image;
pub mod metrics;
pub mod normals;
pub mod solver;

// Solver internals – public for tools and tests.
pub mod gradient;
pub mod lsq;
pub mod pyramid;
pub mod relax;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{Error, Result};
pub use crate::height::HeightMap;
pub use crate::image::ImageF32;
pub use crate::solver::{
    generate_height_map, GenerationParams, GenerationResults, HeightGenMethod, HeightSolver,
    SolveOutput,
};

// The three strategies behind `HeightSolver`.
pub use crate::lsq::LinearSystemSolver;
pub use crate::relax::{EdgeAwareSolver, MultigridSolver};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```
/// use normal_to_height::prelude::*;
///
/// let flat = ImageF32::filled(32, 32, &[0.0, 0.0, 1.0]);
/// let params = GenerationParams {
///     iterations: 64,
///     ..Default::default()
/// };
/// let results = generate_height_map(&flat, &params).unwrap();
/// assert_eq!(results.height_map.width(), 32);
/// let normals = estimate_normal_map(&results.height_map, NormalMethod::Sobel);
/// let score = compare_normal_maps(&flat, &normals).unwrap();
/// assert!(score.mse < 1e-9);
/// ```
pub mod prelude {
    pub use crate::metrics::{compare_normal_maps, DiffMode};
    pub use crate::normals::{estimate_normal_map, NormalMethod};
    pub use crate::{
        generate_height_map, GenerationParams, GenerationResults, HeightGenMethod, HeightMap,
        HeightSolver, ImageF32,
    };
}
