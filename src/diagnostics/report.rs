use crate::diagnostics::TimingBreakdown;
use crate::metrics::{mse_to_psnr, DiffMode, NormalComparison, NORMAL_PSNR_PEAK};
use crate::normals::NormalMethod;
use crate::solver::{GenerationResults, HeightGenMethod};
use serde::Serialize;

/// Size of the decoded normal map.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub path: String,
    pub width: usize,
    pub height: usize,
}

/// PSNR of normals re-estimated from a generated height map.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalScore {
    pub method: NormalMethod,
    /// Dot-based MSE and PSNR; PSNR is `null` in JSON for an exact match.
    pub mse: f64,
    pub psnr: f64,
    /// Per-channel MSE of the vectors and its PSNR at peak 2.
    pub channel_mse: f64,
    pub channel_psnr: f64,
}

impl NormalScore {
    pub fn new(method: NormalMethod, cmp: NormalComparison, channel_mse: f64) -> Self {
        Self {
            method,
            mse: cmp.mse,
            psnr: cmp.psnr,
            channel_mse,
            channel_psnr: mse_to_psnr(channel_mse, NORMAL_PSNR_PEAK),
        }
    }
}

/// One height generation run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub method: HeightGenMethod,
    pub requested_iterations: u32,
    pub iterations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver_error: Option<f32>,
    pub converged: bool,
    pub elapsed_ms: f64,
    pub min_height: f32,
    pub max_height: f32,
    pub height_range: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub normal_scores: Vec<NormalScore>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    pub timings: TimingBreakdown,
}

impl GenerationReport {
    pub fn from_results(requested_iterations: u32, results: &GenerationResults) -> Self {
        let hm = &results.height_map;
        Self {
            method: results.method,
            requested_iterations,
            iterations: results.iterations,
            max_iterations: results.max_iterations,
            solver_error: results.solver_error,
            converged: results.converged,
            elapsed_ms: results.elapsed_ms,
            min_height: hm.min_h,
            max_height: hm.max_h,
            height_range: hm.range(),
            normal_scores: Vec::new(),
            outputs: Vec::new(),
            timings: results.timings.clone(),
        }
    }
}

/// Everything the batch tool did for one input.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeightToolReport {
    pub input: InputDescriptor,
    pub runs: Vec<GenerationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_view: Option<String>,
}

/// Result of comparing two normal map files.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalDiffReport {
    pub reference: InputDescriptor,
    pub candidate: String,
    pub mode: DiffMode,
    pub mse: f64,
    pub psnr: f64,
    /// Plain per-channel MSE of the decoded vectors.
    pub channel_mse: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_image: Option<String>,
}
