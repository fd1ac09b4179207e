use super::{default_output_dir, file_stem, load_json};
use crate::error::{Error, Result};
use crate::solver::{GenerationParams, HeightGenMethod};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Iteration counts visited in sweep mode.
pub const ITERATION_SWEEP: [u32; 9] = [32, 64, 128, 256, 512, 1024, 2048, 4096, 32768];
/// Subset of the sweep placed on the combined comparison sheet.
pub const COMBINED_VIEW_ITERATIONS: [u32; 5] = [32, 128, 512, 2048, 32768];

#[derive(Debug, Deserialize)]
pub struct HeightToolConfig {
    pub input: PathBuf,
    /// Negate decoded Y (maps authored with +Y up).
    #[serde(default)]
    pub flip_y: bool,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub generation: GenerationParams,
    /// Run every count in `ITERATION_SWEEP` instead of `generation.iterations`
    /// (relaxation methods only).
    #[serde(default)]
    pub iteration_range: bool,
    /// Re-estimate normals from each height map and score them.
    #[serde(default)]
    pub generate_normals: bool,
    #[serde(default)]
    pub output: HeightOutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HeightOutputConfig {
    /// Defaults to `<input stem>_autogen` next to the input.
    pub dir: Option<PathBuf>,
    pub height_bit_depth: u8,
    pub report_json: Option<PathBuf>,
    pub combined_view: bool,
}

impl Default for HeightOutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            height_bit_depth: 16,
            report_json: None,
            combined_view: true,
        }
    }
}

impl HeightToolConfig {
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.output.height_bit_depth, 8 | 16) {
            return Err(Error::Config(format!(
                "output.height_bit_depth must be 8 or 16, got {}",
                self.output.height_bit_depth
            )));
        }
        let g = &self.generation;
        if g.iterations == 0 && !self.sweeps() {
            return Err(Error::Config("generation.iterations must be positive".into()));
        }
        if !(g.iteration_multiplier.is_finite() && g.iteration_multiplier > 0.0) {
            return Err(Error::Config(format!(
                "generation.iteration_multiplier must be positive, got {}",
                g.iteration_multiplier
            )));
        }
        if !g.slope_scale.is_finite() {
            return Err(Error::Config("generation.slope_scale must be finite".into()));
        }
        if !(g.linear.tolerance > 0.0) {
            return Err(Error::Config(format!(
                "generation.linear.tolerance must be positive, got {}",
                g.linear.tolerance
            )));
        }
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output
            .dir
            .clone()
            .unwrap_or_else(|| default_output_dir(&self.input))
    }

    pub fn stem(&self) -> String {
        file_stem(&self.input)
    }

    /// Whether the relaxation budget is swept. The linear solver stops on
    /// its tolerance, so it never sweeps.
    pub fn sweeps(&self) -> bool {
        self.iteration_range && self.generation.method != HeightGenMethod::LinearSystem
    }

    /// Iteration counts to run, in order.
    pub fn iteration_list(&self) -> Vec<u32> {
        if self.sweeps() {
            ITERATION_SWEEP.to_vec()
        } else {
            vec![self.generation.iterations]
        }
    }
}

pub fn load_config(path: &Path) -> Result<HeightToolConfig> {
    let config: HeightToolConfig = load_json(path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relax::EdgeWeighting;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg: HeightToolConfig = serde_json::from_str(r#"{"input":"maps/brick.png"}"#).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.generation.method, HeightGenMethod::Relaxation);
        assert_eq!(cfg.iteration_list(), vec![512]);
        assert_eq!(cfg.output.height_bit_depth, 16);
        assert!(cfg.output.combined_view);
        assert_eq!(cfg.output_dir(), PathBuf::from("maps/brick_autogen"));
        assert_eq!(cfg.stem(), "brick");
    }

    #[test]
    fn nested_sections_parse() {
        let cfg: HeightToolConfig = serde_json::from_str(
            r#"{
                "input": "n.png",
                "flip_y": true,
                "iteration_range": true,
                "generation": {
                    "method": "relaxation_edge_aware",
                    "slope_scale": 2.0,
                    "edge_aware": { "weighting": "uniform", "max_weighted_level": 3 },
                    "linear": { "warm_start_iterations": null }
                },
                "output": { "dir": "out", "height_bit_depth": 8 }
            }"#,
        )
        .unwrap();
        cfg.validate().unwrap();
        assert!(cfg.flip_y);
        assert_eq!(cfg.iteration_list(), ITERATION_SWEEP.to_vec());
        assert_eq!(cfg.generation.edge_aware.weighting, EdgeWeighting::Uniform);
        assert_eq!(cfg.generation.edge_aware.max_weighted_level, Some(3));
        assert_eq!(cfg.generation.linear.warm_start_iterations, None);
        assert_eq!(cfg.output_dir(), PathBuf::from("out"));
    }

    #[test]
    fn linear_system_never_sweeps() {
        let cfg: HeightToolConfig = serde_json::from_str(
            r#"{"input":"n.png","iteration_range":true,"generation":{"method":"linear_system"}}"#,
        )
        .unwrap();
        cfg.validate().unwrap();
        assert!(!cfg.sweeps());
        assert_eq!(cfg.iteration_list(), vec![512]);
    }

    #[test]
    fn invalid_bit_depth_is_rejected() {
        let cfg: HeightToolConfig =
            serde_json::from_str(r#"{"input":"n.png","output":{"height_bit_depth":12}}"#).unwrap();
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }
}
