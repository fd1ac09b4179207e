use super::load_json;
use crate::error::Result;
use crate::metrics::DiffMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct NormalDiffConfig {
    pub reference: PathBuf,
    pub candidate: PathBuf,
    /// Flips applied to both maps when decoding.
    #[serde(default)]
    pub flip_y: bool,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub mode: DiffMode,
    #[serde(default)]
    pub output: DiffOutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DiffOutputConfig {
    pub diff_image: Option<PathBuf>,
    pub report_json: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<NormalDiffConfig> {
    load_json(path)
}
