//! JSON configuration for the command-line tools.
//!
//! Each tool takes a single config path. Sections carry `#[serde(default)]`
//! so a minimal file only names its inputs.

pub mod diff;
pub mod height;

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read and parse a JSON config file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&data)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}

/// File name of `path` without its extension, or `"output"`.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

/// `<dir of input>/<stem>_autogen`.
pub fn default_output_dir(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{}_autogen", file_stem(input)))
}
