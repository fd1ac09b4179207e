//! `normal_to_height <config.json>`: reconstruct height maps from a normal map.
//!
//! Writes `<stem>_gh_<N>.png` per relaxation iteration count (or a single
//! `<stem>_glh_<CG iterations>.png` for the linear solver) into the output
//! directory, optionally re-estimated normals with their PSNR, a combined
//! comparison sheet in sweep mode, and a JSON report.
use log::error;
use normal_to_height::batch::run_height_tool;
use normal_to_height::config::height;
use normal_to_height::{Error, Result};
use std::env;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = height::load_config(Path::new(&config_path))?;
    run_height_tool(&config)?;
    Ok(())
}

fn usage() -> Error {
    Error::Config("Usage: normal_to_height <config.json>".to_string())
}
