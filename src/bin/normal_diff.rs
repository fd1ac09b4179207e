//! `normal_diff <config.json>`: compare two normal map files.
//!
//! Logs the dot-based MSE/PSNR, optionally writes a gray difference image and
//! a JSON report.
use log::{error, info};
use normal_to_height::config::diff::{self, NormalDiffConfig};
use normal_to_height::diagnostics::{InputDescriptor, NormalDiffReport};
use normal_to_height::image::io::{load_normal_map, save_rgb_f32, write_json_file};
use normal_to_height::metrics::{compare_normal_maps, diff_normal_maps, image_mse};
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
    let config = diff::load_config(Path::new(&config_path))?;
    let report = compare(&config)?;

    info!(
        "{} vs {}: MSE = {:.6}, PSNR = {:.3} dB",
        config.reference.display(),
        config.candidate.display(),
        report.mse,
        report.psnr
    );

    if let Some(path) = &config.output.report_json {
        write_json_file(path, &report)?;
        info!("Saved report to {}", path.display());
    }
    Ok(())
}

fn compare(config: &NormalDiffConfig) -> Result<NormalDiffReport> {
    let reference = load_normal_map(&config.reference, config.flip_y, config.flip_x)?;
    let candidate = load_normal_map(&config.candidate, config.flip_y, config.flip_x)?;

    let cmp = compare_normal_maps(&reference, &candidate)?;
    let channel_mse = image_mse(&reference, &candidate)?;

    let diff_image = match &config.output.diff_image {
        Some(path) => {
            let diff = diff_normal_maps(&reference, &candidate, config.mode)?;
            save_rgb_f32(&diff, path)?;
            info!("Saved {:?} difference image to {}", config.mode, path.display());
            Some(path.display().to_string())
        }
        None => None,
    };

    Ok(NormalDiffReport {
        reference: InputDescriptor {
            path: config.reference.display().to_string(),
            width: reference.w,
            height: reference.h,
        },
        candidate: config.candidate.display().to_string(),
        mode: config.mode,
        mse: cmp.mse,
        psnr: cmp.psnr,
        channel_mse,
        diff_image,
    })
}

fn usage() -> Error {
    Error::Config("Usage: normal_diff <config.json>".to_string())
}
