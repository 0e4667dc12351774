// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::{Path, PathBuf};

use crate::cli::args::ExtractArgs;
use crate::cli::logging::set_verbose;
use crate::detector::DetectorPool;
use crate::error::Result;
use crate::mapper::SkeletonMapper;
use crate::pipeline::analyze_file;
use crate::render::encode_png;
use crate::{VERSION, info, section, success, verbose, warn};

/// Output file paths `<dir>/<stem>_pose.png` and `<dir>/<stem>_pose.json`.
///
/// `dir` defaults to the directory of `source`.
#[must_use]
pub fn output_paths(source: &Path, dir: Option<&Path>) -> (PathBuf, PathBuf) {
    let stem = source
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy());
    let dir = dir.map_or_else(
        || source.parent().unwrap_or_else(|| Path::new("")).to_path_buf(),
        Path::to_path_buf,
    );
    (
        dir.join(format!("{stem}_pose.png")),
        dir.join(format!("{stem}_pose.json")),
    )
}

/// Detect, map and render one image, writing the PNG and JSON outputs.
///
/// # Errors
///
/// Returns detector pool errors and I/O errors writing the outputs.
pub async fn run_extract(args: &ExtractArgs) -> Result<()> {
    set_verbose(args.verbose);
    section!("pose-control {VERSION}");

    let detector_config = args.detector_config();
    detector_config.validate()?;
    let render_config = args.canvas.render_config();

    let pool = DetectorPool::new(detector_config);
    let analysis = analyze_file(
        &pool,
        &args.source,
        &SkeletonMapper::default(),
        &render_config,
    )
    .await?;

    let people = analysis.document.people.len();
    if people == 0 {
        warn!("No people detected in {}", args.source.display());
    }
    verbose!(
        "Speed: {:.1}ms detect, {:.1}ms map, {:.1}ms render",
        analysis.speed.detect.unwrap_or(0.0),
        analysis.speed.map.unwrap_or(0.0),
        analysis.speed.render.unwrap_or(0.0)
    );

    let (png_path, json_path) = output_paths(&args.source, args.output.as_deref());
    if let Some(dir) = png_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&png_path, encode_png(&analysis.image)?).await?;
    analysis.document.save(&json_path)?;

    info!(
        "{}: {people} {}",
        args.source.display(),
        if people == 1 { "person" } else { "people" }
    );
    success!(
        "Saved {} and {}",
        png_path.display(),
        json_path.display()
    );
    Ok(())
}
