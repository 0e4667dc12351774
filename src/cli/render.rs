// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use crate::cli::args::RenderArgs;
use crate::error::Result;
use crate::keypoints::PoseDocument;
use crate::render::{encode_png, render_document};
use crate::success;

/// Re-render a stored OpenPose document.
///
/// # Errors
///
/// Returns JSON errors for a malformed document and I/O errors for the files.
pub fn run_render(args: &RenderArgs) -> Result<PathBuf> {
    let document = PoseDocument::load(&args.input)?;
    let image = render_document(&document, &args.canvas.render_config());

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("png"));
    std::fs::write(&output, encode_png(&image)?)?;

    success!(
        "Rendered {} {} to {}",
        document.people.len(),
        if document.people.len() == 1 { "person" } else { "people" },
        output.display()
    );
    Ok(output)
}
