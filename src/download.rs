// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Landmark model asset management.
//!
//! Model files are looked up in [`DetectorConfig::model_dir`] (default: the
//! user cache directory). A missing file is fetched from
//! [`DetectorConfig::model_url`] when one is configured; otherwise it has to
//! be placed there by hand.
//!
//! [`DetectorConfig::model_dir`]: crate::config::DetectorConfig::model_dir
//! [`DetectorConfig::model_url`]: crate::config::DetectorConfig::model_url

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::detector::DetectorKind;
use crate::error::{PoseError, Result};
use crate::verbose;

/// Connection timeout in seconds.
const CONNECT_TIMEOUT: u64 = 30;

/// Read timeout in seconds.
const READ_TIMEOUT: u64 = 300;

/// Model file name for a detector kind.
#[must_use]
pub const fn model_file(kind: DetectorKind) -> &'static str {
    match kind {
        DetectorKind::Pose => "pose_landmarker.onnx",
        DetectorKind::Hand => "hand_landmarker.onnx",
        DetectorKind::Face => "face_landmarker.onnx",
    }
}

/// Download URL of a detector's model under `base_url`.
#[must_use]
pub fn model_url(base_url: &str, kind: DetectorKind) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), model_file(kind))
}

/// Default directory for model files.
///
/// Falls back to `./models` on platforms without a user cache directory.
#[must_use]
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(
        || PathBuf::from("models"),
        |dir| dir.join("pose-control").join("models"),
    )
}

/// Format bytes as human-readable string (e.g., "10.4MB").
fn format_bytes(bytes: f64) -> String {
    const UNITS: [(&str, f64); 3] = [
        ("GB", 1024.0 * 1024.0 * 1024.0),
        ("MB", 1024.0 * 1024.0),
        ("KB", 1024.0),
    ];
    UNITS
        .iter()
        .find(|(_, size)| bytes >= *size)
        .map_or_else(|| format!("{bytes:.0}B"), |(unit, size)| format!("{:.1}{unit}", bytes / size))
}

/// Format an elapsed time as `5.5s`, `1:05.0` or `1:01:05.0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn format_time(seconds: f64) -> String {
    let secs = seconds % 60.0;
    if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else if seconds < 3600.0 {
        format!("{}:{secs:04.1}", (seconds / 60.0) as u32)
    } else {
        let hours = (seconds / 3600.0) as u32;
        let mins = ((seconds % 3600.0) / 60.0) as u32;
        format!("{hours}:{mins:02}:{secs:04.1}")
    }
}

/// Render a progress bar `width` cells wide.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn generate_bar(progress: f64, width: usize) -> String {
    let exact = progress.clamp(0.0, 1.0) * width as f64;
    let filled = exact as usize;
    let half = filled < width && exact - filled as f64 > 0.5;

    let mut bar = "━".repeat(filled);
    if half {
        bar.push('╸');
    }
    bar.push_str(&"─".repeat(width - filled - usize::from(half)));
    bar
}

/// In-place download progress line on stderr.
struct Progress {
    label: String,
    total: Option<u64>,
    done: u64,
    start: Instant,
    last_draw: Instant,
}

impl Progress {
    const BAR_WIDTH: usize = 12;
    const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

    fn new(label: String, total: Option<u64>) -> Self {
        let now = Instant::now();
        Self {
            label,
            total: total.filter(|&t| t > 0),
            done: 0,
            start: now,
            last_draw: now,
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.done += bytes as u64;
        if self.last_draw.elapsed() >= Self::REDRAW_INTERVAL {
            self.last_draw = Instant::now();
            eprint!("{}", self.line());
            std::io::stderr().flush().ok();
        }
    }

    fn finish(&mut self) {
        if let Some(total) = self.total {
            self.done = self.done.max(total);
        }
        eprintln!("{}", self.line());
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn line(&self) -> String {
        let elapsed = self.start.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            self.done as f64 / elapsed
        } else {
            0.0
        };
        let timing = format!("{}/s {}", format_bytes(rate), format_time(elapsed));

        match self.total {
            Some(total) => {
                let progress = (self.done as f64 / total as f64).min(1.0);
                format!(
                    "\r\x1b[K{}: {}% {} {}/{} {timing}",
                    self.label,
                    (progress * 100.0) as u8,
                    generate_bar(progress, Self::BAR_WIDTH),
                    format_bytes(self.done as f64),
                    format_bytes(total as f64),
                )
            }
            None => format!(
                "\r\x1b[K{}: {} {timing}",
                self.label,
                format_bytes(self.done as f64)
            ),
        }
    }
}

/// Stream `url` into `dest`.
///
/// Bytes go to a `.part` file next to `dest` which is renamed into place only
/// after the body is complete, so an interrupted fetch never leaves a
/// truncated model behind.
fn download_file(url: &str, dest: &Path) -> Result<()> {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(Duration::from_secs(CONNECT_TIMEOUT)))
        .timeout_recv_body(Some(Duration::from_secs(READ_TIMEOUT)))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let response = agent.get(url).call().map_err(|e| {
        PoseError::Download(match &e {
            ureq::Error::Timeout(_) => format!("Connection timed out while downloading {url}"),
            ureq::Error::Io(io_err) => format!("Network error downloading {url}: {io_err}"),
            _ => format!("Failed to download {url}: {e}"),
        })
    })?;

    let total = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());

    let part = dest.with_extension("part");
    let _ = fs::remove_file(&part);

    let mut progress = Progress::new(format!("Downloading {url} to '{}'", dest.display()), total);
    let mut reader = response.into_body().into_reader();

    let streamed = (|| -> Result<()> {
        let file = File::create(&part).map_err(|e| {
            PoseError::Download(format!("Failed to create {}: {e}", part.display()))
        })?;
        let mut writer = BufWriter::new(file);
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let n = reader
                .read(&mut buffer)
                .map_err(|e| PoseError::Download(format!("Failed to read from network: {e}")))?;
            if n == 0 {
                break;
            }
            writer
                .write_all(&buffer[..n])
                .map_err(|e| PoseError::Download(format!("Failed to write {}: {e}", part.display())))?;
            progress.advance(n);
        }
        writer
            .flush()
            .map_err(|e| PoseError::Download(format!("Failed to flush {}: {e}", part.display())))
    })();

    if let Err(e) = streamed {
        eprintln!();
        let _ = fs::remove_file(&part);
        return Err(e);
    }
    progress.finish();

    fs::rename(&part, dest).map_err(|e| {
        let _ = fs::remove_file(&part);
        PoseError::Download(format!("Failed to move download to {}: {e}", dest.display()))
    })
}

/// Return the local path of a detector's model.
///
/// `dir` overrides the default model directory. A missing file is
/// downloaded from `base_url` when given.
///
/// # Errors
///
/// Returns [`PoseError::Download`] if the file is missing and there is no
/// `base_url`, or if the fetch fails, and [`PoseError::Io`] if the directory
/// can't be created.
pub fn ensure_model(
    kind: DetectorKind,
    dir: Option<&Path>,
    base_url: Option<&str>,
) -> Result<PathBuf> {
    let dir = dir.map_or_else(cache_dir, Path::to_path_buf);
    let path = dir.join(model_file(kind));
    if path.is_file() {
        verbose!("Using {kind} model {}", path.display());
        return Ok(path);
    }

    let Some(base_url) = base_url else {
        return Err(PoseError::Download(format!(
            "{kind} model not found at {}; place the ONNX file there, point the model \
             directory elsewhere, or configure a model URL to download it",
            path.display()
        )));
    };

    fs::create_dir_all(&dir)?;
    download_file(&model_url(base_url, kind), &path)?;
    Ok(path)
}
