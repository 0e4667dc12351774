// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{DetectorConfig, RenderConfig};

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Examples:
    pose-control extract --source person.jpg
    pose-control extract -s group.png -o out/ --no-face --size 512 --padding 50
    pose-control extract -s big.jpg --timeout 30 --verbose
    pose-control render --input out/group_pose.json --output group.png --no-hands"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect poses in an image and write a skeleton PNG plus OpenPose JSON
    Extract(ExtractArgs),
    /// Re-render a stored OpenPose JSON document to PNG
    Render(RenderArgs),
}

/// Canvas options shared by `extract` and `render`.
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct CanvasArgs {
    /// Do not draw the body
    #[arg(long, default_value_t = false)]
    pub no_body: bool,

    /// Do not draw the face
    #[arg(long, default_value_t = false)]
    pub no_face: bool,

    /// Do not draw the hands
    #[arg(long, default_value_t = false)]
    pub no_hands: bool,

    /// Output canvas size in pixels
    #[arg(long, default_value_t = 1024)]
    pub size: u32,

    /// Padding around the skeleton in pixels
    #[arg(long, default_value_t = 100)]
    pub padding: u32,
}

impl CanvasArgs {
    /// Rasterizer configuration for these flags.
    #[must_use]
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig::new()
            .with_size(self.size)
            .with_padding(self.padding)
            .with_body(!self.no_body)
            .with_face(!self.no_face)
            .with_hands(!self.no_hands)
    }
}

/// Arguments for the extract command.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Input image
    #[arg(short, long)]
    pub source: PathBuf,

    /// Output directory [default: next to the input image]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    /// Canvas options.
    pub canvas: CanvasArgs,

    /// Per-detector timeout in seconds
    #[arg(long, default_value_t = 15.0)]
    pub timeout: f64,

    /// Minimum detection, presence and tracking confidence
    #[arg(long, default_value_t = 0.3)]
    pub conf: f32,

    /// Directory holding (or receiving) the landmark models
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Base URL to download missing landmark models from
    #[arg(long)]
    pub model_url: Option<String>,

    /// ONNX Runtime intra-op threads (0 = automatic)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Show verbose output
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

impl ExtractArgs {
    /// Detector pool configuration for these flags.
    ///
    /// Non-positive or non-finite timeouts fall back to the default budget.
    #[must_use]
    pub fn detector_config(&self) -> DetectorConfig {
        let mut config = DetectorConfig::new()
            .with_min_confidence(self.conf)
            .with_threads(self.threads);
        if let Ok(timeout) = Duration::try_from_secs_f64(self.timeout) {
            if !timeout.is_zero() {
                config = config.with_timeout(timeout);
            }
        }
        if let Some(dir) = &self.model_dir {
            config = config.with_model_dir(dir);
        }
        if let Some(url) = &self.model_url {
            config = config.with_model_url(url.as_str());
        }
        config
    }
}

/// Arguments for the render command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// OpenPose JSON document
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output PNG [default: input with a .png extension]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    /// Canvas options.
    pub canvas: CanvasArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_args_defaults() {
        let args = Cli::parse_from(["app", "extract", "--source", "person.jpg"]);
        match args.command {
            Commands::Extract(extract) => {
                assert_eq!(extract.source, PathBuf::from("person.jpg"));
                assert!(extract.output.is_none());
                assert!(!extract.verbose);

                let render = extract.canvas.render_config();
                assert_eq!(render, RenderConfig::default());

                let detector = extract.detector_config();
                assert_eq!(detector.timeout, Duration::from_secs(15));
                assert!((detector.min_detection_confidence - 0.3).abs() < f32::EPSILON);
            }
            Commands::Render(_) => panic!("expected extract"),
        }
    }

    #[test]
    fn test_extract_args_custom() {
        let args = Cli::parse_from([
            "app",
            "extract",
            "-s",
            "group.png",
            "-o",
            "out",
            "--no-face",
            "--size",
            "512",
            "--padding",
            "50",
            "--timeout",
            "2.5",
            "--model-dir",
            "weights",
            "--model-url",
            "https://models.example.org/pose",
            "--verbose",
        ]);
        match args.command {
            Commands::Extract(extract) => {
                assert_eq!(extract.output, Some(PathBuf::from("out")));
                assert!(extract.verbose);

                let render = extract.canvas.render_config();
                assert!(!render.draw_face);
                assert!(render.draw_body && render.draw_hands);
                assert_eq!((render.size, render.padding), (512, 50));
                let detector = extract.detector_config();
                assert_eq!(detector.timeout, Duration::from_millis(2500));
                assert_eq!(detector.model_dir, Some(PathBuf::from("weights")));
                assert_eq!(
                    detector.model_url.as_deref(),
                    Some("https://models.example.org/pose")
                );
            }
            Commands::Render(_) => panic!("expected extract"),
        }
    }

    #[test]
    fn test_invalid_timeout_keeps_default() {
        let args = Cli::parse_from(["app", "extract", "-s", "a.jpg", "--timeout=-1"]);
        match args.command {
            Commands::Extract(extract) => {
                assert_eq!(extract.detector_config().timeout, Duration::from_secs(15));
            }
            Commands::Render(_) => panic!("expected extract"),
        }
    }

    #[test]
    fn test_render_args() {
        let args = Cli::parse_from(["app", "render", "-i", "pose.json", "--no-hands"]);
        match args.command {
            Commands::Render(render) => {
                assert_eq!(render.input, PathBuf::from("pose.json"));
                assert!(!render.canvas.render_config().draw_hands);
            }
            Commands::Extract(_) => panic!("expected render"),
        }
    }
}
