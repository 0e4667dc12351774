// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # pose-control
//!
//! Turns a photo of people into an OpenPose-style control skeleton: 18-point
//! bodies, 21-point hands and dense face meshes, as JSON and as a coloured
//! stick figure on a black canvas.
//!
//! The pipeline has three stages:
//!
//! 1. **Detect** - a [`DetectorPool`] runs independent body, hand and face
//!    landmark backends on the image. Backends are built once per pool and
//!    every call runs under a hard timeout.
//! 2. **Map** - a [`SkeletonMapper`] reconciles the three outputs into one
//!    [`PersonKeypoints`] record per body: fixed index remapping, a
//!    synthesized neck, and distance-based hand association.
//! 3. **Render** - [`render::render_people`] fits all confident keypoints into
//!    a padded square canvas and draws coloured bones and white joints.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use pose_control::{DetectorConfig, DetectorPool, RenderConfig, SkeletonMapper};
//! use pose_control::pipeline::analyze_file;
//! use pose_control::render::encode_png;
//!
//! # async fn run() -> pose_control::Result<()> {
//! let pool = DetectorPool::new(DetectorConfig::default());
//! let analysis = analyze_file(
//!     &pool,
//!     "person.jpg",
//!     &SkeletonMapper::default(),
//!     &RenderConfig::default(),
//! )
//! .await?;
//!
//! println!("{}", analysis.document.to_json()?);
//! std::fs::write("person_pose.png", encode_png(&analysis.image)?)?;
//! # Ok(())
//! # }
//! ```
//!
//! Stages can also be used on their own: the mapper and the rasterizer are
//! pure functions over plain data, and any [`LandmarkDetector`] (including a
//! closure) can be injected into a pool with [`DetectorPool::with_detectors`].
//!
//! ## CLI Usage
//!
//! ```bash
//! # Detect and write person_pose.png + person_pose.json
//! pose-control extract --source person.jpg
//!
//! # Smaller canvas, body only
//! pose-control extract -s person.jpg --size 512 --padding 50 --no-face --no-hands
//!
//! # Re-render a stored document
//! pose-control render --input person_pose.json --output skeleton.png
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`detector`] | [`DetectorPool`], the [`LandmarkDetector`] trait and ONNX backends |
//! | [`mapper`] | [`SkeletonMapper`], raw landmarks to canonical skeletons |
//! | [`render`] | Skeleton rasterizer and PNG encoding |
//! | [`keypoints`] | [`PersonKeypoints`] and the [`PoseDocument`] JSON format |
//! | [`landmark`] | Raw detector output types |
//! | [`pipeline`] | End-to-end analysis with stage timings |
//! | [`config`] | Builder-style configuration for each stage |
//! | [`error`] | Error types ([`PoseError`], [`Result`]) |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `onnx` | ONNX Runtime landmark backends with model download (default) |

// Modules
pub mod cli;
pub mod config;
pub mod detector;
#[cfg(feature = "onnx")]
pub mod download;
pub mod error;
pub mod keypoints;
pub mod landmark;
pub mod mapper;
pub mod pipeline;
pub mod render;

// Re-export main types for convenience
pub use config::{DetectorConfig, MapperConfig, RenderConfig};
pub use detector::{DetectorKind, DetectorPool, LandmarkDetector};
pub use error::{PoseError, Result};
pub use keypoints::{BodyPart, Keypoint, PersonKeypoints, PoseDocument};
pub use landmark::{Handedness, Landmark, LandmarkSet, RawDetections};
pub use mapper::{SkeletonMapper, map_detections};
pub use pipeline::{Analysis, Speed};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
