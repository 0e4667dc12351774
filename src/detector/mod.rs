// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Landmark detector backends and the pool that runs them.
//!
//! A [`LandmarkDetector`] turns one RGB image into zero or more
//! [`LandmarkSet`]s. The [`DetectorPool`] owns one detector per
//! [`DetectorKind`], builds each at most once, and runs them under a hard
//! per-call timeout.

use std::fmt;
use std::str::FromStr;

use image::RgbImage;

use crate::error::Result;
use crate::landmark::LandmarkSet;

pub mod decode;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod pool;

#[cfg(feature = "onnx")]
pub use onnx::OnnxLandmarkDetector;
pub use pool::{DetectorLoader, DetectorPool, Detectors, SharedDetector};

/// The three landmark backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    /// Body pose (33 landmarks per person).
    Pose,
    /// Hands (21 landmarks per hand, with handedness).
    Hand,
    /// Face mesh (up to 478 landmarks per face).
    Face,
}

impl DetectorKind {
    /// All kinds in the order the pool runs them.
    pub const ALL: [Self; 3] = [Self::Pose, Self::Hand, Self::Face];

    /// Lowercase name used in messages and asset file names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pose => "pose",
            Self::Hand => "hand",
            Self::Face => "face",
        }
    }

    /// Landmarks per instance in the detector's native layout.
    #[must_use]
    pub const fn landmark_count(&self) -> usize {
        match self {
            Self::Pose => 33,
            Self::Hand => 21,
            Self::Face => 478,
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pose" | "body" => Ok(Self::Pose),
            "hand" | "hands" => Ok(Self::Hand),
            "face" => Ok(Self::Face),
            _ => Err(format!("Unknown detector: {s}")),
        }
    }
}

/// A landmark detection backend.
///
/// Implementations must be callable from any thread; the pool invokes
/// [`detect`](Self::detect) on a blocking worker. Closures of the matching
/// signature implement this trait, which makes fixtures easy to inject.
pub trait LandmarkDetector: Send + Sync {
    /// Detect all instances in `image`, landmarks normalized to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to run.
    fn detect(&self, image: &RgbImage) -> Result<Vec<LandmarkSet>>;
}

impl<F> LandmarkDetector for F
where
    F: Fn(&RgbImage) -> Result<Vec<LandmarkSet>> + Send + Sync,
{
    fn detect(&self, image: &RgbImage) -> Result<Vec<LandmarkSet>> {
        self(image)
    }
}
