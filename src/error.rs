// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the pose pipeline.

use std::fmt;

use crate::detector::DetectorKind;

/// Result type alias for pose pipeline operations.
pub type Result<T> = std::result::Result<T, PoseError>;

/// Main error type for the pose pipeline.
///
/// Only the detector pool raises these; the mapper and the rasterizer degrade
/// to absent output instead of failing.
#[derive(Debug)]
pub enum PoseError {
    /// A landmark backend could not be constructed (asset fetch or parse failure).
    DetectorInit {
        /// Backend that failed.
        kind: DetectorKind,
        /// Underlying cause.
        message: String,
    },
    /// The input image could not be decoded.
    ImageDecode(String),
    /// A rendered canvas could not be encoded.
    ImageEncode(String),
    /// A detector exceeded its time budget.
    Timeout {
        /// Backend that timed out.
        kind: DetectorKind,
        /// Budget that was exceeded, in seconds.
        seconds: f64,
    },
    /// A backend failed while running on an image.
    Detection {
        /// Backend that failed.
        kind: DetectorKind,
        /// Underlying cause.
        message: String,
    },
    /// Model asset download failed.
    Download(String),
    /// Invalid configuration provided.
    Config(String),
    /// JSON (de)serialization error.
    Json(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
}

impl PoseError {
    /// Whether the caller may retry, e.g. with a smaller image.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Detector the error belongs to, if any.
    #[must_use]
    pub const fn detector(&self) -> Option<DetectorKind> {
        match self {
            Self::DetectorInit { kind, .. }
            | Self::Timeout { kind, .. }
            | Self::Detection { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DetectorInit { kind, message } => {
                write!(f, "Cannot initialize pose analysis ({kind} detector): {message}")
            }
            Self::ImageDecode(msg) => write!(f, "Image decode error: {msg}"),
            Self::ImageEncode(msg) => write!(f, "Image encode error: {msg}"),
            Self::Timeout { kind, seconds } => write!(
                f,
                "{kind} detection timed out after {seconds:.1}s, try a smaller image"
            ),
            Self::Detection { kind, message } => write!(f, "{kind} detection error: {message}"),
            Self::Download(msg) => write!(f, "Download error: {msg}"),
            Self::Config(msg) => write!(f, "Config error: {msg}"),
            Self::Json(msg) => write!(f, "JSON error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl std::error::Error for PoseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PoseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for PoseError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageDecode(err.to_string())
    }
}

impl From<serde_json::Error> for PoseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PoseError::DetectorInit {
            kind: DetectorKind::Hand,
            message: "404".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot initialize pose analysis (hand detector): 404"
        );

        let err = PoseError::ImageDecode("bad header".to_string());
        assert_eq!(err.to_string(), "Image decode error: bad header");

        let err = PoseError::ImageEncode("disk full".to_string());
        assert_eq!(err.to_string(), "Image encode error: disk full");
    }

    #[test]
    fn test_timeouts_name_their_detector() {
        let pose = PoseError::Timeout {
            kind: DetectorKind::Pose,
            seconds: 15.0,
        };
        let face = PoseError::Timeout {
            kind: DetectorKind::Face,
            seconds: 15.0,
        };
        assert!(pose.to_string().starts_with("pose detection timed out"));
        assert!(face.to_string().starts_with("face detection timed out"));
        assert_eq!(pose.detector(), Some(DetectorKind::Pose));
        assert!(pose.is_recoverable());
    }

    #[test]
    fn test_fatal_errors_are_not_recoverable() {
        let init = PoseError::DetectorInit {
            kind: DetectorKind::Face,
            message: String::new(),
        };
        assert!(!init.is_recoverable());
        assert!(!PoseError::ImageDecode(String::new()).is_recoverable());
        assert_eq!(PoseError::Config(String::new()).detector(), None);
    }
}
