// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Decoding of raw landmark model outputs into [`LandmarkSet`]s.
//!
//! Outputs arrive as `(data, shape)` pairs in model output order:
//!
//! - output 0: landmarks, `[1, N, K, C]`, `[N, K, C]` or `[N, K * C]`
//! - output 1 (optional): per-instance score, `N` values
//! - output 2 (optional, hands): handedness score, `N` values, `> 0.5` is right
//!
//! The channel count `C` selects the landmark layout: `(x, y, score)`,
//! `(x, y, z, score)` or `(x, y, z, visibility, presence)`.

use super::DetectorKind;
use crate::config::DetectorConfig;
use crate::error::{PoseError, Result};
use crate::landmark::{Handedness, Landmark, LandmarkSet};

/// Instance and landmark filters applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeOptions {
    /// Keep at most this many instances, in model order.
    pub max_instances: usize,
    /// Drop instances scoring below this.
    pub min_detection_confidence: f32,
    /// Landmarks with presence below this get zero visibility.
    pub min_presence_confidence: f32,
}

impl DecodeOptions {
    /// Options for one detector kind taken from the pool configuration.
    #[must_use]
    pub const fn for_kind(kind: DetectorKind, config: &DetectorConfig) -> Self {
        let max_instances = match kind {
            DetectorKind::Pose => config.max_poses,
            DetectorKind::Hand => config.max_hands,
            DetectorKind::Face => config.max_faces,
        };
        Self {
            max_instances,
            min_detection_confidence: config.min_detection_confidence,
            min_presence_confidence: config.min_presence_confidence,
        }
    }
}

/// Landmark tensor geometry: instances, landmarks per instance, channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    instances: usize,
    landmarks: usize,
    channels: usize,
}

fn parse_layout(kind: DetectorKind, shape: &[usize]) -> Result<Layout> {
    let layout = match shape.len() {
        4 => Layout {
            instances: shape[0] * shape[1],
            landmarks: shape[2],
            channels: shape[3],
        },
        3 => Layout {
            instances: shape[0],
            landmarks: shape[1],
            channels: shape[2],
        },
        2 => {
            // Flattened landmarks: infer channels from the kind's landmark count
            let landmarks = kind.landmark_count();
            if shape[1] % landmarks != 0 {
                return Err(PoseError::Detection {
                    kind,
                    message: format!(
                        "cannot split {} values into {landmarks} landmarks",
                        shape[1]
                    ),
                });
            }
            Layout {
                instances: shape[0],
                landmarks,
                channels: shape[1] / landmarks,
            }
        }
        n => {
            return Err(PoseError::Detection {
                kind,
                message: format!("unexpected landmark output rank {n} (shape {shape:?})"),
            });
        }
    };

    if layout.landmarks == 0 {
        return Err(PoseError::Detection {
            kind,
            message: format!("landmark output has no landmarks per instance (shape {shape:?})"),
        });
    }
    if layout.channels < 3 {
        return Err(PoseError::Detection {
            kind,
            message: format!(
                "landmark output needs at least 3 channels, got {}",
                layout.channels
            ),
        });
    }
    Ok(layout)
}

fn read_landmark(values: &[f32], min_presence: f32) -> Landmark {
    match values.len() {
        3 => Landmark::new(values[0], values[1], values[2]),
        4 => Landmark::new(values[0], values[1], values[3]).with_z(values[2]),
        _ => {
            let visibility = if values[4] < min_presence { 0.0 } else { values[3] };
            Landmark::new(values[0], values[1], visibility).with_z(values[2])
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_confidence(landmarks: &[Landmark]) -> f32 {
    if landmarks.is_empty() {
        return 0.0;
    }
    landmarks.iter().map(Landmark::confidence).sum::<f32>() / landmarks.len() as f32
}

/// Decode model outputs into landmark sets.
///
/// # Errors
///
/// Returns [`PoseError::Detection`] if the landmark output is missing, has an
/// unsupported shape, or holds fewer values than its shape claims.
pub fn decode_landmarks(
    kind: DetectorKind,
    outputs: &[(Vec<f32>, Vec<usize>)],
    options: &DecodeOptions,
) -> Result<Vec<LandmarkSet>> {
    let (data, shape) = outputs.first().ok_or_else(|| PoseError::Detection {
        kind,
        message: "model produced no outputs".to_string(),
    })?;
    let layout = parse_layout(kind, shape)?;

    let stride = layout.landmarks * layout.channels;
    if data.len() < layout.instances * stride {
        return Err(PoseError::Detection {
            kind,
            message: format!(
                "landmark output has {} values, shape {shape:?} needs {}",
                data.len(),
                layout.instances * stride
            ),
        });
    }

    let scores = outputs.get(1).map(|(d, _)| d.as_slice());
    let handedness = if kind == DetectorKind::Hand {
        outputs.get(2).map(|(d, _)| d.as_slice())
    } else {
        None
    };

    let mut sets = Vec::new();
    for (i, chunk) in data.chunks_exact(stride).take(layout.instances).enumerate() {
        if sets.len() >= options.max_instances {
            break;
        }

        let landmarks: Vec<Landmark> = chunk
            .chunks_exact(layout.channels)
            .map(|values| read_landmark(values, options.min_presence_confidence))
            .collect();

        let score = scores
            .and_then(|s| s.get(i).copied())
            .unwrap_or_else(|| mean_confidence(&landmarks));
        if score < options.min_detection_confidence {
            continue;
        }

        let label = handedness.and_then(|h| h.get(i)).map(|&v| {
            if v > 0.5 {
                Handedness::Right
            } else {
                Handedness::Left
            }
        });

        sets.push(LandmarkSet {
            landmarks,
            handedness: label,
        });
    }

    Ok(sets)
}
