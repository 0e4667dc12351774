// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Canonical skeleton records in the OpenPose JSON layout.
//!
//! A [`PersonKeypoints`] stores flattened `(x, y, confidence)` triples in
//! pixel space. A triple is either all zero (absent) or has a positive
//! confidence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::landmark::Handedness;

/// Number of canonical body slots.
pub const BODY_KEYPOINTS: usize = 18;

/// Number of hand keypoints per hand.
pub const HAND_KEYPOINTS: usize = 21;

/// Maximum number of face mesh keypoints.
pub const FACE_KEYPOINTS: usize = 478;

/// The 18 canonical body slots (OpenPose COCO-18 order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    Neck = 1,
    RightShoulder = 2,
    RightElbow = 3,
    RightWrist = 4,
    LeftShoulder = 5,
    LeftElbow = 6,
    LeftWrist = 7,
    RightHip = 8,
    RightKnee = 9,
    RightAnkle = 10,
    LeftHip = 11,
    LeftKnee = 12,
    LeftAnkle = 13,
    RightEye = 14,
    LeftEye = 15,
    RightEar = 16,
    LeftEar = 17,
}

impl BodyPart {
    /// All slots in index order.
    pub const ALL: [Self; BODY_KEYPOINTS] = [
        Self::Nose,
        Self::Neck,
        Self::RightShoulder,
        Self::RightElbow,
        Self::RightWrist,
        Self::LeftShoulder,
        Self::LeftElbow,
        Self::LeftWrist,
        Self::RightHip,
        Self::RightKnee,
        Self::RightAnkle,
        Self::LeftHip,
        Self::LeftKnee,
        Self::LeftAnkle,
        Self::RightEye,
        Self::LeftEye,
        Self::RightEar,
        Self::LeftEar,
    ];

    /// Index of the matching landmark in the 33-point body detector layout.
    ///
    /// `None` for the neck, which has no detector landmark and is synthesized
    /// from the shoulders.
    #[must_use]
    pub const fn source_index(self) -> Option<usize> {
        match self {
            Self::Nose => Some(0),
            Self::Neck => None,
            Self::RightShoulder => Some(12),
            Self::RightElbow => Some(14),
            Self::RightWrist => Some(16),
            Self::LeftShoulder => Some(11),
            Self::LeftElbow => Some(13),
            Self::LeftWrist => Some(15),
            Self::RightHip => Some(24),
            Self::RightKnee => Some(26),
            Self::RightAnkle => Some(28),
            Self::LeftHip => Some(23),
            Self::LeftKnee => Some(25),
            Self::LeftAnkle => Some(27),
            Self::RightEye => Some(5),
            Self::LeftEye => Some(2),
            Self::RightEar => Some(8),
            Self::LeftEar => Some(7),
        }
    }
}

/// Landmark indices of the 33-point body detector layout used outside the
/// 18-slot table.
pub mod body_source {
    /// Left shoulder.
    pub const LEFT_SHOULDER: usize = 11;
    /// Right shoulder.
    pub const RIGHT_SHOULDER: usize = 12;
    /// Left hip.
    pub const LEFT_HIP: usize = 23;
    /// Right hip.
    pub const RIGHT_HIP: usize = 24;
}

/// Hand wrist landmark index.
pub const HAND_WRIST: usize = 0;

/// A single `(x, y, confidence)` triple in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    /// X coordinate in pixels.
    pub x: f32,
    /// Y coordinate in pixels.
    pub y: f32,
    /// Confidence; `0.0` means absent.
    pub confidence: f32,
}

impl Keypoint {
    /// Create a keypoint.
    #[must_use]
    pub const fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Whether the confidence is strictly above `threshold` and the position
    /// is finite.
    #[must_use]
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.confidence > threshold && self.x.is_finite() && self.y.is_finite()
    }

    /// Whether this is the all-zero absent triple.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.confidence == 0.0
    }
}

/// Read triple `index` from a flattened array; out-of-range reads are absent.
fn read_triple(data: &[f32], index: usize) -> Keypoint {
    let base = index * 3;
    match data.get(base..base + 3) {
        Some(t) => Keypoint::new(t[0], t[1], t[2]),
        None => Keypoint::default(),
    }
}

/// Write triple `index` into a flattened array; out-of-range writes are ignored.
fn write_triple(data: &mut [f32], index: usize, keypoint: Keypoint) {
    let base = index * 3;
    if let Some(t) = data.get_mut(base..base + 3) {
        t.copy_from_slice(&[keypoint.x, keypoint.y, keypoint.confidence]);
    }
}

/// Canonical skeleton record of one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonKeypoints {
    /// 18 body triples.
    pub pose_keypoints_2d: Vec<f32>,
    /// 21 left hand triples.
    pub hand_left_keypoints_2d: Vec<f32>,
    /// 21 right hand triples.
    pub hand_right_keypoints_2d: Vec<f32>,
    /// Up to 478 face triples.
    pub face_keypoints_2d: Vec<f32>,
}

impl Default for PersonKeypoints {
    fn default() -> Self {
        Self {
            pose_keypoints_2d: vec![0.0; BODY_KEYPOINTS * 3],
            hand_left_keypoints_2d: vec![0.0; HAND_KEYPOINTS * 3],
            hand_right_keypoints_2d: vec![0.0; HAND_KEYPOINTS * 3],
            face_keypoints_2d: vec![0.0; FACE_KEYPOINTS * 3],
        }
    }
}

impl PersonKeypoints {
    /// Create a fully absent record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Body keypoint for a slot.
    #[must_use]
    pub fn body(&self, part: BodyPart) -> Keypoint {
        read_triple(&self.pose_keypoints_2d, part as usize)
    }

    /// Set a body keypoint.
    pub fn set_body(&mut self, part: BodyPart, keypoint: Keypoint) {
        write_triple(&mut self.pose_keypoints_2d, part as usize, keypoint);
    }

    /// Set a hand keypoint in the slot for `handedness`.
    pub fn set_hand(&mut self, handedness: Handedness, index: usize, keypoint: Keypoint) {
        let data = match handedness {
            Handedness::Left => &mut self.hand_left_keypoints_2d,
            Handedness::Right => &mut self.hand_right_keypoints_2d,
        };
        write_triple(data, index, keypoint);
    }

    /// Left hand keypoint.
    #[must_use]
    pub fn left_hand(&self, index: usize) -> Keypoint {
        read_triple(&self.hand_left_keypoints_2d, index)
    }

    /// Right hand keypoint.
    #[must_use]
    pub fn right_hand(&self, index: usize) -> Keypoint {
        read_triple(&self.hand_right_keypoints_2d, index)
    }

    /// Face keypoint.
    #[must_use]
    pub fn face(&self, index: usize) -> Keypoint {
        read_triple(&self.face_keypoints_2d, index)
    }

    /// All body keypoints in slot order.
    #[must_use]
    pub fn body_keypoints(&self) -> Vec<Keypoint> {
        triples(&self.pose_keypoints_2d)
    }

    /// All left hand keypoints.
    #[must_use]
    pub fn left_hand_keypoints(&self) -> Vec<Keypoint> {
        triples(&self.hand_left_keypoints_2d)
    }

    /// All right hand keypoints.
    #[must_use]
    pub fn right_hand_keypoints(&self) -> Vec<Keypoint> {
        triples(&self.hand_right_keypoints_2d)
    }

    /// All face keypoints.
    #[must_use]
    pub fn face_keypoints(&self) -> Vec<Keypoint> {
        triples(&self.face_keypoints_2d)
    }

    /// Every keypoint of the record, all regions pooled.
    pub fn all_keypoints(&self) -> impl Iterator<Item = Keypoint> + '_ {
        [
            &self.pose_keypoints_2d,
            &self.hand_left_keypoints_2d,
            &self.hand_right_keypoints_2d,
            &self.face_keypoints_2d,
        ]
        .into_iter()
        .flat_map(|data| data.chunks_exact(3).map(|t| Keypoint::new(t[0], t[1], t[2])))
    }

    /// Whether any keypoint is present.
    #[must_use]
    pub fn has_any(&self) -> bool {
        self.all_keypoints().any(|kp| kp.confidence > 0.0)
    }

    /// Whether the left hand slot holds an associated hand.
    #[must_use]
    pub fn has_left_hand(&self) -> bool {
        self.left_hand_keypoints().iter().any(|kp| kp.confidence > 0.0)
    }

    /// Whether the right hand slot holds an associated hand.
    #[must_use]
    pub fn has_right_hand(&self) -> bool {
        self.right_hand_keypoints().iter().any(|kp| kp.confidence > 0.0)
    }
}

/// Split a flattened array into triples, ignoring a trailing partial triple.
fn triples(data: &[f32]) -> Vec<Keypoint> {
    data.chunks_exact(3)
        .map(|t| Keypoint::new(t[0], t[1], t[2]))
        .collect()
}

/// OpenPose-compatible document describing all people in one image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseDocument {
    /// Source image width in pixels.
    pub width: u32,
    /// Source image height in pixels.
    pub height: u32,
    /// One record per detected body.
    pub people: Vec<PersonKeypoints>,
}

impl PoseDocument {
    /// Create a document.
    #[must_use]
    pub const fn new(width: u32, height: u32, people: Vec<PersonKeypoints>) -> Self {
        Self {
            width,
            height,
            people,
        }
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Json`](crate::PoseError::Json) on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write the document as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}
