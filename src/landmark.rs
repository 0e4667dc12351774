// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Raw landmark types produced by the detector backends.
//!
//! All coordinates here are normalized to `[0, 1]` image space. Conversion to
//! pixel space happens in the [`mapper`](crate::mapper).

use std::fmt;
use std::str::FromStr;

/// A single detected landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    /// Normalized X coordinate (0.0 to 1.0).
    pub x: f32,
    /// Normalized Y coordinate (0.0 to 1.0).
    pub y: f32,
    /// Relative depth, ignored by this pipeline.
    pub z: Option<f32>,
    /// Detector-reported visibility, if the backend supplies one.
    pub visibility: Option<f32>,
}

impl Landmark {
    /// Create a landmark with an explicit visibility.
    #[must_use]
    pub const fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: Some(visibility),
        }
    }

    /// Create a landmark without visibility (always treated as present).
    #[must_use]
    pub const fn without_visibility(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
        }
    }

    /// Attach a depth value.
    #[must_use]
    pub const fn with_z(mut self, z: f32) -> Self {
        self.z = Some(z);
        self
    }

    /// Confidence in `[0, 1]`; `1.0` when the detector gave no visibility.
    #[must_use]
    pub fn confidence(&self) -> f32 {
        self.visibility.unwrap_or(1.0)
    }

    /// Euclidean distance to a point in normalized space.
    #[must_use]
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Which hand a hand detection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    /// Left hand.
    Left,
    /// Right hand.
    Right,
}

impl Handedness {
    /// Label used by hand detectors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(format!("Unknown handedness: {s}")),
        }
    }
}

/// One detected instance: a body, a hand or a face.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandmarkSet {
    /// Landmarks in the detector's fixed index order.
    pub landmarks: Vec<Landmark>,
    /// Handedness label (hand detections only).
    pub handedness: Option<Handedness>,
}

impl LandmarkSet {
    /// Create a set without handedness.
    #[must_use]
    pub const fn new(landmarks: Vec<Landmark>) -> Self {
        Self {
            landmarks,
            handedness: None,
        }
    }

    /// Create a hand set with its handedness label.
    #[must_use]
    pub const fn hand(landmarks: Vec<Landmark>, handedness: Handedness) -> Self {
        Self {
            landmarks,
            handedness: Some(handedness),
        }
    }

    /// Landmark at `index`, if the detector produced that many.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    /// Number of landmarks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    /// Whether the set holds no landmarks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

/// Raw output of the three detectors for one image.
///
/// The three collections are independent: there is no association between
/// the n-th body, hand and face.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDetections {
    /// Decoded image width in pixels.
    pub width: u32,
    /// Decoded image height in pixels.
    pub height: u32,
    /// One 33-point set per detected body.
    pub bodies: Vec<LandmarkSet>,
    /// One 21-point set per detected hand, with handedness.
    pub hands: Vec<LandmarkSet>,
    /// One mesh (up to 478 points) per detected face.
    pub faces: Vec<LandmarkSet>,
}

impl RawDetections {
    /// Create an empty detection set for an image of the given size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bodies: Vec::new(),
            hands: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Whether no detector found anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.hands.is_empty() && self.faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_defaults_to_one() {
        assert!((Landmark::without_visibility(0.1, 0.2).confidence() - 1.0).abs() < f32::EPSILON);
        assert!((Landmark::new(0.1, 0.2, 0.4).confidence() - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_distance_to() {
        let lm = Landmark::new(0.5, 1.0, 1.0);
        assert!((lm.distance_to(0.5, 0.5) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_handedness_parse() {
        assert_eq!("Left".parse::<Handedness>().unwrap(), Handedness::Left);
        assert_eq!("RIGHT".parse::<Handedness>().unwrap(), Handedness::Right);
        assert!("both".parse::<Handedness>().is_err());
        assert_eq!(Handedness::Right.to_string(), "Right");
    }

    #[test]
    fn test_landmark_set_get() {
        let set = LandmarkSet::new(vec![Landmark::new(0.1, 0.1, 0.9)]);
        assert_eq!(set.len(), 1);
        assert!(set.get(0).is_some());
        assert!(set.get(11).is_none());
    }

    #[test]
    fn test_raw_detections_empty() {
        let mut raw = RawDetections::new(640, 480);
        assert!(raw.is_empty());
        raw.faces.push(LandmarkSet::default());
        assert!(!raw.is_empty());
    }
}
