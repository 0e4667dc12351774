// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Canonical skeleton mapping.
//!
//! Reconciles the three independent detector outputs of one image into one
//! [`PersonKeypoints`] record per detected body:
//!
//! 1. The 18 body slots are copied from their fixed detector indices when the
//!    landmark confidence clears the gate.
//! 2. The neck is synthesized as the shoulder midpoint.
//! 3. Loose hands are attached to a body when their wrist lies close to the
//!    body centre (greedy, non-exclusive, last write wins per slot).
//! 4. The face with the same index as the body is copied point by point.
//!
//! Mapping never fails: missing or low-confidence input yields absent
//! (all-zero) triples.

use crate::config::MapperConfig;
use crate::keypoints::{
    BODY_KEYPOINTS, BodyPart, FACE_KEYPOINTS, HAND_KEYPOINTS, HAND_WRIST, Keypoint,
    PersonKeypoints, PoseDocument, body_source,
};
use crate::landmark::{Handedness, Landmark, LandmarkSet, RawDetections};

/// Maps raw detections onto canonical skeleton records.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkeletonMapper {
    config: MapperConfig,
}

impl SkeletonMapper {
    /// Create a mapper with the given configuration.
    #[must_use]
    pub const fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// The mapper configuration.
    #[must_use]
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Map every detected body of an image to a canonical record.
    ///
    /// Hands are considered for every body independently, so one hand may end
    /// up on two nearby people. Face `i` is paired with body `i`.
    #[must_use]
    pub fn map(&self, raw: &RawDetections) -> PoseDocument {
        let people = raw
            .bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                self.map_person(body, &raw.hands, raw.faces.get(i), raw.width, raw.height)
            })
            .collect();

        PoseDocument::new(raw.width, raw.height, people)
    }

    /// Map one body together with the loose hands and its face.
    #[must_use]
    pub fn map_person(
        &self,
        body: &LandmarkSet,
        hands: &[LandmarkSet],
        face: Option<&LandmarkSet>,
        width: u32,
        height: u32,
    ) -> PersonKeypoints {
        let mut person = PersonKeypoints::new();
        let scale = Scale::new(width, height);

        for part in BodyPart::ALL {
            let Some(index) = part.source_index() else {
                continue;
            };
            if let Some(lm) = body.get(index).filter(|lm| self.passes(lm)) {
                person.set_body(part, scale.keypoint(lm, lm.confidence()));
            }
        }

        if let Some(neck) = self.neck(body, scale) {
            person.set_body(BodyPart::Neck, neck);
        }

        if let Some((cx, cy)) = self.person_center(body) {
            for hand in hands {
                let (Some(handedness), Some(wrist)) = (hand.handedness, hand.get(HAND_WRIST))
                else {
                    continue;
                };
                if wrist.distance_to(cx, cy) < self.config.hand_distance_threshold {
                    let data = self.flatten(&hand.landmarks, HAND_KEYPOINTS, scale);
                    match handedness {
                        Handedness::Left => person.hand_left_keypoints_2d = data,
                        Handedness::Right => person.hand_right_keypoints_2d = data,
                    }
                }
            }
        }

        if let Some(face) = face {
            person.face_keypoints_2d = self.flatten(&face.landmarks, FACE_KEYPOINTS, scale);
        }

        debug_assert_eq!(person.pose_keypoints_2d.len(), BODY_KEYPOINTS * 3);
        person
    }

    /// Normalized centre of a body: the mean of both shoulders and both hips.
    ///
    /// The mean is taken over the raw landmarks, before gating. There is no
    /// centre when one of the four is missing from the set or has a
    /// non-finite coordinate, or when all four are at or below the
    /// confidence gate.
    #[must_use]
    pub fn person_center(&self, body: &LandmarkSet) -> Option<(f32, f32)> {
        let anchors = [
            body.get(body_source::LEFT_SHOULDER)?,
            body.get(body_source::RIGHT_SHOULDER)?,
            body.get(body_source::LEFT_HIP)?,
            body.get(body_source::RIGHT_HIP)?,
        ];
        if anchors.iter().any(|lm| !lm.x.is_finite() || !lm.y.is_finite())
            || !anchors.iter().any(|lm| self.passes(lm))
        {
            return None;
        }

        let (sx, sy) = anchors
            .iter()
            .fold((0.0_f32, 0.0_f32), |(sx, sy), lm| (sx + lm.x, sy + lm.y));
        Some((sx / 4.0, sy / 4.0))
    }

    /// Shoulder midpoint, present only when both shoulders pass the gate.
    fn neck(&self, body: &LandmarkSet, scale: Scale) -> Option<Keypoint> {
        let left = body
            .get(body_source::LEFT_SHOULDER)
            .filter(|lm| self.passes(lm))?;
        let right = body
            .get(body_source::RIGHT_SHOULDER)
            .filter(|lm| self.passes(lm))?;

        let mid = Landmark::new(
            (left.x + right.x) / 2.0,
            (left.y + right.y) / 2.0,
            left.confidence().min(right.confidence()),
        );
        Some(scale.keypoint(&mid, mid.confidence()))
    }

    /// Flatten up to `capacity` landmarks into pixel-space triples.
    fn flatten(&self, landmarks: &[Landmark], capacity: usize, scale: Scale) -> Vec<f32> {
        let mut data = vec![0.0; capacity * 3];
        for (slot, lm) in data.chunks_exact_mut(3).zip(landmarks) {
            if self.passes(lm) {
                let kp = scale.keypoint(lm, lm.confidence());
                slot.copy_from_slice(&[kp.x, kp.y, kp.confidence]);
            }
        }
        data
    }

    /// Confidence gate. Non-finite coordinates never pass.
    fn passes(&self, lm: &Landmark) -> bool {
        lm.x.is_finite() && lm.y.is_finite() && lm.confidence() > self.config.keypoint_threshold
    }
}

/// Normalized-to-pixel conversion for one image.
#[derive(Debug, Clone, Copy)]
struct Scale {
    width: f32,
    height: f32,
}

impl Scale {
    #[allow(clippy::cast_precision_loss)]
    const fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
        }
    }

    fn keypoint(self, lm: &Landmark, confidence: f32) -> Keypoint {
        Keypoint::new(lm.x * self.width, lm.y * self.height, confidence)
    }
}

/// Map raw detections with the default mapper configuration.
#[must_use]
pub fn map_detections(raw: &RawDetections) -> PoseDocument {
    SkeletonMapper::default().map(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 33-point body with every landmark at `(0.5, 0.5)` and the given visibility.
    fn uniform_body(visibility: f32) -> Vec<Landmark> {
        vec![Landmark::new(0.5, 0.5, visibility); 33]
    }

    /// Body whose centre is exactly `(0.5, 0.5)`.
    fn centered_body() -> LandmarkSet {
        let mut landmarks = uniform_body(0.9);
        landmarks[body_source::LEFT_SHOULDER] = Landmark::new(0.75, 0.5, 0.9);
        landmarks[body_source::RIGHT_SHOULDER] = Landmark::new(0.25, 0.5, 0.9);
        landmarks[body_source::LEFT_HIP] = Landmark::new(0.75, 0.5, 0.9);
        landmarks[body_source::RIGHT_HIP] = Landmark::new(0.25, 0.5, 0.9);
        LandmarkSet::new(landmarks)
    }

    fn hand_at(x: f32, y: f32, handedness: Handedness) -> LandmarkSet {
        LandmarkSet::hand(vec![Landmark::without_visibility(x, y); 21], handedness)
    }

    #[test]
    fn test_neck_synthesis() {
        let mut landmarks = uniform_body(0.9);
        landmarks[body_source::LEFT_SHOULDER] = Landmark::new(0.6, 0.3, 0.9);
        landmarks[body_source::RIGHT_SHOULDER] = Landmark::new(0.4, 0.5, 0.6);
        let body = LandmarkSet::new(landmarks);

        let person = SkeletonMapper::default().map_person(&body, &[], None, 100, 200);
        let neck = person.body(BodyPart::Neck);

        assert!((neck.confidence - 0.6).abs() < 1e-6);
        assert!((neck.x - 50.0).abs() < 1e-4);
        assert!((neck.y - 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_neck_requires_both_shoulders() {
        let mut landmarks = uniform_body(0.9);
        landmarks[body_source::RIGHT_SHOULDER] = Landmark::new(0.4, 0.5, 0.2);
        let body = LandmarkSet::new(landmarks);

        let person = SkeletonMapper::default().map_person(&body, &[], None, 100, 100);
        assert!(person.body(BodyPart::Neck).is_absent());
        assert!(person.body(BodyPart::RightShoulder).is_absent());
        assert!(!person.body(BodyPart::LeftShoulder).is_absent());
    }

    #[test]
    fn test_confidence_gating_zeroes_triples() {
        let mut landmarks = uniform_body(0.9);
        landmarks[0] = Landmark::new(0.3, 0.3, 0.2);
        landmarks[25] = Landmark::new(0.7, 0.7, 0.05);
        let body = LandmarkSet::new(landmarks);

        let person = SkeletonMapper::default().map_person(&body, &[], None, 640, 480);
        assert_eq!(person.body(BodyPart::Nose), Keypoint::default());
        assert_eq!(person.body(BodyPart::LeftKnee), Keypoint::default());
        assert!(person.body(BodyPart::RightKnee).confidence > 0.0);
    }

    #[test]
    fn test_every_triple_is_absent_or_confident() {
        let mut landmarks = uniform_body(0.5);
        for (i, lm) in landmarks.iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let v = (i % 5) as f32 * 0.1;
            lm.visibility = Some(v);
        }
        let body = LandmarkSet::new(landmarks);
        let person = SkeletonMapper::default().map_person(&body, &[], None, 640, 480);

        for kp in person.all_keypoints() {
            assert!(kp.is_absent() || kp.confidence > 0.2);
        }
    }

    #[test]
    fn test_coordinates_are_in_pixel_space() {
        let body = LandmarkSet::new(uniform_body(0.9));
        let person = SkeletonMapper::default().map_person(&body, &[], None, 640, 480);
        let nose = person.body(BodyPart::Nose);
        assert!((nose.x - 320.0).abs() < 1e-4);
        assert!((nose.y - 240.0).abs() < 1e-4);
    }

    #[test]
    fn test_fully_absent_body_is_valid() {
        let body = LandmarkSet::new(uniform_body(0.1));
        let hands = [hand_at(0.5, 0.5, Handedness::Left)];
        let person = SkeletonMapper::default().map_person(&body, &hands, None, 640, 480);

        assert!(!person.has_any());
    }

    #[test]
    fn test_short_body_has_no_center() {
        let body = LandmarkSet::new(vec![Landmark::new(0.5, 0.5, 0.9); 12]);
        assert!(SkeletonMapper::default().person_center(&body).is_none());

        let hands = [hand_at(0.5, 0.5, Handedness::Right)];
        let person = SkeletonMapper::default().map_person(&body, &hands, None, 10, 10);
        assert!(!person.has_right_hand());
    }

    #[test]
    fn test_center_uses_raw_landmarks() {
        let mut body = centered_body();
        body.landmarks[body_source::LEFT_HIP].visibility = Some(0.0);
        let center = SkeletonMapper::default().person_center(&body).unwrap();
        assert_eq!(center, (0.5, 0.5));
    }

    #[test]
    fn test_hand_association_boundary_is_exclusive() {
        let body = centered_body();
        let mapper = SkeletonMapper::default();
        assert_eq!(mapper.person_center(&body), Some((0.5, 0.5)));

        // Wrist exactly 0.5 away.
        let at_threshold = [hand_at(0.5, 1.0, Handedness::Left)];
        let person = mapper.map_person(&body, &at_threshold, None, 100, 100);
        assert!(!person.has_left_hand());

        let inside = [hand_at(0.5, 0.99, Handedness::Left)];
        let person = mapper.map_person(&body, &inside, None, 100, 100);
        assert!(person.has_left_hand());
        assert!(!person.has_right_hand());
        assert!((person.left_hand(0).y - 99.0).abs() < 1e-3);
    }

    #[test]
    fn test_hand_slot_is_last_write_wins() {
        let body = centered_body();
        let hands = [
            hand_at(0.5, 0.6, Handedness::Right),
            hand_at(0.6, 0.7, Handedness::Right),
        ];
        let person = SkeletonMapper::default().map_person(&body, &hands, None, 100, 100);

        let wrist = person.right_hand(HAND_WRIST);
        assert!((wrist.x - 60.0).abs() < 1e-3);
        assert!((wrist.y - 70.0).abs() < 1e-3);
        assert!((wrist.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_hand_may_attach_to_two_people() {
        let mut raw = RawDetections::new(100, 100);
        raw.bodies = vec![centered_body(), centered_body()];
        raw.hands = vec![hand_at(0.5, 0.6, Handedness::Left)];

        let doc = map_detections(&raw);
        assert_eq!(doc.people.len(), 2);
        assert!(doc.people.iter().all(PersonKeypoints::has_left_hand));
    }

    #[test]
    fn test_hand_without_handedness_is_skipped() {
        let body = centered_body();
        let hands = [LandmarkSet::new(vec![Landmark::without_visibility(0.5, 0.5); 21])];
        let person = SkeletonMapper::default().map_person(&body, &hands, None, 100, 100);
        assert!(!person.has_left_hand() && !person.has_right_hand());
    }

    #[test]
    fn test_face_pairs_by_index_and_defaults_confidence() {
        let mut raw = RawDetections::new(200, 100);
        raw.bodies = vec![centered_body(), centered_body()];
        raw.faces = vec![LandmarkSet::new(vec![
            Landmark::without_visibility(0.5, 0.5);
            FACE_KEYPOINTS + 10
        ])];

        let doc = map_detections(&raw);
        let first = &doc.people[0];
        assert_eq!(first.face_keypoints_2d.len(), FACE_KEYPOINTS * 3);
        assert_eq!(first.face(FACE_KEYPOINTS - 1), Keypoint::new(100.0, 50.0, 1.0));
        assert!(doc.people[1].face_keypoints().iter().all(Keypoint::is_absent));
    }

    #[test]
    fn test_unequal_cardinalities() {
        let mut raw = RawDetections::new(100, 100);
        raw.hands = vec![hand_at(0.5, 0.5, Handedness::Left); 3];
        raw.faces = vec![LandmarkSet::default()];
        assert!(map_detections(&raw).people.is_empty());

        raw.bodies = vec![centered_body(); 2];
        assert_eq!(map_detections(&raw).people.len(), 2);
    }

    #[test]
    fn test_non_finite_landmarks_are_absent() {
        let mut body = centered_body();
        body.landmarks[0] = Landmark::new(f32::NAN, 0.5, 0.9);
        body.landmarks[25] = Landmark::new(0.5, f32::INFINITY, 0.9);
        let mut hand = hand_at(0.5, 0.6, Handedness::Left);
        hand.landmarks[4] = Landmark::without_visibility(f32::NEG_INFINITY, 0.6);

        let mut raw = RawDetections::new(100, 100);
        raw.bodies = vec![body];
        raw.hands = vec![hand];
        let doc = map_detections(&raw);

        let person = &doc.people[0];
        assert!(person.body(BodyPart::Nose).is_absent());
        assert!(person.body(BodyPart::LeftKnee).is_absent());
        assert!(person.has_left_hand());
        assert!(person.left_hand(4).is_absent());
        assert!(person.all_keypoints().all(|kp| kp.x.is_finite() && kp.y.is_finite()));

        let reloaded = PoseDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, doc);
    }

    #[test]
    fn test_non_finite_anchor_has_no_center() {
        let mut body = centered_body();
        body.landmarks[body_source::RIGHT_HIP] = Landmark::new(f32::NAN, 0.5, 0.0);
        let mapper = SkeletonMapper::default();
        assert!(mapper.person_center(&body).is_none());

        let hands = [hand_at(0.5, 0.5, Handedness::Right)];
        let person = mapper.map_person(&body, &hands, None, 100, 100);
        assert!(!person.has_right_hand());
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let mut raw = RawDetections::new(640, 480);
        raw.bodies = vec![centered_body()];
        raw.hands = vec![hand_at(0.4, 0.6, Handedness::Left)];

        let a = map_detections(&raw).to_json().unwrap();
        let b = map_detections(&raw).to_json().unwrap();
        assert_eq!(a, b);
    }
}
