// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use super::color::{
    Color, FACE_COLOR, LEFT_ARM, LEFT_LEG, RIGHT_ARM, RIGHT_LEG, TORSO_BLUES,
};

/// Body bones over the 18-slot OpenPose layout, with their colours.
pub const BODY_BONES: [(usize, usize, Color); 13] = [
    (2, 5, Color::RED),         // right shoulder to left shoulder
    (8, 11, Color::BLUE),       // right hip to left hip
    (1, 8, TORSO_BLUES[0]),     // neck to right hip
    (1, 11, TORSO_BLUES[0]),    // neck to left hip
    (1, 0, TORSO_BLUES[1]),     // neck to nose
    (2, 3, RIGHT_ARM[0]),       // right shoulder to right elbow
    (3, 4, RIGHT_ARM[1]),       // right elbow to right wrist
    (5, 6, LEFT_ARM[0]),        // left shoulder to left elbow
    (6, 7, LEFT_ARM[1]),        // left elbow to left wrist
    (8, 9, RIGHT_LEG[0]),       // right hip to right knee
    (9, 10, RIGHT_LEG[1]),      // right knee to right ankle
    (11, 12, LEFT_LEG[0]),      // left hip to left knee
    (12, 13, LEFT_LEG[1]),      // left knee to left ankle
];

/// Head bones over the body layout, drawn with the face.
pub const FACE_BONES: [(usize, usize, Color); 5] = [
    (0, 14, FACE_COLOR),  // nose to right eye
    (0, 15, FACE_COLOR),  // nose to left eye
    (14, 16, FACE_COLOR), // right eye to right ear
    (15, 17, FACE_COLOR), // left eye to left ear
    (14, 15, FACE_COLOR), // eye to eye
];

/// Hand bones over the 21-point hand layout: each finger chained from the wrist.
pub const HAND_BONES: [(usize, usize); 20] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4), // thumb
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8), // index
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12), // middle
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16), // ring
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20), // pinky
];
