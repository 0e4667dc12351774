// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Skeleton rasterizer.
//!
//! Draws canonical skeleton records onto a square black canvas. All confident
//! keypoints of all records are fitted together into the padded canvas, so
//! the skeleton fills the frame regardless of where the people stood in the
//! source image. Bones are coloured by limb; joints are white.
//!
//! # Example
//!
//! ```rust
//! use pose_control::{PersonKeypoints, RenderConfig, render::render_people};
//!
//! let canvas = render_people(&[PersonKeypoints::new()], &RenderConfig::default());
//! assert_eq!(canvas.dimensions(), (1024, 1024));
//! ```

pub mod color;
pub mod skeleton;

use std::io::{Cursor, Seek, Write};

use image::{ImageFormat, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::config::RenderConfig;
use crate::error::{PoseError, Result};
use crate::keypoints::{Keypoint, PersonKeypoints, PoseDocument};

use color::{BACKGROUND, Color, JOINT_COLOR, LEFT_HAND_COLOR, RIGHT_HAND_COLOR};
use skeleton::{BODY_BONES, FACE_BONES, HAND_BONES};

/// Body slots that belong to the head (nose, eyes, ears).
const HEAD_SLOTS: [usize; 5] = [0, 14, 15, 16, 17];

/// Maps source pixel coordinates onto the padded canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    /// Uniform scale factor.
    pub scale: f32,
    /// Canvas X of source X = 0.
    pub offset_x: f32,
    /// Canvas Y of source Y = 0.
    pub offset_y: f32,
}

impl FitTransform {
    /// Fit the bounding box of `points` into the canvas.
    ///
    /// Box dimensions are floored at one pixel for scaling, which keeps a
    /// single point or a straight line finite; the box is centred on its true
    /// extent. Returns `None` when there are no points.
    #[must_use]
    pub fn compute<I>(points: I, config: &RenderConfig) -> Option<Self>
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let (min_x, min_y, max_x, max_y) = iter.fold((x0, y0, x0, y0), |(a, b, c, d), (x, y)| {
            (a.min(x), b.min(y), c.max(x), d.max(y))
        });

        let (box_w, box_h) = (max_x - min_x, max_y - min_y);
        let usable = config.usable_size();
        let scale = (usable / box_w.max(1.0)).min(usable / box_h.max(1.0));

        #[allow(clippy::cast_precision_loss)]
        let size = config.size as f32;
        Some(Self {
            scale,
            offset_x: (size - box_w * scale) / 2.0 - min_x * scale,
            offset_y: (size - box_h * scale) / 2.0 - min_y * scale,
        })
    }

    /// Transform a source point to canvas coordinates.
    #[must_use]
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_pixel((x, y): (f32, f32)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

struct Canvas<'a> {
    image: RgbImage,
    fit: FitTransform,
    config: &'a RenderConfig,
}

impl Canvas<'_> {
    fn bone(&mut self, a: Keypoint, b: Keypoint, color: Color) {
        let threshold = self.config.confidence_threshold;
        if !a.is_confident(threshold) || !b.is_confident(threshold) {
            return;
        }
        let start = self.fit.apply(a.x, a.y);
        let end = self.fit.apply(b.x, b.y);
        thick_line(&mut self.image, start, end, self.config.line_width, color);
    }

    /// Bone between two indices of `points`; short records simply skip it.
    fn bone_at(&mut self, points: &[Keypoint], a: usize, b: usize, color: Color) {
        if let (Some(&pa), Some(&pb)) = (points.get(a), points.get(b)) {
            self.bone(pa, pb, color);
        }
    }

    fn hand(&mut self, points: &[Keypoint], color: Color) {
        for &(a, b) in &HAND_BONES {
            self.bone_at(points, a, b, color);
        }
    }

    fn joint(&mut self, kp: Keypoint, radius: u32) {
        if !kp.is_confident(self.config.confidence_threshold) {
            return;
        }
        #[allow(clippy::cast_possible_wrap)]
        let radius = radius as i32;
        let center = to_pixel(self.fit.apply(kp.x, kp.y));
        draw_filled_circle_mut(&mut self.image, center, radius, JOINT_COLOR.rgb());
    }

    fn bones(&mut self, person: &PersonKeypoints) {
        let body = person.body_keypoints();
        if self.config.draw_body {
            for &(a, b, color) in &BODY_BONES {
                self.bone_at(&body, a, b, color);
            }
        }
        if self.config.draw_face {
            for &(a, b, color) in &FACE_BONES {
                self.bone_at(&body, a, b, color);
            }
        }
        if self.config.draw_hands {
            self.hand(&person.left_hand_keypoints(), LEFT_HAND_COLOR);
            self.hand(&person.right_hand_keypoints(), RIGHT_HAND_COLOR);
        }
    }

    fn joints(&mut self, person: &PersonKeypoints) {
        let radius = self.config.joint_radius;
        for (slot, kp) in person.body_keypoints().into_iter().enumerate() {
            let head = HEAD_SLOTS.contains(&slot);
            if self.config.draw_body || (head && self.config.draw_face) {
                self.joint(kp, radius);
            }
        }
        if self.config.draw_face {
            // Mesh points are dense; keep them small.
            let mesh_radius = (radius / 2).max(1);
            for kp in person.face_keypoints() {
                self.joint(kp, mesh_radius);
            }
        }
        if self.config.draw_hands {
            for kp in person
                .left_hand_keypoints()
                .into_iter()
                .chain(person.right_hand_keypoints())
            {
                self.joint(kp, radius);
            }
        }
    }
}

/// Draw a line `width` pixels thick by stamping discs along it.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]
fn thick_line(image: &mut RgbImage, start: (f32, f32), end: (f32, f32), width: u32, color: Color) {
    if width <= 1 {
        draw_line_segment_mut(image, start, end, color.rgb());
        return;
    }
    let radius = (width / 2) as i32;
    let steps = (end.0 - start.0).hypot(end.1 - start.1).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let point = (
            start.0 + (end.0 - start.0) * t,
            start.1 + (end.1 - start.1) * t,
        );
        draw_filled_circle_mut(image, to_pixel(point), radius, color.rgb());
    }
}

/// Rasterize skeleton records onto a fresh canvas.
///
/// Every keypoint above the confidence threshold takes part in the fit,
/// whichever regions are enabled for drawing. For each record the bones are
/// drawn first (body, head, left hand, right hand) and the joints on top.
/// With nothing confident the canvas is plain black.
#[must_use]
pub fn render_people(people: &[PersonKeypoints], config: &RenderConfig) -> RgbImage {
    let image = RgbImage::from_pixel(config.size, config.size, BACKGROUND.rgb());

    let threshold = config.confidence_threshold;
    let fit = FitTransform::compute(
        people
            .iter()
            .flat_map(PersonKeypoints::all_keypoints)
            .filter(|kp| kp.is_confident(threshold))
            .map(|kp| (kp.x, kp.y)),
        config,
    );
    let Some(fit) = fit else {
        return image;
    };

    let mut canvas = Canvas { image, fit, config };
    for person in people {
        canvas.bones(person);
        canvas.joints(person);
    }
    canvas.image
}

/// Rasterize every person of a document.
#[must_use]
pub fn render_document(document: &PoseDocument, config: &RenderConfig) -> RgbImage {
    render_people(&document.people, config)
}

/// Write a canvas as PNG to `writer`.
///
/// # Errors
///
/// Returns [`PoseError::ImageEncode`] if encoding or writing fails.
pub fn write_png<W: Write + Seek>(image: &RgbImage, writer: &mut W) -> Result<()> {
    image
        .write_to(writer, ImageFormat::Png)
        .map_err(|e| PoseError::ImageEncode(e.to_string()))
}

/// Encode a canvas as PNG.
///
/// # Errors
///
/// Returns [`PoseError::ImageEncode`] if encoding fails.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    write_png(image, &mut buffer)?;
    Ok(buffer.into_inner())
}
