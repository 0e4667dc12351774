// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use image::Rgb;

/// Color type for skeleton drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// Red color.
    pub const RED: Self = Self(255, 0, 0);
    /// Green color.
    pub const GREEN: Self = Self(0, 255, 0);
    /// Blue color.
    pub const BLUE: Self = Self(0, 0, 255);
    /// Magenta color.
    pub const MAGENTA: Self = Self(255, 0, 255);
    /// White color.
    pub const WHITE: Self = Self(255, 255, 255);
    /// Black color.
    pub const BLACK: Self = Self(0, 0, 0);
    /// Yellow-green, left hand bones.
    pub const YELLOW_GREEN: Self = Self(154, 205, 50);
    /// Gold, right hand bones.
    pub const GOLD: Self = Self(255, 215, 0);

    /// Create a new color from RGB values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    /// Pixel value for `image` buffers.
    #[must_use]
    pub const fn rgb(self) -> Rgb<u8> {
        Rgb([self.0, self.1, self.2])
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        color.rgb()
    }
}

/// Joint fill.
pub const JOINT_COLOR: Color = Color::WHITE;

/// Canvas background.
pub const BACKGROUND: Color = Color::BLACK;

/// Head bones (eyes, ears, nose).
pub const FACE_COLOR: Color = Color::MAGENTA;

/// Left hand bones.
pub const LEFT_HAND_COLOR: Color = Color::YELLOW_GREEN;

/// Right hand bones.
pub const RIGHT_HAND_COLOR: Color = Color::GOLD;

/// Torso blues, from neck to hips and neck to nose.
pub const TORSO_BLUES: [Color; 2] = [Color(0, 102, 255), Color(0, 170, 255)];

/// Right arm, upper then lower.
pub const RIGHT_ARM: [Color; 2] = [Color(255, 128, 0), Color(255, 170, 0)];

/// Left arm, upper then lower.
pub const LEFT_ARM: [Color; 2] = [Color(0, 255, 0), Color(85, 255, 0)];

/// Right leg, upper then lower.
pub const RIGHT_LEG: [Color; 2] = [Color(0, 51, 255), Color(0, 0, 204)];

/// Left leg, upper then lower.
pub const LEFT_LEG: [Color; 2] = [Color(0, 204, 0), Color(0, 153, 51)];
