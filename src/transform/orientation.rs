use image::DynamicImage;

use crate::exif::ExifMetadata;

/// A rotation to apply to the target, in counter-clockwise degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Ccw90,
    Ccw180,
    Ccw270,
}

impl Rotation {
    /// Map a raw EXIF orientation value to a rotation.
    ///
    /// Only the pure rotations are honoured: 3 → 180, 6 → 270, 8 → 90.
    /// Every other value (including the mirrored 2/4/5/7) is a no-op.
    pub fn from_orientation_tag(value: u16) -> Self {
        match value {
            3 => Self::Ccw180,
            6 => Self::Ccw270,
            8 => Self::Ccw90,
            _ => Self::None,
        }
    }

    /// Counter-clockwise angle in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Ccw90 => 90,
            Self::Ccw180 => 180,
            Self::Ccw270 => 270,
        }
    }

    /// Whether applying this rotation swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Ccw90 | Self::Ccw270)
    }

    /// Rotate the image, expanding the canvas so no pixels are lost.
    ///
    /// `image` rotates clockwise, so a 90° counter-clockwise turn is a 270°
    /// clockwise one and vice versa.
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Self::None => image,
            Self::Ccw90 => image.rotate270(),
            Self::Ccw180 => image.rotate180(),
            Self::Ccw270 => image.rotate90(),
        }
    }
}

/// Resolve the rotation carried by a source image's EXIF.
///
/// A missing orientation tag means no rotation.
pub fn resolve_orientation(exif: &ExifMetadata) -> Rotation {
    exif.orientation
        .map(Rotation::from_orientation_tag)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    // ── from_orientation_tag ─────────────────────────────────────────

    #[test]
    fn orientation_3_is_180() {
        assert_eq!(Rotation::from_orientation_tag(3), Rotation::Ccw180);
        assert_eq!(Rotation::from_orientation_tag(3).degrees(), 180);
    }

    #[test]
    fn orientation_6_is_270() {
        assert_eq!(Rotation::from_orientation_tag(6).degrees(), 270);
    }

    #[test]
    fn orientation_8_is_90() {
        assert_eq!(Rotation::from_orientation_tag(8).degrees(), 90);
    }

    #[test]
    fn other_orientations_are_noops() {
        for value in [0u16, 1, 2, 4, 5, 7, 9, 255, u16::MAX] {
            assert_eq!(
                Rotation::from_orientation_tag(value),
                Rotation::None,
                "Expected no rotation for orientation {value}"
            );
        }
    }

    // ── resolve_orientation ──────────────────────────────────────────

    #[test]
    fn missing_tag_is_noop() {
        assert_eq!(resolve_orientation(&ExifMetadata::default()), Rotation::None);
    }

    #[test]
    fn resolves_from_metadata() {
        let exif = ExifMetadata {
            orientation: Some(6),
            ..Default::default()
        };
        assert_eq!(resolve_orientation(&exif), Rotation::Ccw270);
    }

    // ── apply ────────────────────────────────────────────────────────

    /// 2x1 image: red on the left, blue on the right.
    fn two_pixel_image() -> DynamicImage {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn apply_none_keeps_image() {
        let out = Rotation::None.apply(two_pixel_image()).to_rgb8();
        assert_eq!(out.dimensions(), (2, 1));
        assert_eq!(out.get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn apply_ccw90_moves_left_to_bottom() {
        let rotation = Rotation::Ccw90;
        assert!(rotation.swaps_dimensions());
        let out = rotation.apply(two_pixel_image()).to_rgb8();
        assert_eq!(out.dimensions(), (1, 2));
        // Counter-clockwise: the right edge rises to the top.
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(out.get_pixel(0, 1), &Rgb([255, 0, 0]));
    }

    #[test]
    fn apply_ccw270_moves_left_to_top() {
        let out = Rotation::Ccw270.apply(two_pixel_image()).to_rgb8();
        assert_eq!(out.dimensions(), (1, 2));
        assert_eq!(out.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(0, 1), &Rgb([0, 0, 255]));
    }

    #[test]
    fn apply_ccw180_swaps_ends() {
        let rotation = Rotation::Ccw180;
        assert!(!rotation.swaps_dimensions());
        let out = rotation.apply(two_pixel_image()).to_rgb8();
        assert_eq!(out.dimensions(), (2, 1));
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 255]));
    }
}
