//! Centered crop to a reference aspect ratio.
//!
//! The crop axis is chosen by comparing the two aspect ratios: a target wider
//! than the reference loses columns on both sides, anything else loses rows at
//! top and bottom. Offsets are split evenly, with the odd pixel going to the
//! far edge.

use anyhow::{Result, bail};
use image::DynamicImage;

/// A pixel rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Compute the centered rectangle of `target` that matches the aspect
    /// ratio of `reference`. Both are `(width, height)`.
    ///
    /// Returns `None` when any dimension is zero or the matching rectangle
    /// would be empty (a reference far more extreme than the target).
    ///
    /// # Example
    ///
    /// ```
    /// use exif_copy::transform::CropRect;
    ///
    /// // 4000x3000 target, square reference → 3000x3000 from the middle
    /// let rect = CropRect::centered((4000, 3000), (500, 500)).unwrap();
    /// assert_eq!(rect, CropRect { x: 500, y: 0, width: 3000, height: 3000 });
    /// ```
    pub fn centered(target: (u32, u32), reference: (u32, u32)) -> Option<Self> {
        let (target_w, target_h) = target;
        let (ref_w, ref_h) = reference;
        if target_w == 0 || target_h == 0 || ref_w == 0 || ref_h == 0 {
            return None;
        }

        let ref_aspect = ref_w as f64 / ref_h as f64;
        let target_aspect = target_w as f64 / target_h as f64;

        let rect = if target_aspect > ref_aspect {
            // Target is wider: trim columns.
            let width = ((target_h as f64 * ref_aspect).floor() as u32).min(target_w);
            Self {
                x: (target_w - width) / 2,
                y: 0,
                width,
                height: target_h,
            }
        } else {
            // Target is taller (or equal): trim rows.
            let height = ((target_w as f64 / ref_aspect).floor() as u32).min(target_h);
            Self {
                x: 0,
                y: (target_h - height) / 2,
                width: target_w,
                height,
            }
        };

        if rect.width == 0 || rect.height == 0 {
            return None;
        }
        Some(rect)
    }

    /// Whether the rectangle covers the whole of an image of this size.
    pub fn is_full(&self, dimensions: (u32, u32)) -> bool {
        self.x == 0 && self.y == 0 && (self.width, self.height) == dimensions
    }
}

/// Crop `image` to the aspect ratio of an image with `reference` dimensions.
pub fn crop_to_aspect(image: &DynamicImage, reference: (u32, u32)) -> Result<DynamicImage> {
    let dims = (image.width(), image.height());
    let Some(rect) = CropRect::centered(dims, reference) else {
        bail!(
            "Cannot crop {}x{} to the aspect ratio of {}x{}",
            dims.0,
            dims.1,
            reference.0,
            reference.1
        );
    };

    if rect.is_full(dims) {
        return Ok(image.clone());
    }

    log::debug!(
        "Cropping {}x{} → {}x{} at ({}, {})",
        dims.0,
        dims.1,
        rect.width,
        rect.height,
        rect.x,
        rect.y
    );
    Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
}
