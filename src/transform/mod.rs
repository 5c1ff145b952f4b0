//! Geometric transforms applied to the target image.
//!
//! - [`Rotation`]: resolved from the source's EXIF orientation tag
//! - [`CropRect`]: centered crop matching the source's aspect ratio
//!
//! Both are pure functions of dimensions and tag values; the pixel work is
//! delegated to `image::DynamicImage`.

mod crop;
mod orientation;

pub use crop::{CropRect, crop_to_aspect};
pub use orientation::{Rotation, resolve_orientation};
