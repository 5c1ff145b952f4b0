//! EXIF reading, stamping, and patching.
//!
//! - [`read_exif`]: raw blob plus parsed tags from any supported container
//! - [`stamp_exif`]: write a raw blob into an encoded JPEG, PNG, or WebP
//! - [`patch_tiff`]: rewrite Orientation / PixelX/YDimension values in a blob
//!
//! The blob is carried verbatim from source to output; nothing is re-serialized
//! unless a [`TiffPatch`] asks for it, and even then only fixed-size values
//! change in place.

mod reader;
pub(crate) mod tiff;
mod writer;

pub use reader::{ExifMetadata, read_exif, read_exif_file};
pub use tiff::{TiffPatch, patch_tiff};
pub use writer::stamp_exif;
