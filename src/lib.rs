//! # exif-copy
//!
//! Copy EXIF metadata and framing from one photo onto another. Given a
//! **source** (the original camera file) and a **target** (for example an
//! edited export that lost its metadata), exif-copy rotates the target per the
//! source's EXIF orientation, center-crops it to the source's aspect ratio,
//! and writes it out under the source's file name with the source's EXIF
//! stamped in.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exif_copy::config::Config;
//! use exif_copy::pipeline::{ImageInput, process_pairs};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!
//!     let sources = vec![ImageInput::from_path(Path::new("camera/IMG_0042.jpg"))?];
//!     let targets = vec![ImageInput::from_path(Path::new("export/IMG_0042.png"))?];
//!
//!     let report = process_pairs(&sources, &targets, &config)?;
//!     for outcome in &report.outcomes {
//!         match (&outcome.output_path, &outcome.error) {
//!             (Some(path), _) => println!("Wrote {}", path.display()),
//!             (_, Some(err)) => eprintln!("Skipped {}: {err}", outcome.source),
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Formats
//!
//! | Format | Input | Output EXIF |
//! |--------|-------|-------------|
//! | JPEG (`.jpg`, `.jpeg`) | yes | APP1 segment |
//! | PNG (`.png`) | yes | `eXIf` chunk |
//! | WebP (`.webp`) | yes | `EXIF` chunk (lossless output) |
//!
//! The output format follows the source file name's extension.
//!
//! ## Modules
//!
//! - [`config`]: Configuration types and loading/saving
//! - [`exif`]: EXIF reading, stamping, and in-place patching
//! - [`transform`]: Orientation resolution and aspect-ratio crop
//! - [`pipeline`]: Per-pair processing, batches, and file collection
//! - [`web`]: HTTP upload endpoint

pub mod config;
pub mod exif;
pub mod pipeline;
pub mod transform;
pub mod web;
