use anyhow::{Context, Result};
use img_parts::{Bytes, DynImage, ImageEXIF};
use nom_exif::*;
use std::io::Cursor;
use std::path::Path;

use super::tiff;

/// EXIF carried by a source image.
///
/// `raw` is the TIFF-structured blob exactly as stored in the container
/// (without the JPEG `Exif\0\0` prefix); it is what gets stamped onto the
/// output. The remaining fields are a parsed view used for orientation and
/// display.
#[derive(Debug, Clone, Default)]
pub struct ExifMetadata {
    pub raw: Option<Vec<u8>>,
    pub orientation: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub software: Option<String>,
    pub date_time: Option<String>,
}

impl ExifMetadata {
    /// Whether the source had any EXIF at all.
    pub fn is_empty(&self) -> bool {
        self.raw.is_none() && self.orientation.is_none()
    }
}

/// Read EXIF from an image held in memory.
///
/// Missing or unparseable EXIF is not an error; it yields an empty
/// [`ExifMetadata`].
pub fn read_exif(bytes: &[u8]) -> ExifMetadata {
    let raw = extract_raw(bytes);

    // Parse the whole container first, then the bare blob (which is itself a
    // valid TIFF stream) for containers nom-exif does not recognise.
    let parsed = parse_tags(bytes).or_else(|| raw.as_deref().and_then(parse_tags));

    from_parts(raw, parsed)
}

/// Combine the raw blob with whatever nom-exif made of it. Orientation falls
/// back to a direct IFD0 lookup in the blob when the parsed view lacks it.
fn from_parts(raw: Option<Vec<u8>>, parsed: Option<Exif>) -> ExifMetadata {
    let mut data = ExifMetadata {
        raw,
        ..Default::default()
    };

    if let Some(exif) = parsed {
        data.orientation = exif.get(ExifTag::Orientation).and_then(entry_to_u16);
        data.make = exif.get(ExifTag::Make).and_then(entry_to_string);
        data.model = exif.get(ExifTag::Model).and_then(entry_to_string);
        data.software = exif.get(ExifTag::Software).and_then(entry_to_string);
        data.date_time = exif.get(ExifTag::DateTimeOriginal).and_then(entry_to_string);
    } else {
        log::debug!("No parseable EXIF tags found");
    }

    if data.orientation.is_none() {
        data.orientation = data.raw.as_deref().and_then(tiff::read_orientation);
    }

    data
}

/// Read EXIF from an image file.
pub fn read_exif_file(path: &Path) -> Result<ExifMetadata> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(read_exif(&bytes))
}

/// Pull the raw EXIF blob out of a JPEG, PNG, or WebP container.
fn extract_raw(bytes: &[u8]) -> Option<Vec<u8>> {
    let image = match DynImage::from_bytes(Bytes::copy_from_slice(bytes)) {
        Ok(Some(image)) => image,
        Ok(None) => {
            log::debug!("Container format not recognised, no raw EXIF");
            return None;
        }
        Err(e) => {
            log::debug!("Failed to parse image container: {e}");
            return None;
        }
    };
    image.exif().map(|b| b.to_vec()).filter(|b| !b.is_empty())
}

fn parse_tags(bytes: &[u8]) -> Option<Exif> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::seekable(Cursor::new(bytes)).ok()?;
    let iter: ExifIter = parser.parse(ms).ok()?;
    Some(iter.into())
}

/// Convert an integer EntryValue to a u16.
fn entry_to_u16(val: &EntryValue) -> Option<u16> {
    match val {
        EntryValue::U8(v) => Some(u16::from(*v)),
        EntryValue::U16(v) => Some(*v),
        EntryValue::U32(v) => u16::try_from(*v).ok(),
        _ => None,
    }
}

/// Convert an EntryValue to an Option<String>.
fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').to_string();
    if s.is_empty() { None } else { Some(s) }
}
