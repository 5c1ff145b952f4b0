//! In-place edits of a raw TIFF-structured EXIF blob.
//!
//! Only fixed-size scalar values are rewritten, so no offsets move and every
//! other byte of the blob (maker notes, thumbnails, unknown tags) survives.

use anyhow::{Result, bail};

const TAG_ORIENTATION: u16 = 0x0112;
const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_PIXEL_X_DIMENSION: u16 = 0xA002;
const TAG_PIXEL_Y_DIMENSION: u16 = 0xA003;

// TIFF field types
const FORMAT_SHORT: u16 = 3;
const FORMAT_LONG: u16 = 4;

const ENTRY_SIZE: usize = 12;

/// Values to overwrite in a blob. `None` leaves the tag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiffPatch {
    /// New IFD0 Orientation value.
    pub orientation: Option<u16>,
    /// New ExifIFD PixelXDimension / PixelYDimension.
    pub pixel_dimensions: Option<(u32, u32)>,
}

impl TiffPatch {
    pub fn is_empty(&self) -> bool {
        self.orientation.is_none() && self.pixel_dimensions.is_none()
    }
}

/// Read-only view of a TIFF blob in its own byte order.
struct TiffView<'a> {
    data: &'a [u8],
    big_endian: bool,
}

impl<'a> TiffView<'a> {
    fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < 8 {
            bail!("TIFF data too short");
        }
        let big_endian = match &data[0..2] {
            b"MM" => true,
            b"II" => false,
            _ => bail!("Invalid TIFF byte order"),
        };
        Ok(Self { data, big_endian })
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let b = self.data.get(offset..offset + 2)?;
        Some(if self.big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let b = self.data.get(offset..offset + 4)?;
        Some(if self.big_endian {
            u32::from_be_bytes([b[0], b[1], b[2], b[3]])
        } else {
            u32::from_le_bytes([b[0], b[1], b[2], b[3]])
        })
    }

    fn encode_u16(&self, val: u16) -> [u8; 2] {
        if self.big_endian { val.to_be_bytes() } else { val.to_le_bytes() }
    }

    fn encode_u32(&self, val: u32) -> [u8; 4] {
        if self.big_endian { val.to_be_bytes() } else { val.to_le_bytes() }
    }

    /// Byte offsets of each 12-byte entry in the IFD at `ifd_offset`.
    fn entries(&self, ifd_offset: usize) -> Result<Vec<usize>> {
        let Some(count) = self.u16_at(ifd_offset) else {
            bail!("IFD offset {ifd_offset} out of bounds");
        };
        let start = ifd_offset + 2;
        let end = start + count as usize * ENTRY_SIZE;
        if end > self.data.len() {
            bail!("IFD entries extend beyond TIFF data");
        }
        Ok((0..count as usize).map(|i| start + i * ENTRY_SIZE).collect())
    }

    fn ifd0_entries(&self) -> Result<Vec<usize>> {
        let Some(offset) = self.u32_at(4) else {
            bail!("TIFF header truncated");
        };
        self.entries(offset as usize)
    }

    /// Find an entry by tag id, returning its byte offset and field type.
    fn find(&self, entries: &[usize], tag: u16) -> Option<(usize, u16)> {
        entries
            .iter()
            .copied()
            .find(|&e| self.u16_at(e) == Some(tag))
            .and_then(|e| Some((e, self.u16_at(e + 2)?)))
    }
}

/// Read a single SHORT value from IFD0.
pub(crate) fn read_ifd0_short(blob: &[u8], tag: u16) -> Option<u16> {
    let view = TiffView::new(blob).ok()?;
    let entries = view.ifd0_entries().ok()?;
    match view.find(&entries, tag)? {
        (entry, FORMAT_SHORT) => view.u16_at(entry + 8),
        _ => None,
    }
}

/// Read the Orientation tag straight from a raw blob.
pub(crate) fn read_orientation(blob: &[u8]) -> Option<u16> {
    read_ifd0_short(blob, TAG_ORIENTATION)
}

/// Apply `patch` to a copy of `blob`.
///
/// Tags missing from the blob are not added. A blob whose IFD structure
/// cannot be walked is an error.
pub fn patch_tiff(blob: &[u8], patch: &TiffPatch) -> Result<Vec<u8>> {
    let view = TiffView::new(blob)?;
    let mut writes: Vec<(usize, Vec<u8>)> = Vec::new();

    let ifd0 = view.ifd0_entries()?;

    if let Some(orientation) = patch.orientation {
        match view.find(&ifd0, TAG_ORIENTATION) {
            Some((entry, FORMAT_SHORT)) => {
                writes.push((entry + 8, view.encode_u16(orientation).to_vec()));
            }
            Some((_, format)) => {
                log::warn!("Orientation tag has unexpected type {format}, leaving it as is");
            }
            None => log::debug!("No Orientation tag to patch"),
        }
    }

    if let Some((width, height)) = patch.pixel_dimensions {
        let exif_ifd = view
            .find(&ifd0, TAG_EXIF_IFD_POINTER)
            .and_then(|(entry, _)| view.u32_at(entry + 8));

        match exif_ifd {
            Some(offset) => {
                let entries = view.entries(offset as usize)?;
                for (tag, value) in [(TAG_PIXEL_X_DIMENSION, width), (TAG_PIXEL_Y_DIMENSION, height)] {
                    let Some((entry, format)) = view.find(&entries, tag) else {
                        continue;
                    };
                    let bytes = match format {
                        FORMAT_LONG => view.encode_u32(value).to_vec(),
                        FORMAT_SHORT => match u16::try_from(value) {
                            Ok(v) => view.encode_u16(v).to_vec(),
                            Err(_) => {
                                log::warn!("Dimension {value} does not fit tag {tag:#06x} (SHORT)");
                                continue;
                            }
                        },
                        other => {
                            log::warn!("Tag {tag:#06x} has unexpected type {other}");
                            continue;
                        }
                    };
                    writes.push((entry + 8, bytes));
                }
            }
            None => log::debug!("No ExifIFD, pixel dimensions not patched"),
        }
    }

    let mut out = blob.to_vec();
    for (offset, bytes) in writes {
        out[offset..offset + bytes.len()].copy_from_slice(&bytes);
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a minimal TIFF blob: IFD0 with Orientation and an ExifIFD
    /// pointer, ExifIFD with PixelXDimension (LONG) and PixelYDimension (SHORT).
    pub(crate) fn sample_blob(big_endian: bool, orientation: u16) -> Vec<u8> {
        let u16b = |v: u16| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
        let u32b = |v: u32| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };

        let mut out = Vec::new();
        out.extend_from_slice(if big_endian { b"MM" } else { b"II" });
        out.extend_from_slice(&u16b(42));
        out.extend_from_slice(&u32b(8));

        // IFD0 at 8: 2 entries → ends at 8 + 2 + 24 + 4 = 38
        out.extend_from_slice(&u16b(2));
        out.extend_from_slice(&u16b(TAG_ORIENTATION));
        out.extend_from_slice(&u16b(FORMAT_SHORT));
        out.extend_from_slice(&u32b(1));
        out.extend_from_slice(&u16b(orientation));
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&u16b(TAG_EXIF_IFD_POINTER));
        out.extend_from_slice(&u16b(FORMAT_LONG));
        out.extend_from_slice(&u32b(1));
        out.extend_from_slice(&u32b(38));
        out.extend_from_slice(&u32b(0));

        // ExifIFD at 38
        out.extend_from_slice(&u16b(2));
        out.extend_from_slice(&u16b(TAG_PIXEL_X_DIMENSION));
        out.extend_from_slice(&u16b(FORMAT_LONG));
        out.extend_from_slice(&u32b(1));
        out.extend_from_slice(&u32b(4000));
        out.extend_from_slice(&u16b(TAG_PIXEL_Y_DIMENSION));
        out.extend_from_slice(&u16b(FORMAT_SHORT));
        out.extend_from_slice(&u32b(1));
        out.extend_from_slice(&u16b(3000));
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&u32b(0));
        out
    }

    pub(crate) fn exif_ifd_value(blob: &[u8], tag: u16) -> Option<u32> {
        let view = TiffView::new(blob).ok()?;
        let ifd0 = view.ifd0_entries().ok()?;
        let (ptr, _) = view.find(&ifd0, TAG_EXIF_IFD_POINTER)?;
        let entries = view.entries(view.u32_at(ptr + 8)? as usize).ok()?;
        match view.find(&entries, tag)? {
            (e, FORMAT_LONG) => view.u32_at(e + 8),
            (e, FORMAT_SHORT) => view.u16_at(e + 8).map(u32::from),
            _ => None,
        }
    }

    // ── read_orientation ─────────────────────────────────────────────

    #[test]
    fn reads_orientation_little_endian() {
        assert_eq!(read_orientation(&sample_blob(false, 6)), Some(6));
    }

    #[test]
    fn reads_orientation_big_endian() {
        assert_eq!(read_orientation(&sample_blob(true, 8)), Some(8));
    }

    #[test]
    fn read_orientation_rejects_garbage() {
        assert_eq!(read_orientation(b"not a tiff at all"), None);
        assert_eq!(read_orientation(b"II"), None);
    }

    // ── patch_tiff ───────────────────────────────────────────────────

    #[test]
    fn empty_patch_is_identity() {
        let blob = sample_blob(false, 6);
        assert!(TiffPatch::default().is_empty());
        assert_eq!(patch_tiff(&blob, &TiffPatch::default()).unwrap(), blob);
    }

    #[test]
    fn patches_orientation_only() {
        let blob = sample_blob(true, 6);
        let patched = patch_tiff(
            &blob,
            &TiffPatch { orientation: Some(1), ..Default::default() },
        )
        .unwrap();

        assert_eq!(patched.len(), blob.len());
        assert_eq!(read_orientation(&patched), Some(1));
        assert_eq!(exif_ifd_value(&patched, TAG_PIXEL_X_DIMENSION), Some(4000));

        let changed = blob.iter().zip(&patched).filter(|(a, b)| a != b).count();
        assert!(changed <= 2, "only the orientation value should change");
    }

    #[test]
    fn patches_pixel_dimensions() {
        let blob = sample_blob(false, 1);
        let patched = patch_tiff(
            &blob,
            &TiffPatch { pixel_dimensions: Some((1500, 2000)), ..Default::default() },
        )
        .unwrap();

        assert_eq!(exif_ifd_value(&patched, TAG_PIXEL_X_DIMENSION), Some(1500));
        assert_eq!(exif_ifd_value(&patched, TAG_PIXEL_Y_DIMENSION), Some(2000));
        assert_eq!(read_orientation(&patched), Some(1));
    }

    #[test]
    fn oversized_short_dimension_is_skipped() {
        let blob = sample_blob(false, 1);
        let patched = patch_tiff(
            &blob,
            &TiffPatch { pixel_dimensions: Some((70_000, 70_000)), ..Default::default() },
        )
        .unwrap();

        assert_eq!(exif_ifd_value(&patched, TAG_PIXEL_X_DIMENSION), Some(70_000));
        assert_eq!(exif_ifd_value(&patched, TAG_PIXEL_Y_DIMENSION), Some(3000));
    }

    #[test]
    fn patch_rejects_bad_header() {
        let patch = TiffPatch { orientation: Some(1), ..Default::default() };
        assert!(patch_tiff(b"XX*\0\x08\0\0\0", &patch).is_err());
        assert!(patch_tiff(b"II", &patch).is_err());
    }

    #[test]
    fn patch_rejects_truncated_ifd() {
        let mut blob = sample_blob(false, 6);
        blob.truncate(20);
        let patch = TiffPatch { orientation: Some(1), ..Default::default() };
        assert!(patch_tiff(&blob, &patch).is_err());
    }
}
