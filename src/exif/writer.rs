use anyhow::{Result, anyhow};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::webp::WebP;
use img_parts::{Bytes, ImageEXIF};

use crate::pipeline::ImageKind;

/// Replace the EXIF of an encoded image with `exif`.
///
/// `exif` is the bare TIFF blob; img-parts adds the container framing
/// (`Exif\0\0` APP1 for JPEG, `eXIf` chunk for PNG, `EXIF` chunk for WebP).
/// `None` strips any EXIF the encoder wrote.
pub fn stamp_exif(encoded: Vec<u8>, kind: ImageKind, exif: Option<&[u8]>) -> Result<Vec<u8>> {
    let exif = exif.map(Bytes::copy_from_slice);
    let encoded = Bytes::from(encoded);

    let output = match kind {
        ImageKind::Jpeg => {
            let mut jpeg = Jpeg::from_bytes(encoded)
                .map_err(|e| anyhow!("Failed to parse JPEG: {e}"))?;
            jpeg.set_exif(exif);
            jpeg.encoder().bytes()
        }
        ImageKind::Png => {
            let mut png = Png::from_bytes(encoded)
                .map_err(|e| anyhow!("Failed to parse PNG: {e}"))?;
            png.set_exif(exif);
            png.encoder().bytes()
        }
        ImageKind::WebP => {
            let mut webp = WebP::from_bytes(encoded)
                .map_err(|e| anyhow!("Failed to parse WebP: {e}"))?;
            webp.set_exif(exif);
            webp.encoder().bytes()
        }
    };

    Ok(output.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::tiff::tests::sample_blob;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn encoded(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn jpeg_gets_blob() {
        let blob = sample_blob(false, 8);
        let out = stamp_exif(encoded(ImageFormat::Jpeg), ImageKind::Jpeg, Some(&blob)).unwrap();

        let jpeg = Jpeg::from_bytes(Bytes::from(out.clone())).unwrap();
        assert_eq!(jpeg.exif().as_deref(), Some(blob.as_slice()));
        // Still a decodable JPEG.
        assert_eq!(image::load_from_memory(&out).unwrap().width(), 4);
    }

    #[test]
    fn png_gets_blob() {
        let blob = sample_blob(true, 1);
        let out = stamp_exif(encoded(ImageFormat::Png), ImageKind::Png, Some(&blob)).unwrap();

        let png = Png::from_bytes(Bytes::from(out)).unwrap();
        assert_eq!(png.exif().as_deref(), Some(blob.as_slice()));
    }

    #[test]
    fn none_leaves_no_exif() {
        let out = stamp_exif(encoded(ImageFormat::Jpeg), ImageKind::Jpeg, None).unwrap();
        let jpeg = Jpeg::from_bytes(Bytes::from(out)).unwrap();
        assert!(jpeg.exif().is_none());
    }

    #[test]
    fn kind_mismatch_errors() {
        assert!(stamp_exif(encoded(ImageFormat::Png), ImageKind::Jpeg, None).is_err());
    }
}
