use anyhow::{Context, Result, bail};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use serde::Serialize;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::exif::{self, ExifMetadata, TiffPatch};
use crate::transform::{self, Rotation};

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Output encoding, chosen from the source file name's extension.
///
/// # Example
///
/// ```rust
/// use exif_copy::pipeline::ImageKind;
/// use std::path::Path;
///
/// assert_eq!(ImageKind::from_path(Path::new("IMG_0001.JPG")), Some(ImageKind::Jpeg));
/// assert_eq!(ImageKind::from_path(Path::new("scan.tiff")), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// JPEG: EXIF in an APP1 segment
    Jpeg,
    /// PNG: EXIF in an eXIf chunk
    Png,
    /// WebP (lossless): EXIF in a RIFF chunk
    WebP,
}

impl ImageKind {
    /// Determine the image kind from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

/// A named image held in memory: an upload, or a file read from disk.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Client-supplied file name (may contain directory components).
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read an image file, keeping its file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }
}

/// An output image, encoded and stamped, not yet written.
#[derive(Debug)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
    pub kind: ImageKind,
}

/// The outcome of one source/target pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    pub source: String,
    pub target: String,
    /// Where the result was written, on success.
    pub output_path: Option<PathBuf>,
    pub error: Option<String>,
}

/// The outcome of a whole batch of pairs.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub outcomes: Vec<PairOutcome>,
}

impl BatchReport {
    /// File names (not full paths) of every result written, in input order.
    pub fn processed_files(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| o.output_path.as_ref())
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }
}

/// Reduce a client-supplied name to a bare file name that is safe to join
/// onto the output directory.
///
/// Both `/` and `\` count as separators, since browsers on Windows may send
/// full paths.
pub fn output_file_name(name: &str) -> Result<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match last {
        "" | "." | ".." => bail!("Unusable output file name: {name:?}"),
        _ => Ok(last.to_string()),
    }
}

/// Stored pixel dimensions of an encoded image, read from its header.
fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("Failed to detect image format")?
        .into_dimensions()
        .context("Failed to read image dimensions")
}

/// Encode `image` as `kind`.
fn encode(image: &DynamicImage, kind: ImageKind, jpeg_quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match kind {
        ImageKind::Jpeg => {
            // JPEG has no alpha; flatten to 8-bit RGB first.
            let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality);
            DynamicImage::ImageRgb8(image.to_rgb8())
                .write_with_encoder(encoder)
                .context("Failed to encode JPEG")?;
        }
        ImageKind::Png => {
            image
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .context("Failed to encode PNG")?;
        }
        ImageKind::WebP => {
            DynamicImage::ImageRgba8(image.to_rgba8())
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP)
                .context("Failed to encode WebP")?;
        }
    }
    Ok(buf)
}

/// Produce the output image for one pair, entirely in memory.
///
/// 1. **Read**: source EXIF and stored dimensions; decode the target
/// 2. **Orient**: rotate the target per the source's orientation tag
/// 3. **Crop**: center-crop the target to the source's aspect ratio
/// 4. **Encode**: as `kind`, then stamp the source's EXIF blob
///    (patched per `config.exif`)
pub fn render_pair(
    source: &[u8],
    target: &[u8],
    kind: ImageKind,
    config: &Config,
) -> Result<RenderedImage> {
    let source_exif: ExifMetadata = exif::read_exif(source);
    let source_dims = image_dimensions(source).context("Failed to read source image")?;

    let target_image = image::load_from_memory(target).context("Failed to decode target image")?;

    let rotation = transform::resolve_orientation(&source_exif);
    if rotation != Rotation::None {
        log::debug!("  Rotating target {}° counter-clockwise", rotation.degrees());
    }
    let oriented = rotation.apply(target_image);
    let cropped = transform::crop_to_aspect(&oriented, source_dims)?;
    let (width, height) = (cropped.width(), cropped.height());

    let encoded = encode(&cropped, kind, config.output.jpeg_quality)?;

    let patch = TiffPatch {
        orientation: config.exif.reset_orientation.then_some(1),
        pixel_dimensions: config.exif.update_dimensions.then_some((width, height)),
    };
    let blob = match source_exif.raw {
        Some(raw) if !patch.is_empty() => Some(
            exif::patch_tiff(&raw, &patch).context("Failed to patch source EXIF")?,
        ),
        other => other,
    };
    if blob.is_none() {
        log::debug!("  Source has no EXIF, output will carry none");
    }

    let bytes = exif::stamp_exif(encoded, kind, blob.as_deref())
        .context("Failed to write EXIF into output")?;

    Ok(RenderedImage {
        bytes,
        width,
        height,
        rotation,
        kind,
    })
}

/// Process one pair and write the result into the output directory under the
/// source's file name, replacing any existing file.
///
/// Returns the path written.
pub fn process_pair(source: &ImageInput, target: &ImageInput, config: &Config) -> Result<PathBuf> {
    let file_name = output_file_name(&source.name)?;
    let Some(kind) = ImageKind::from_path(Path::new(&file_name)) else {
        bail!("Unsupported output format for {file_name:?}");
    };

    let rendered = render_pair(&source.bytes, &target.bytes, kind, config)?;

    let output_path = config.output.directory.join(&file_name);
    if output_path.exists() {
        log::debug!("  Replacing existing {}", output_path.display());
    }
    std::fs::write(&output_path, &rendered.bytes)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    log::info!(
        "  Wrote {} ({}x{})",
        output_path.display(),
        rendered.width,
        rendered.height
    );
    Ok(output_path)
}

/// Process source/target pairs positionally.
///
/// The two lists must have the same length. A pair that fails is logged and
/// recorded in the report; the remaining pairs still run.
///
/// # Example
///
/// ```rust,no_run
/// use exif_copy::config::Config;
/// use exif_copy::pipeline::{ImageInput, process_pairs};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::default();
/// let sources = vec![ImageInput::from_path(Path::new("camera/IMG_0001.jpg"))?];
/// let targets = vec![ImageInput::from_path(Path::new("edited/IMG_0001.png"))?];
///
/// let report = process_pairs(&sources, &targets, &config)?;
/// println!("Wrote {:?} into {}", report.processed_files(), report.output_dir.display());
/// # Ok(())
/// # }
/// ```
pub fn process_pairs(
    sources: &[ImageInput],
    targets: &[ImageInput],
    config: &Config,
) -> Result<BatchReport> {
    check_counts(sources.len(), targets.len())?;
    let names = sources
        .iter()
        .zip(targets)
        .map(|(s, t)| (s.name.clone(), t.name.clone()))
        .collect();

    run_batch(names, config, |i| process_pair(&sources[i], &targets[i], config))
}

/// Process source/target files positionally, reading each pair only when its
/// turn comes.
///
/// A file that cannot be read fails its own pair; the rest of the batch
/// still runs.
pub fn process_files(
    sources: &[PathBuf],
    targets: &[PathBuf],
    config: &Config,
) -> Result<BatchReport> {
    check_counts(sources.len(), targets.len())?;
    let names = sources
        .iter()
        .zip(targets)
        .map(|(s, t)| (s.display().to_string(), t.display().to_string()))
        .collect();

    run_batch(names, config, |i| {
        let source = ImageInput::from_path(&sources[i])?;
        let target = ImageInput::from_path(&targets[i])?;
        process_pair(&source, &target, config)
    })
}

fn check_counts(sources: usize, targets: usize) -> Result<()> {
    if sources != targets {
        bail!("Source and target counts must match ({sources} sources, {targets} targets)");
    }
    Ok(())
}

/// Run `process` for each pair index, logging and recording failures.
fn run_batch(
    names: Vec<(String, String)>,
    config: &Config,
    mut process: impl FnMut(usize) -> Result<PathBuf>,
) -> Result<BatchReport> {
    let output_dir = config.output.directory.clone();
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let total = names.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, (source, target)) in names.into_iter().enumerate() {
        log::info!("[{}/{}] Processing: {} ← {}", i + 1, total, source, target);

        let mut outcome = PairOutcome {
            source,
            target,
            output_path: None,
            error: None,
        };

        match process(i) {
            Ok(path) => outcome.output_path = Some(path),
            Err(e) => {
                log::error!(
                    "Failed to process files {} and {}: {e:#}",
                    outcome.source,
                    outcome.target
                );
                outcome.error = Some(format!("{e:#}"));
            }
        }

        outcomes.push(outcome);
    }

    Ok(BatchReport {
        output_dir,
        outcomes,
    })
}

/// Collect supported image files from the given paths.
///
/// Files are taken as given; directories are walked recursively (following
/// symlinks) and their images sorted by path, so that two directories of
/// matching names pair up in order.
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && is_supported_image(p))
                .collect();
            found.sort();
            images.extend(found);
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
