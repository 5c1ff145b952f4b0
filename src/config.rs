use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for exif-copy.
///
/// Controls where results are written, how they are encoded, which EXIF
/// values are adjusted after the copy, and where the HTTP server listens.
///
/// # Loading
///
/// ```rust,no_run
/// use exif_copy::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.output.directory = "/srv/photos/out".into();
/// config.exif.reset_orientation = true;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Output directory and encoding.
    pub output: OutputConfig,
    /// Post-copy EXIF adjustments.
    pub exif: ExifConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a whole multipart request body, in bytes.
    pub max_upload_bytes: usize,
}

/// Where and how results are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory results are saved into (created on demand).
    pub directory: PathBuf,
    /// JPEG quality, 1–100.
    pub jpeg_quality: u8,
}

/// Adjustments applied to the copied EXIF blob.
///
/// Both default to `false`, so the source's EXIF lands on the output
/// byte-for-byte.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExifConfig {
    /// Set Orientation to 1 (the pixels already carry the rotation).
    pub reset_orientation: bool,
    /// Set PixelXDimension / PixelYDimension to the output size.
    pub update_dimensions: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_bytes: 256 * 1024 * 1024,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("ExifCopy"),
            jpeg_quality: 95,
        }
    }
}

impl Config {
    /// Resolve the config file path (same directory as the executable).
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Reject values the encoder or listener cannot use.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.output.jpeg_quality) {
            anyhow::bail!(
                "output.jpeg_quality must be between 1 and 100, got {}",
                self.output.jpeg_quality
            );
        }
        if self.output.directory.as_os_str().is_empty() {
            anyhow::bail!("output.directory must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.output.jpeg_quality, 95);
        assert_eq!(config.output.directory, PathBuf::from("ExifCopy"));
        assert!(!config.exif.reset_orientation);
        assert!(!config.exif.update_dimensions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.json"))).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.output.directory = dir.path().join("out");
        config.exif.reset_orientation = true;
        config.save(Some(&path)).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.output.directory, dir.path().join("out"));
        assert!(loaded.exif.reset_orientation);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "output": { "jpeg_quality": 80 } }"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.output.jpeg_quality, 80);
        assert_eq!(config.output.directory, PathBuf::from("ExifCopy"));
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn invalid_quality_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "output": { "jpeg_quality": 0 } }"#).unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn malformed_json_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
