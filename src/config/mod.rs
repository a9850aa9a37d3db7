use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Program invoked for MP4 to MP3 conversion
    pub converter: String,

    /// User agent sent with page and media requests
    pub user_agent: Option<String>,

    /// CSS selectors describing the target site's markup
    pub selectors: PageSelectors,
}

/// Structural query used to locate media and series links on a page.
///
/// The defaults match the layout the tool was written for; other sites only
/// need a different set of selectors, never a different algorithm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PageSelectors {
    /// Labeled container holding the player
    pub container: String,

    /// Media element inside the container
    pub media: String,

    /// Source element inside the media element
    pub source: String,

    /// Labeled section of a series listing page
    pub listing: String,

    /// Heading elements inside the listing section, one per episode
    pub heading: String,

    /// Anchor inside a heading
    pub anchor: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            container: "div.workshop".to_string(),
            media: "video".to_string(),
            source: "source".to_string(),
            listing: "div.series".to_string(),
            heading: "h1, h2, h3, h4, h5, h6".to_string(),
            anchor: "a".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            converter: "ffmpeg".to_string(),
            user_agent: None,
            selectors: PageSelectors::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Get configuration file path
    fn config_path() -> Option<PathBuf> {
        // Local file wins so a per-site selector set can live next to the downloads
        let local_config = PathBuf::from("video-dl.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("video-dl").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.converter.trim().is_empty() {
            anyhow::bail!("Converter program must not be empty");
        }

        crate::extractors::LinkExtractor::new(&self.selectors)
            .context("Invalid selector in configuration")?;

        Ok(())
    }

    /// Override the converter program, e.g. from the command line
    pub fn with_converter(mut self, converter: Option<String>) -> Self {
        if let Some(converter) = converter {
            self.converter = converter;
        }
        self
    }
}
