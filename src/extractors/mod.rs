use scraper::{ElementRef, Html, Selector};
use url::Url;

pub mod fetcher;

pub use fetcher::{FetchError, PageFetcher};

use crate::config::PageSelectors;

/// Structural step at which a page stopped matching the expected layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStage {
    ContainerMissing,
    MediaElementMissing,
    SourceElementMissing,
    SourceAttributeEmpty,
    ListingSectionMissing,
}

impl ExtractionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStage::ContainerMissing => "container-missing",
            ExtractionStage::MediaElementMissing => "media-element-missing",
            ExtractionStage::SourceElementMissing => "source-element-missing",
            ExtractionStage::SourceAttributeEmpty => "source-attribute-empty",
            ExtractionStage::ListingSectionMissing => "listing-section-missing",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ExtractionStage::ContainerMissing => "No video container found",
            ExtractionStage::MediaElementMissing => "No video element found",
            ExtractionStage::SourceElementMissing => "No source element found",
            ExtractionStage::SourceAttributeEmpty => "No video URL found",
            ExtractionStage::ListingSectionMissing => "No series listing found",
        }
    }
}

impl std::fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("{} ({stage})", .stage.describe())]
    Layout { stage: ExtractionStage },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl ExtractionError {
    /// Stage marker for layout mismatches, `None` for selector errors
    pub fn stage(&self) -> Option<ExtractionStage> {
        match self {
            ExtractionError::Layout { stage } => Some(*stage),
            ExtractionError::InvalidSelector { .. } => None,
        }
    }
}

impl From<ExtractionStage> for ExtractionError {
    fn from(stage: ExtractionStage) -> Self {
        ExtractionError::Layout { stage }
    }
}

/// Compiled selectors for media and series extraction
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    container: Selector,
    media: Selector,
    source: Selector,
    listing: Selector,
    heading: Selector,
    anchor: Selector,
}

impl LinkExtractor {
    pub fn new(selectors: &PageSelectors) -> Result<Self, ExtractionError> {
        Ok(Self {
            container: compile(&selectors.container)?,
            media: compile(&selectors.media)?,
            source: compile(&selectors.source)?,
            listing: compile(&selectors.listing)?,
            heading: compile(&selectors.heading)?,
            anchor: compile(&selectors.anchor)?,
        })
    }

    /// Locate the media source declared inside the page's player container.
    ///
    /// Returns the `src` attribute exactly as written in the page. Each missing
    /// step is reported with its own stage so a layout change is easy to pin down.
    pub fn extract_media_url(&self, page_content: &str) -> Result<String, ExtractionError> {
        let document = Html::parse_document(page_content);

        let container = first(document.root_element(), &self.container)
            .ok_or(ExtractionStage::ContainerMissing)?;
        tracing::debug!("Found video container");

        let media = first(container, &self.media).ok_or(ExtractionStage::MediaElementMissing)?;

        let source = first(media, &self.source).ok_or(ExtractionStage::SourceElementMissing)?;

        let src = source
            .value()
            .attr("src")
            .filter(|src| !src.is_empty())
            .ok_or(ExtractionStage::SourceAttributeEmpty)?;

        Ok(src.to_string())
    }

    /// Collect child page URLs from a series listing, in document order.
    ///
    /// Links are resolved against the scheme and host of `base_url`. Headings
    /// without a usable anchor are skipped.
    pub fn extract_series_links(
        &self,
        listing_content: &str,
        base_url: &Url,
    ) -> Result<Vec<String>, ExtractionError> {
        let document = Html::parse_document(listing_content);

        let listing = first(document.root_element(), &self.listing)
            .ok_or(ExtractionStage::ListingSectionMissing)?;

        let origin = origin_of(base_url);

        let links = listing
            .select(&self.heading)
            .filter_map(|heading| {
                let href = first(heading, &self.anchor)?.value().attr("href")?.trim();
                if href.is_empty() {
                    tracing::debug!("Skipping heading with empty link");
                    return None;
                }
                match origin.join(href) {
                    Ok(url) => Some(url.to_string()),
                    Err(e) => {
                        tracing::debug!("Skipping unusable link '{}': {}", href, e);
                        None
                    }
                }
            })
            .collect();

        Ok(links)
    }
}

fn compile(selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|e| ExtractionError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

fn first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// Scheme, host and port of `url` with an empty path
fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}
