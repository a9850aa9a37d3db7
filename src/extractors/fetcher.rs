use reqwest::Client;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL format: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL must use HTTP or HTTPS protocol: {0}")]
    UnsupportedScheme(String),

    #[error("Error fetching the webpage {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetches HTML pages over plain HTTP(S)
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// GET a page and return its body as text. Any non-2xx status is an error.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = parse_page_url(url)?;
        tracing::info!("Fetching page: {}", parsed);

        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(request_error)?;

        response.text().await.map_err(request_error)
    }
}

/// Parse a page URL, accepting only http and https
pub fn parse_page_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::UnsupportedScheme(url.to_string()));
    }

    Ok(parsed)
}
