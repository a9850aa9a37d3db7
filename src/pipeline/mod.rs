use reqwest::{Client, ClientBuilder};
use std::path::PathBuf;
use url::Url;

use crate::config::Config;
use crate::download::{MediaDownloader, NoProgress, ProgressObserver, TerminalProgress};
use crate::extractors::{fetcher::parse_page_url, LinkExtractor, PageFetcher};
use crate::output::{resolve_name, OutputError};
use crate::transcode::{AudioTranscoder, TranscodeRequest};
use crate::utils::format_file_size;
use crate::{Error, Result};

/// One invocation's worth of work, built once from the command line
#[derive(Debug, Clone, Default)]
pub struct Job {
    /// Pages that each embed one video
    pub urls: Vec<String>,

    /// Listing pages whose entries are expanded into video pages
    pub series: Vec<String>,

    /// Explicit file names, paired by index with `urls`
    pub outputs: Vec<String>,

    /// Destination directory for videos and audio
    pub directory: Option<PathBuf>,

    /// Convert each video to MP3 and remove the video
    pub audio: bool,

    /// Show a progress bar while downloading
    pub progress: bool,
}

impl Job {
    pub fn validate(&self) -> Result<()> {
        if self.urls.is_empty() && self.series.is_empty() {
            return Err(Error::InvalidJob(
                "You must provide at least one of --url or --series.".to_string(),
            ));
        }

        if self.outputs.len() > self.urls.len() {
            return Err(Error::InvalidJob(
                "The number of specified output file names exceeds the number of input URLs provided."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Fetch, extract, download and convert, one page at a time
pub struct DownloadPipeline {
    fetcher: PageFetcher,
    extractor: LinkExtractor,
    downloader: MediaDownloader,
    transcoder: AudioTranscoder,
}

impl DownloadPipeline {
    /// Create a new pipeline from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = ClientBuilder::new();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client: Client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let extractor =
            LinkExtractor::new(&config.selectors).map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            fetcher: PageFetcher::new(client.clone()),
            extractor,
            downloader: MediaDownloader::new(client),
            transcoder: AudioTranscoder::new(config.converter.clone()),
        })
    }

    /// Process every series and then every direct URL, stopping at the first error.
    ///
    /// Returns the final file of each item in processing order: the video, or
    /// the MP3 when audio conversion is on.
    pub async fn run(&self, job: &Job) -> Result<Vec<PathBuf>> {
        job.validate()?;

        let mut saved = Vec::new();

        for series_url in &job.series {
            let pages = self.expand_series(series_url).await?;
            tracing::info!("Series {} lists {} pages", series_url, pages.len());

            for page in &pages {
                saved.push(self.process_page(page, None, job).await?);
            }
        }

        for (index, url) in job.urls.iter().enumerate() {
            let explicit_name = job.outputs.get(index).map(String::as_str);
            saved.push(self.process_page(url, explicit_name, job).await?);
        }

        Ok(saved)
    }

    /// Fetch a listing page and return its child page URLs
    pub async fn expand_series(&self, series_url: &str) -> Result<Vec<String>> {
        let base = parse_page_url(series_url)?;
        let content = self.fetcher.fetch(series_url).await?;

        self.extractor
            .extract_series_links(&content, &base)
            .map_err(|source| Error::Extraction {
                url: series_url.to_string(),
                source,
            })
    }

    /// Handle one video page end to end and return the resulting file
    pub async fn process_page(
        &self,
        page_url: &str,
        explicit_name: Option<&str>,
        job: &Job,
    ) -> Result<PathBuf> {
        let content = self.fetcher.fetch(page_url).await?;

        let declared = self
            .extractor
            .extract_media_url(&content)
            .map_err(|source| Error::Extraction {
                url: page_url.to_string(),
                source,
            })?;

        let media_url = resolve_media_url(page_url, &declared).map_err(|e| Error::Output {
            url: declared.clone(),
            source: OutputError::InvalidUrl(e),
        })?;
        tracing::info!("Video URL: {}", media_url);

        let destination = resolve_name(&media_url, explicit_name, job.directory.as_deref())
            .map_err(|source| Error::Output {
                url: media_url.clone(),
                source,
            })?;

        let observer: Box<dyn ProgressObserver> = if job.progress {
            Box::new(TerminalProgress::new(&destination.display().to_string()))
        } else {
            Box::new(NoProgress)
        };

        let written = self
            .downloader
            .download(&media_url, &destination, observer.as_ref())
            .await
            .map_err(|source| Error::Download {
                url: media_url.clone(),
                source,
            })?;
        tracing::info!(
            "Video downloaded successfully as {} ({})",
            destination.display(),
            format_file_size(written)
        );

        if !job.audio {
            return Ok(destination);
        }

        let request = TranscodeRequest::new(destination)
            .output_dir(job.directory.clone())
            .delete_source(true);
        Ok(self.transcoder.convert(&request).await?)
    }
}

/// Resolve a `src` attribute against the page it was found on
fn resolve_media_url(page_url: &str, declared: &str) -> std::result::Result<String, url::ParseError> {
    let page = Url::parse(page_url)?;
    Ok(page.join(declared)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_for(urls: &[&str], series: &[&str], outputs: &[&str]) -> Job {
        Job {
            urls: urls.iter().map(|s| s.to_string()).collect(),
            series: series.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            ..Job::default()
        }
    }

    fn page(src: &str) -> String {
        format!(r#"<div class="workshop"><video><source src="{src}"></video></div>"#)
    }

    #[test]
    fn test_job_validation() {
        assert!(job_for(&[], &[], &[]).validate().is_err());
        assert!(job_for(&["http://a/1"], &[], &["x.mp4", "y.mp4"]).validate().is_err());
        assert!(job_for(&["http://a/1"], &[], &["x.mp4"]).validate().is_ok());
        assert!(job_for(&[], &["http://a/list"], &[]).validate().is_ok());
        assert!(job_for(&["http://a/1", "http://a/2"], &[], &["x.mp4"]).validate().is_ok());
    }

    #[test]
    fn test_resolve_media_url() {
        assert_eq!(
            resolve_media_url("https://site.org/talks/42", "https://cdn.example.com/v/clip.mp4").unwrap(),
            "https://cdn.example.com/v/clip.mp4"
        );
        assert_eq!(
            resolve_media_url("https://site.org/talks/42", "/media/clip.mp4").unwrap(),
            "https://site.org/media/clip.mp4"
        );
        assert_eq!(
            resolve_media_url("https://site.org/talks/42", "clip.mp4").unwrap(),
            "https://site.org/talks/clip.mp4"
        );
    }

    #[tokio::test]
    async fn test_series_first_then_direct_with_paired_names() {
        let mut server = mockito::Server::new_async().await;
        let listing = r#"<div class="series">
            <h2><a href="/ep/1">One</a></h2>
            <h2><a href="/ep/2">Two</a></h2>
        </div>"#;
        server.mock("GET", "/list").with_body(listing).create_async().await;
        server.mock("GET", "/ep/1").with_body(page("/files/e1.mp4")).create_async().await;
        server.mock("GET", "/ep/2").with_body(page("/files/e2.mp4")).create_async().await;
        server.mock("GET", "/talk/a").with_body(page("/files/a.mp4")).create_async().await;
        server.mock("GET", "/talk/b").with_body(page("/files/b.mp4")).create_async().await;
        for name in ["e1", "e2", "a", "b"] {
            server
                .mock("GET", format!("/files/{name}.mp4").as_str())
                .with_body(name)
                .create_async()
                .await;
        }

        let base = server.url();
        let url = |path: &str| format!("{base}{path}");

        let dir = tempfile::tempdir().unwrap();
        let mut job = job_for(
            &[url("/talk/a").as_str(), url("/talk/b").as_str()],
            &[url("/list").as_str()],
            &["first.mp4"],
        );
        job.directory = Some(dir.path().join("out"));

        let saved = DownloadPipeline::new(&Config::default())
            .unwrap()
            .run(&job)
            .await
            .unwrap();

        let out = dir.path().join("out");
        assert_eq!(
            saved,
            vec![
                out.join("e1.mp4"),
                out.join("e2.mp4"),
                out.join("first.mp4"),
                out.join("b.mp4"),
            ]
        );
        assert_eq!(fs_err::read_to_string(out.join("first.mp4")).unwrap(), "a");
        assert_eq!(fs_err::read_to_string(out.join("b.mp4")).unwrap(), "b");
    }

    #[tokio::test]
    async fn test_first_failure_stops_the_run() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/one").with_body(page("/files/one.mp4")).create_async().await;
        server.mock("GET", "/files/one.mp4").with_body("1").create_async().await;
        server
            .mock("GET", "/two")
            .with_body("<html><p>moved</p></html>")
            .create_async()
            .await;
        let third = server
            .mock("GET", "/three")
            .with_body(page("/files/three.mp4"))
            .expect(0)
            .create_async()
            .await;

        let base = server.url();
        let url = |path: &str| format!("{base}{path}");

        let dir = tempfile::tempdir().unwrap();
        let mut job = job_for(
            &[
                url("/one").as_str(),
                url("/two").as_str(),
                url("/three").as_str(),
            ],
            &[],
            &[],
        );
        job.directory = Some(dir.path().to_path_buf());

        let err = DownloadPipeline::new(&Config::default())
            .unwrap()
            .run(&job)
            .await
            .unwrap_err();

        match err {
            Error::Extraction { url, source } => {
                assert!(url.ends_with("/two"));
                assert_eq!(
                    source.stage(),
                    Some(crate::extractors::ExtractionStage::ContainerMissing)
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(dir.path().join("one.mp4").exists());
        third.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_series_listing() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/list").with_body("<p>empty</p>").create_async().await;

        let pipeline = DownloadPipeline::new(&Config::default()).unwrap();
        let err = pipeline
            .expand_series(&format!("{}/list", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[tokio::test]
    async fn test_page_fetch_failure() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/down").with_status(503).create_async().await;

        let down = format!("{}/down", server.url());
        let job = job_for(&[down.as_str()], &[], &[]);
        let err = DownloadPipeline::new(&Config::default())
            .unwrap()
            .run(&job)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Fetch(_)));
    }
}
