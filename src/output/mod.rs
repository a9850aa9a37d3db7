use std::path::{Path, PathBuf};
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("Invalid media URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Media URL has no file name in its path: {0}")]
    NoFileName(String),

    #[error("Failed to create output directory: {0}")]
    CreateDir(#[from] std::io::Error),
}

/// Work out where a downloaded media file goes.
///
/// An explicit name is used verbatim; otherwise the last path segment of the
/// media URL is taken. When a destination directory is given it is created
/// (with parents) and the name is joined onto it. Existing files are not checked
/// for and will be overwritten by the download.
pub fn resolve_name(
    media_url: &str,
    explicit_name: Option<&str>,
    destination_dir: Option<&Path>,
) -> Result<PathBuf, OutputError> {
    let base_name = match explicit_name {
        Some(name) => name.to_string(),
        None => file_name_from_url(media_url)?,
    };

    match destination_dir {
        Some(dir) => {
            fs_err::create_dir_all(dir)?;
            Ok(dir.join(base_name))
        }
        None => Ok(PathBuf::from(base_name)),
    }
}

/// Last segment of the URL path, without query or fragment
fn file_name_from_url(media_url: &str) -> Result<String, OutputError> {
    let parsed = Url::parse(media_url)?;

    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| OutputError::NoFileName(media_url.to_string()))
}
