use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Extension a source file must carry to be converted
pub const SOURCE_EXTENSION: &str = "mp4";

/// Extension of the converted audio file
pub const AUDIO_EXTENSION: &str = "mp3";

#[derive(thiserror::Error, Debug)]
pub enum ConversionError {
    #[error("The input file '{0}' does not exist")]
    MissingSource(PathBuf),

    #[error("The input file must be a .mp4 file: {0}")]
    WrongType(PathBuf),

    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch converter '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error while converting file using {program} ({status}): {stderr}")]
    TranscodeFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Error while deleting the original file {path}: {source}")]
    CleanupFailed {
        path: PathBuf,
        /// Converted file, which stays valid
        output: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single conversion of a downloaded media file
#[derive(Debug, Clone)]
pub struct TranscodeRequest {
    pub source: PathBuf,

    /// Where the audio file goes; the working directory when unset
    pub output_dir: Option<PathBuf>,

    /// Remove the source after a successful conversion
    pub delete_source: bool,
}

impl TranscodeRequest {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output_dir: None,
            delete_source: true,
        }
    }

    pub fn output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn delete_source(mut self, delete: bool) -> Self {
        self.delete_source = delete;
        self
    }
}

/// Extracts MP3 audio from MP4 files with an external converter (ffmpeg)
#[derive(Debug, Clone)]
pub struct AudioTranscoder {
    program: String,
}

impl Default for AudioTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl AudioTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Convert `request.source` to MP3, returning the path of the audio file.
    ///
    /// A failed conversion never deletes the source. A failed deletion after a
    /// successful conversion is reported, but the audio file is kept.
    pub async fn convert(&self, request: &TranscodeRequest) -> Result<PathBuf, ConversionError> {
        let source = request.source.as_path();
        validate_source(source)?;

        let output_dir = prepare_output_dir(request.output_dir.as_deref())?;
        let output = audio_path_for(source, &output_dir);

        self.run_converter(source, &output).await?;
        tracing::info!("Converted {} to {}", source.display(), output.display());

        if request.delete_source {
            tokio::fs::remove_file(source)
                .await
                .map_err(|e| ConversionError::CleanupFailed {
                    path: source.to_path_buf(),
                    output: output.clone(),
                    source: e,
                })?;
            tracing::info!("Removed {}", source.display());
        }

        Ok(output)
    }

    /// Run the converter with its fixed argument set and wait for it to exit
    async fn run_converter(&self, source: &Path, output: &Path) -> Result<(), ConversionError> {
        let mut command = Command::new(&self.program);
        command
            .args(converter_args(source, output))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("Running {:?}", command);

        let result = command
            .output()
            .await
            .map_err(|e| ConversionError::Launch {
                program: self.program.clone(),
                source: e,
            })?;

        let stderr = String::from_utf8_lossy(&result.stderr);
        if !stderr.trim().is_empty() {
            tracing::debug!("{} stderr: {}", self.program, stderr.trim());
        }

        if !result.status.success() {
            return Err(ConversionError::TranscodeFailed {
                program: self.program.clone(),
                status: result.status,
                stderr: tail(&stderr, 10),
            });
        }

        Ok(())
    }
}

/// Audio-only extraction: MP3 (libmp3lame), stereo, 160 kbps, 48 kHz
pub fn converter_args(source: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(source.as_os_str().to_owned());
    args.extend(
        [
            "-vn",
            "-acodec",
            "libmp3lame",
            "-ac",
            "2",
            "-ab",
            "160k",
            "-ar",
            "48000",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args.push(output.as_os_str().to_owned());
    args
}

fn validate_source(source: &Path) -> Result<(), ConversionError> {
    if !source.exists() {
        return Err(ConversionError::MissingSource(source.to_path_buf()));
    }

    let is_mp4 = source
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION));

    if !is_mp4 {
        return Err(ConversionError::WrongType(source.to_path_buf()));
    }

    Ok(())
}

fn prepare_output_dir(output_dir: Option<&Path>) -> Result<PathBuf, ConversionError> {
    match output_dir {
        None => std::env::current_dir().map_err(|source| ConversionError::OutputDir {
            path: PathBuf::from("."),
            source,
        }),
        Some(dir) => {
            if !dir.exists() {
                fs_err::create_dir_all(dir).map_err(|source| ConversionError::OutputDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
            Ok(dir.to_path_buf())
        }
    }
}

/// Same base name as `source` with the audio extension, placed in `output_dir`
fn audio_path_for(source: &Path, output_dir: &Path) -> PathBuf {
    let mut name = source
        .file_stem()
        .unwrap_or(source.as_os_str())
        .to_os_string();
    name.push(".");
    name.push(AUDIO_EXTENSION);
    output_dir.join(name)
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim().lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
