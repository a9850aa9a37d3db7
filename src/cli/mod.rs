use clap::{ArgGroup, CommandFactory, Parser};
use std::path::PathBuf;

use crate::pipeline::Job;

#[derive(Parser, Debug)]
#[command(
    name = "video-dl",
    about = "Download video from a webpage and optionally convert it to MP3.",
    version,
    long_about = "Downloads the video embedded in one or more web pages, or in every page listed on a series page. Videos can be converted to MP3 with ffmpeg, in which case the video file is removed afterwards."
)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(true)
        .args(["url", "series"])
))]
pub struct Cli {
    /// URL(s) of the webpage containing the video to be downloaded
    #[arg(short, long, value_name = "URL", num_args = 1..)]
    pub url: Vec<String>,

    /// URL(s) of the webpages containing a series of videos to be downloaded
    #[arg(short, long, value_name = "URL", num_args = 1..)]
    pub series: Vec<String>,

    /// Desired name(s) for the downloaded video files, paired with --url in order.
    /// Unpaired URLs use the source link's basename
    #[arg(short, long, value_name = "NAME", num_args = 0..)]
    pub output: Vec<String>,

    /// Directory where the output files will be saved
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Convert the downloaded MP4 files to MP3 audio
    #[arg(short, long)]
    pub audio: bool,

    /// Show a progress bar during video download
    #[arg(short, long = "progress-bar")]
    pub progress_bar: bool,

    /// Converter program used for --audio
    #[arg(long, value_name = "PROGRAM", env = "VIDEO_DL_CONVERTER")]
    pub converter: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Checks clap cannot express on its own
    pub fn validate(&self) -> Result<(), clap::Error> {
        if self.output.len() > self.url.len() {
            return Err(Self::command().error(
                clap::error::ErrorKind::TooManyValues,
                "The number of specified output file names exceeds the number of input URLs provided.",
            ));
        }
        Ok(())
    }

    /// Turn the parsed arguments into a job for the pipeline
    pub fn job(&self) -> Job {
        Job {
            urls: self.url.clone(),
            series: self.series.clone(),
            outputs: self.output.clone(),
            directory: self.directory.clone(),
            audio: self.audio,
            progress: self.progress_bar,
        }
    }
}
