#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Stand-in for ffmpeg: writes its arguments, one per line, to the output file
pub const RECORDING_CONVERTER: &str = r#"for last; do :; done
printf '%s\n' "$@" > "$last"
"#;

/// Stand-in for ffmpeg that always fails
pub const FAILING_CONVERTER: &str = r#"echo "Unknown encoder 'libmp3lame'" >&2
exit 1
"#;

/// Write an executable shell script into `dir` and return its path
pub fn fake_converter(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-ffmpeg");
    fs_err::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// File names in `dir`, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs_err::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn video_page(src: &str) -> String {
    format!(
        r#"<html><body>
        <div class="workshop">
          <video controls><source src="{src}" type="video/mp4"></video>
        </div>
        </body></html>"#
    )
}
