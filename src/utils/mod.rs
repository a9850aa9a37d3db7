/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Check that the external tools a run needs are installed
pub async fn check_dependencies(converter: &str, audio: bool) -> Vec<String> {
    let mut missing = Vec::new();

    if audio && !check_command_available(converter).await {
        missing.push(format!("{} - required for MP3 conversion (--audio)", converter));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use std::process::Stdio;
    use tokio::process::Command;

    Command::new(command)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[tokio::test]
    async fn test_missing_converter_reported_only_for_audio() {
        let missing = check_dependencies("definitely-not-a-converter-xyz", true).await;
        assert_eq!(missing.len(), 1);
        assert!(missing[0].starts_with("definitely-not-a-converter-xyz"));

        assert!(check_dependencies("definitely-not-a-converter-xyz", false)
            .await
            .is_empty());
    }
}
