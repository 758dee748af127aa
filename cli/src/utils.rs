use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::DateTime;
use examscan_business::FileDescriptor;

/// Build a descriptor for a local file. The bytes are read later, right
/// before the transfer.
pub async fn describe_file(path: &Path) -> Result<FileDescriptor> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let mime_type = mime_guess::from_path(path).first().map(|mime| mime.to_string());

    Ok(FileDescriptor::from_path(
        name,
        mime_type,
        path,
        Some(metadata.len()),
    ))
}

pub fn truncate(text: &str, max_len: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_len {
        return trimmed.to_owned();
    }
    let truncated: String = trimmed.chars().take(max_len.saturating_sub(1)).collect();
    format!("{truncated}…")
}

#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Render an ISO 8601 timestamp as `YYYY-MM-DD HH:MM`, or return it as is
/// when it does not parse.
pub fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.format("%Y-%m-%d %H:%M").to_string())
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|parsed| parsed.format("%Y-%m-%d %H:%M").to_string())
        })
        .unwrap_or_else(|_| raw.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("  short  ", 10), "short");
        assert_eq!(truncate("answer-sheet-final.pdf", 10), "answer-sh…");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("2025-03-01T10:00:00Z"), "2025-03-01 10:00");
        assert_eq!(format_timestamp("2025-03-01T10:00:00.123456"), "2025-03-01 10:00");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[tokio::test]
    async fn test_describe_file_guesses_mime_and_size() {
        let mut file = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .expect("create temp file");
        file.write_all(b"%PDF-1.7").expect("write temp file");

        let descriptor = describe_file(file.path()).await.expect("describe file");

        assert_eq!(descriptor.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(descriptor.size, Some(8));
        assert!(descriptor.name.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_describe_directory_fails() {
        let dir = tempfile::tempdir().expect("create temp dir");
        assert!(describe_file(dir.path()).await.is_err());
    }
}
