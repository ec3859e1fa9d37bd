// src/services/extract.rs

//! Plain-text extraction from downloaded documents.

use std::panic;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ExtractionError;

/// Run [`extract_text`] on the blocking pool, giving up after `timeout`.
///
/// A decoder that is still running when the deadline passes is left to
/// finish in the background; its result is discarded.
pub async fn extract_text_within(
    path: &Path,
    timeout: Duration,
) -> Result<String, ExtractionError> {
    run_with_deadline(path.to_path_buf(), timeout, extract_text).await
}

async fn run_with_deadline<F>(
    path: PathBuf,
    timeout: Duration,
    extract: F,
) -> Result<String, ExtractionError>
where
    F: FnOnce(&Path) -> Result<String, ExtractionError> + Send + 'static,
{
    let worker_path = path.clone();
    let task = tokio::task::spawn_blocking(move || extract(&worker_path));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(ExtractionError::new(&path, e)),
        Err(_) => Err(ExtractionError::new(
            &path,
            format!("extraction timed out after {}s", timeout.as_secs_f64()),
        )),
    }
}

/// Extract the text of every page, in page order.
///
/// Decoder failures, including panics inside the PDF parser on malformed
/// input, are reported as [`ExtractionError`]. A document with no text layer
/// yields an empty string and a warning.
pub fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractionError::new(path, e))?;

    let text = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
        .map_err(|_| ExtractionError::new(path, "PDF decoder panicked"))?
        .map_err(|e| ExtractionError::new(path, e))?;

    if text.trim().is_empty() {
        log::warn!("No extractable text in {}", path.display());
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = extract_text(&tmp.path().join("absent.pdf")).unwrap_err();
        assert!(err.path.ends_with("absent.pdf"));
    }

    #[test]
    fn test_corrupt_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.pdf");
        std::fs::write(&path, b"<html>not a pdf</html>").unwrap();

        let err = extract_text(&path).unwrap_err();
        assert_eq!(err.path, path);
    }

    #[tokio::test]
    async fn test_slow_decoder_times_out() {
        let path = PathBuf::from("slow.pdf");
        let err = run_with_deadline(path.clone(), Duration::from_millis(20), |_| {
            std::thread::sleep(Duration::from_millis(500));
            Ok("late".to_string())
        })
        .await
        .unwrap_err();

        assert_eq!(err.path, path);
        assert!(err.message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_within_deadline_returns_result() {
        let tmp = TempDir::new().unwrap();
        let err = extract_text_within(&tmp.path().join("absent.pdf"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(!err.message.contains("timed out"));
    }
}
