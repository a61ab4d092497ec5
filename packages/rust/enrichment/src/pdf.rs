//! Transient PDF handling: download, first-page text, cleanup.

use std::path::{Path, PathBuf};

use arxivdigest_shared::{DigestError, Result};
use reqwest::Client;
use tracing::{debug, warn};

/// Sentinel passed to the model when the document has no pages.
const EMPTY_PDF_TEXT: &str = "PDF has no pages";

const TRUNCATION_SUFFIX: &str = "\n\n[... content truncated for LLM context window ...]";

/// Download a PDF into `temp_dir` as `<file_stem>.pdf` and return its path.
pub(crate) async fn download_pdf(
    client: &Client,
    url: &str,
    temp_dir: &Path,
    file_stem: &str,
) -> Result<PathBuf> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| DigestError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DigestError::Network(format!("{url}: HTTP {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DigestError::Network(format!("{url}: failed to read body: {e}")))?;

    std::fs::create_dir_all(temp_dir).map_err(|e| DigestError::io(temp_dir, e))?;
    let path = temp_dir.join(format!("{file_stem}.pdf"));
    std::fs::write(&path, &bytes).map_err(|e| DigestError::io(&path, e))?;

    debug!(path = %path.display(), bytes = bytes.len(), "pdf downloaded");
    Ok(path)
}

/// Text of the first page, bounded to `max_chars` characters.
///
/// Extraction problems do not fail the record: an unreadable or empty file
/// yields a sentinel string, and the model works from title and abstract.
pub(crate) fn first_page_text(path: &Path, max_chars: usize) -> String {
    match pdf_extract::extract_text_by_pages(path) {
        Ok(pages) => match pages.first() {
            Some(first) => truncate_text(first, max_chars),
            None => EMPTY_PDF_TEXT.to_string(),
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "pdf text extraction failed");
            format!("PDF text extraction failed: {e}")
        }
    }
}

/// Remove a transient download, ignoring failures.
pub(crate) fn cleanup_artifact(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        debug!(path = %path.display(), error = %e, "failed to remove temp pdf");
    }
}

/// Cut `text` at a character boundary and mark the cut.
fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{TRUNCATION_SUFFIX}", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("arxivdigest-test-{}", Uuid::now_v7()))
    }

    #[tokio::test]
    async fn download_writes_pdf_to_temp_dir() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/pdf/2511.00123"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 stub".to_vec()))
            .mount(&server)
            .await;

        let dir = temp_dir();
        let client = Client::new();
        let url = format!("{}/pdf/2511.00123", server.uri());
        let path = download_pdf(&client, &url, &dir, "2511.00123")
            .await
            .unwrap();

        assert_eq!(path, dir.join("2511.00123.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 stub");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn download_rejects_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/pdf/2511.00404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = temp_dir();
        let client = Client::new();
        let url = format!("{}/pdf/2511.00404", server.uri());
        let err = download_pdf(&client, &url, &dir, "2511.00404")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(!dir.join("2511.00404.pdf").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unreadable_file_yields_sentinel_text() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("not-a-pdf.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let text = first_page_text(&path, 4096);
        assert!(text.starts_with("PDF text extraction failed:"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let short = truncate_text("brief", 100);
        assert_eq!(short, "brief");

        let long = truncate_text(&"a".repeat(500), 100);
        assert!(long.starts_with(&"a".repeat(100)));
        assert!(long.ends_with(TRUNCATION_SUFFIX));

        // Multi-byte input must not split a character.
        let accented = truncate_text(&"é".repeat(10), 4);
        assert!(accented.starts_with("éééé"));
        assert!(accented.ends_with(TRUNCATION_SUFFIX));
    }

    #[test]
    fn truncate_keeps_exact_length_input_intact() {
        let text = "x".repeat(64);
        assert_eq!(truncate_text(&text, 64), text);
    }
}
