//! PDF text extraction

use crate::crawler::fetcher::FetchError;
use crate::crawler::parser::clean_text;

/// Extracts whitespace-normalized text from an in-memory PDF
///
/// Extraction is CPU bound and may panic on malformed input, so it runs on a
/// blocking thread; both a panic and a parse failure surface as
/// [`FetchError::Extraction`].
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, FetchError> {
    let raw = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| FetchError::Extraction(format!("extraction task failed: {}", e)))?
        .map_err(|e| FetchError::Extraction(e.to_string()))?;

    Ok(clean_text(&raw))
}
