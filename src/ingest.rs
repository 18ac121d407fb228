//! PDF text extraction for uploaded curricula
//!
//! Wraps the pdf-extract crate. Pages come back in document order; within a page
//! the extractor's text fragments are joined with single spaces, and every page
//! ends with one newline.

use crate::error::{Error, Result};

/// Extract per-page text from PDF bytes, page 1..N
pub fn page_texts(pdf_bytes: &[u8]) -> Result<Vec<String>> {
    if pdf_bytes.len() < 4 || &pdf_bytes[0..4] != b"%PDF" {
        return Err(Error::Pdf("not a PDF file (missing %PDF header)".to_string()));
    }

    let pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        .map_err(|e| Error::Pdf(e.to_string()))?;

    Ok(pages.iter().map(|page| join_fragments(page)).collect())
}

/// Join the non-empty fragments of one page with single spaces
pub fn join_fragments(page: &str) -> String {
    page.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Concatenate pages in order, each followed by a newline
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for page in pages {
        text.push_str(page.as_ref());
        text.push('\n');
    }
    text
}

/// Extract the full text of a PDF
pub fn extract_text(pdf_bytes: &[u8]) -> Result<String> {
    Ok(join_pages(page_texts(pdf_bytes)?))
}

/// Extract on the blocking pool; a panicking extractor is reported as a PDF error
pub async fn extract_text_async(pdf_bytes: Vec<u8>) -> Result<String> {
    tokio::task::spawn_blocking(move || extract_text(&pdf_bytes))
        .await
        .map_err(|e| Error::Pdf(format!("extraction aborted: {}", e)))?
}
