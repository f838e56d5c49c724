use crate::error::IngestError;
use lopdf::Document;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

pub fn extract_page_texts(path: &Path) -> Result<Vec<PageText>, IngestError> {
    let document = Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_no])
            .map_err(|error| IngestError::PdfParse(error.to_string()))?;

        if !text.trim().is_empty() {
            pages.push(PageText {
                number: page_no,
                text,
            });
        }
    }

    Ok(pages)
}

/// Extracts a document's full text, pages joined by a newline in page order.
///
/// An unreadable or corrupt file yields an empty string rather than an error
/// so that one bad document never aborts a batch ingestion; the failure is
/// logged and the caller skips the document.
pub fn extract_text(path: &Path) -> String {
    match extract_page_texts(path) {
        Ok(pages) => pages
            .iter()
            .map(|page| page.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        Err(error) => {
            warn!(path = %path.display(), %error, "pdf extraction failed");
            String::new()
        }
    }
}

/// Page count for document metadata; 0 when the file is unreadable.
pub fn count_pages(path: &Path) -> usize {
    Document::load(path)
        .map(|document| document.get_pages().len())
        .unwrap_or(0)
}
