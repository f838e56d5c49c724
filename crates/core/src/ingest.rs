use crate::chunking::{chunk_text, ChunkingConfig};
use crate::error::IngestError;
use crate::extractor::{count_pages, extract_text};
use crate::models::{Chunk, DocumentRecord};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists the PDF files directly inside `folder`, sorted for determinism.
/// Enumeration is non-recursive; nested folders are ignored.
pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub struct DocumentChunks {
    pub record: DocumentRecord,
    pub chunks: Vec<Chunk>,
}

/// Extracts and chunks one document. Returns `Ok(None)` when the file
/// yields no text (corrupt or image-only PDF) so the batch can skip it.
pub fn extract_document_chunks(
    path: &Path,
    config: ChunkingConfig,
) -> Result<Option<DocumentChunks>, IngestError> {
    let source = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?
        .to_string();

    let text = extract_text(path);
    if text.trim().is_empty() {
        return Ok(None);
    }

    let chunks: Vec<Chunk> = chunk_text(&text, config)?
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| Chunk {
            text: chunk,
            source: source.clone(),
            chunk_id: index as u64,
        })
        .collect();

    let record = DocumentRecord {
        source,
        checksum: digest_file(path)?,
        page_count: count_pages(path),
        chunk_count: chunks.len(),
        ingested_at: Utc::now(),
    };

    Ok(Some(DocumentChunks { record, chunks }))
}

#[cfg(test)]
mod tests {
    use super::{digest_file, discover_pdf_files, extract_document_chunks};
    use crate::chunking::ChunkingConfig;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn discovery_is_non_recursive_and_sorted() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        File::create(base.join("b.pdf")).and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(base.join("a.PDF")).and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(base.join("notes.txt")).and_then(|mut file| file.write_all(b"text"))?;
        File::create(nested.join("c.pdf"))
            .and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;

        let files = discover_pdf_files(base);
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.PDF"));
        assert!(files[1].ends_with("b.pdf"));
        Ok(())
    }

    #[test]
    fn checksum_is_reproducible() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file_path = dir.path().join("a.pdf");
        fs::write(&file_path, b"abc")?;

        let first = digest_file(&file_path)?;
        let second = digest_file(&file_path)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn unreadable_pdf_is_skipped_not_failed() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\n%broken")?;

        let result = extract_document_chunks(&path, ChunkingConfig::default())?;
        assert!(result.is_none());
        Ok(())
    }

    #[test]
    fn chunk_ids_are_sequential_within_a_document() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("cats.pdf");
        crate::test_pdf::write_pdf(&path, "Topic: Cats. Cats are mammals.")?;

        let config = ChunkingConfig {
            chunk_size: 3,
            overlap: 1,
        };
        let document = extract_document_chunks(&path, config)?.expect("pdf should be readable");

        assert!(!document.chunks.is_empty());
        for (index, chunk) in document.chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_id, index as u64);
            assert_eq!(chunk.source, "cats.pdf");
        }
        assert_eq!(document.record.chunk_count, document.chunks.len());
        assert_eq!(document.record.page_count, 1);
        Ok(())
    }
}
