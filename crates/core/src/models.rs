use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The atomic indexed unit: a bounded slice of one document's text.
///
/// `chunk_id` is the zero-based position within its source document;
/// global identity is the pair `(source, chunk_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub chunk_id: u64,
}

/// Per-document ingestion metadata, kept for introspection and citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub source: String,
    pub checksum: String,
    pub page_count: usize,
    pub chunk_count: usize,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    Success,
    Warning,
    Error,
}

/// Outcome of a batch ingestion: status, human-readable message, and the
/// total chunk count indexed across all documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub status: IngestStatus,
    pub message: String,
    pub count: usize,
}

impl IngestReport {
    pub fn success(message: impl Into<String>, count: usize) -> Self {
        Self {
            status: IngestStatus::Success,
            message: message.into(),
            count,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            status: IngestStatus::Warning,
            message: message.into(),
            count: 0,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: IngestStatus::Error,
            message: message.into(),
            count: 0,
        }
    }
}

/// A search hit: the chunk plus its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// The answered query: generated (or fallback) answer text, the retrieved
/// context passages in rank order, and the distinct documents backing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub answer: String,
    pub context: Vec<String>,
    pub sources: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub document_count: usize,
}
