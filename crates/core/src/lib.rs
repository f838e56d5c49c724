pub mod chunking;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod store;
pub mod vectorizer;

#[cfg(test)]
pub(crate) mod test_pdf;

pub use chunking::{chunk_text, ChunkingConfig, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
pub use error::{IngestError, QueryError};
pub use extractor::{extract_page_texts, extract_text, PageText};
pub use generator::{AnswerGenerator, GeminiGenerator, DEFAULT_GENERATION_TIMEOUT};
pub use ingest::{digest_file, discover_pdf_files, extract_document_chunks};
pub use models::{
    Chunk, DocumentRecord, IndexStats, IngestReport, IngestStatus, QueryOutcome, ScoredChunk,
};
pub use orchestrator::{
    build_prompt, QueryEngine, DEFAULT_TOP_K, GENERATOR_FALLBACK_ANSWER, NO_CONTEXT_ANSWER,
};
pub use store::IndexStore;
pub use vectorizer::{cosine, TermVector, TfidfVectorizer};
