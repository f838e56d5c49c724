use crate::chunking::ChunkingConfig;
use crate::error::IngestError;
use crate::ingest::{discover_pdf_files, extract_document_chunks};
use crate::models::{Chunk, DocumentRecord, IndexStats, IngestReport, ScoredChunk};
use crate::vectorizer::{cosine, TermVector, TfidfVectorizer};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

const CHUNKS_FILE: &str = "chunks.json";
const VECTORS_FILE: &str = "vectors.json";

/// Chunk metadata artifact: the ordered chunk list plus per-document records.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ChunkArtifact {
    chunks: Vec<Chunk>,
    documents: Vec<DocumentRecord>,
}

/// Vector artifact: the fitted vectorizer plus one sparse row per chunk.
/// Only meaningful together with the chunk artifact it was written with.
#[derive(Debug, Default, Serialize, Deserialize)]
struct VectorArtifact {
    vectorizer: TfidfVectorizer,
    rows: Vec<TermVector>,
}

/// One consistent generation of the index. Immutable once built; a rebuild
/// produces a fresh snapshot and swaps it in, so concurrent readers keep
/// scoring against the generation they started with.
#[derive(Debug, Default)]
struct IndexSnapshot {
    chunks: Vec<Chunk>,
    documents: Vec<DocumentRecord>,
    vectorizer: TfidfVectorizer,
    rows: Vec<TermVector>,
}

/// The persisted, searchable chunk index.
///
/// `ingest_dir` rebuilds the whole index from the directory's current
/// contents (full-rebuild policy), persists it, and atomically swaps the
/// in-memory snapshot. `search` is lock-free beyond a brief read of the
/// current snapshot handle.
pub struct IndexStore {
    dir: PathBuf,
    state: RwLock<Arc<IndexSnapshot>>,
    // Serializes rebuilds; readers are never blocked by an in-flight ingest.
    ingest_lock: Mutex<()>,
}

impl IndexStore {
    /// Opens the index rooted at `dir`, loading a prior persisted copy when
    /// one exists. Exactly one of the two artifacts present is an
    /// inconsistent state and refuses to load.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, IngestError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let chunks_path = dir.join(CHUNKS_FILE);
        let vectors_path = dir.join(VECTORS_FILE);

        let snapshot = match (chunks_path.exists(), vectors_path.exists()) {
            (false, false) => IndexSnapshot::default(),
            (true, true) => {
                let chunk_artifact: ChunkArtifact =
                    serde_json::from_slice(&fs::read(&chunks_path)?)?;
                let vector_artifact: VectorArtifact =
                    serde_json::from_slice(&fs::read(&vectors_path)?)?;

                if chunk_artifact.chunks.len() != vector_artifact.rows.len() {
                    return Err(IngestError::InconsistentIndex(format!(
                        "{} chunks but {} vector rows in {}",
                        chunk_artifact.chunks.len(),
                        vector_artifact.rows.len(),
                        dir.display()
                    )));
                }

                info!(
                    chunks = chunk_artifact.chunks.len(),
                    documents = chunk_artifact.documents.len(),
                    dir = %dir.display(),
                    "loaded persisted index"
                );

                IndexSnapshot {
                    chunks: chunk_artifact.chunks,
                    documents: chunk_artifact.documents,
                    vectorizer: vector_artifact.vectorizer,
                    rows: vector_artifact.rows,
                }
            }
            (have_chunks, _) => {
                let missing = if have_chunks { VECTORS_FILE } else { CHUNKS_FILE };
                return Err(IngestError::InconsistentIndex(format!(
                    "{} is missing from {}",
                    missing,
                    dir.display()
                )));
            }
        };

        Ok(Self {
            dir,
            state: RwLock::new(Arc::new(snapshot)),
            ingest_lock: Mutex::new(()),
        })
    }

    /// Rebuilds the index from every PDF directly inside `pdf_dir`.
    ///
    /// Extraction failures and empty documents are skipped with a warning;
    /// a persistence failure fails the whole ingest and leaves the previous
    /// index generation live, in memory and on disk.
    pub fn ingest_dir(&self, pdf_dir: &Path, config: ChunkingConfig) -> IngestReport {
        let _guard = match self.ingest_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Err(error) = config.validate() {
            return IngestReport::error(error.to_string());
        }

        if !pdf_dir.exists() {
            return match fs::create_dir_all(pdf_dir) {
                Ok(()) => IngestReport::error(format!(
                    "PDF directory {} created but empty",
                    pdf_dir.display()
                )),
                Err(error) => IngestReport::error(format!(
                    "PDF directory {} could not be created: {error}",
                    pdf_dir.display()
                )),
            };
        }

        let files = discover_pdf_files(pdf_dir);
        if files.is_empty() {
            return IngestReport::warning(format!("No PDF files found in {}", pdf_dir.display()));
        }

        let mut chunks = Vec::new();
        let mut documents = Vec::new();
        let mut skipped = 0usize;

        for path in &files {
            match extract_document_chunks(path, config) {
                Ok(Some(document)) => {
                    chunks.extend(document.chunks);
                    documents.push(document.record);
                }
                Ok(None) => {
                    warn!(path = %path.display(), "document yielded no text, skipping");
                    skipped += 1;
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "document failed, skipping");
                    skipped += 1;
                }
            }
        }

        if chunks.is_empty() {
            return IngestReport::warning(format!(
                "All {} document(s) in {} were skipped",
                files.len(),
                pdf_dir.display()
            ));
        }

        let corpus: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectorizer = TfidfVectorizer::fit(&corpus);
        let rows: Vec<TermVector> = corpus
            .iter()
            .map(|text| vectorizer.transform(text))
            .collect();

        let snapshot = IndexSnapshot {
            chunks,
            documents,
            vectorizer,
            rows,
        };

        if let Err(error) = self.persist(&snapshot) {
            return IngestReport::error(format!("index persistence failed: {error}"));
        }

        let count = snapshot.chunks.len();
        let document_count = snapshot.documents.len();
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        *state = Arc::new(snapshot);
        drop(state);

        info!(
            documents = document_count,
            chunks = count,
            skipped,
            dir = %pdf_dir.display(),
            "index rebuilt"
        );

        let mut message = format!("Ingested {document_count} PDF(s)");
        if skipped > 0 {
            message.push_str(&format!(", skipped {skipped}"));
        }
        IngestReport::success(message, count)
    }

    /// Ranks the `top_k` chunks most similar to `query_text`. An empty
    /// index or a query sharing no vocabulary with it yields an empty
    /// result, never an error. Only strictly positive scores are returned;
    /// ties break by insertion order, lowest row first.
    pub fn search(&self, query_text: &str, top_k: usize) -> Vec<ScoredChunk> {
        let snapshot = self.snapshot();
        if snapshot.chunks.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let query_vector = snapshot.vectorizer.transform(query_text);
        if query_vector.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = snapshot
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| (index, cosine(&query_vector, row)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|left, right| {
            right
                .1
                .total_cmp(&left.1)
                .then_with(|| left.0.cmp(&right.0))
        });

        scored
            .into_iter()
            .take(top_k)
            .map(|(index, score)| ScoredChunk {
                chunk: snapshot.chunks[index].clone(),
                score,
            })
            .collect()
    }

    /// Discards the in-memory index and removes the persisted artifacts.
    /// A no-op when nothing has been persisted yet.
    pub fn clear(&self) -> Result<(), IngestError> {
        let _guard = match self.ingest_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        for file in [CHUNKS_FILE, VECTORS_FILE] {
            let path = self.dir.join(file);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => return Err(error.into()),
            }
        }

        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        *state = Arc::new(IndexSnapshot::default());
        Ok(())
    }

    pub fn stats(&self) -> IndexStats {
        let snapshot = self.snapshot();
        IndexStats {
            total_chunks: snapshot.chunks.len(),
            document_count: snapshot.documents.len(),
        }
    }

    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.snapshot().documents.clone()
    }

    fn snapshot(&self) -> Arc<IndexSnapshot> {
        match self.state.read() {
            Ok(state) => Arc::clone(&state),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Writes both artifacts with a temp-file-then-rename so a reload never
    /// observes a half-written index.
    fn persist(&self, snapshot: &IndexSnapshot) -> Result<(), IngestError> {
        let chunk_artifact = ChunkArtifact {
            chunks: snapshot.chunks.clone(),
            documents: snapshot.documents.clone(),
        };
        let vector_artifact = VectorArtifact {
            vectorizer: snapshot.vectorizer.clone(),
            rows: snapshot.rows.clone(),
        };

        write_artifact(&self.dir.join(CHUNKS_FILE), &chunk_artifact)?;
        write_artifact(&self.dir.join(VECTORS_FILE), &vector_artifact)?;
        Ok(())
    }
}

fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<(), IngestError> {
    let json = serde_json::to_string(value)
        .map_err(|error| IngestError::Persist(format!("encode {}: {error}", path.display())))?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json.as_bytes())
        .map_err(|error| IngestError::Persist(format!("write {}: {error}", tmp.display())))?;
    fs::rename(&tmp, path).map_err(|error| {
        IngestError::Persist(format!(
            "rename {} to {}: {error}",
            tmp.display(),
            path.display()
        ))
    })?;
    Ok(())
}
