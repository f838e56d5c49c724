use crate::generator::AnswerGenerator;
use crate::models::QueryOutcome;
use crate::store::IndexStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_TOP_K: usize = 3;

/// Answer given when retrieval finds no grounding context.
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant information in the knowledge base. \
     Please make sure documents have been ingested.";

/// Answer substituted when the hosted generator fails in any way.
pub const GENERATOR_FALLBACK_ANSWER: &str =
    "Sorry, I couldn't generate an answer right now. Please try again in a moment.";

/// Composes retrieval and answer generation into the single `query`
/// entry point consumed by every front-end adapter.
pub struct QueryEngine<G: AnswerGenerator> {
    store: Arc<IndexStore>,
    generator: G,
    top_k: usize,
}

impl<G> QueryEngine<G>
where
    G: AnswerGenerator + Send + Sync,
{
    pub fn new(store: Arc<IndexStore>, generator: G) -> Self {
        Self {
            store,
            generator,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// The text of the `top_k` chunks most similar to `question`, in rank
    /// order. Empty when the index is empty or nothing scores above zero;
    /// that is a normal outcome, not a failure.
    pub fn retrieve(&self, question: &str) -> Vec<String> {
        self.store
            .search(question, self.top_k)
            .into_iter()
            .map(|hit| hit.chunk.text)
            .collect()
    }

    /// Answers `question` from the indexed documents.
    ///
    /// Without context the generator is never called and a fixed
    /// no-information answer is returned. Generator failures are logged
    /// and replaced with a user-safe fallback; the retrieved context and
    /// its sources are reported either way. Every query terminates in an
    /// answered outcome.
    pub async fn query(&self, question: &str) -> QueryOutcome {
        // Retrieval holds the index lock; the generator call must not.
        let hits = self.store.search(question, self.top_k);

        if hits.is_empty() {
            return QueryOutcome {
                answer: NO_CONTEXT_ANSWER.to_string(),
                context: Vec::new(),
                sources: BTreeSet::new(),
            };
        }

        let context: Vec<String> = hits.iter().map(|hit| hit.chunk.text.clone()).collect();
        let sources: BTreeSet<String> = hits.iter().map(|hit| hit.chunk.source.clone()).collect();

        let prompt = build_prompt(question, &context);
        let answer = match self.generator.generate(&prompt).await {
            Ok(answer) => answer,
            Err(error) => {
                warn!(%error, "answer generation failed, using fallback");
                GENERATOR_FALLBACK_ANSWER.to_string()
            }
        };

        QueryOutcome {
            answer,
            context,
            sources,
        }
    }
}

/// Grounding prompt: the generator must answer only from the supplied
/// context and say so when the context is insufficient.
pub fn build_prompt(question: &str, context: &[String]) -> String {
    let context_text = context.join("\n\n");
    format!(
        "You are a helpful assistant answering questions based on the provided context.\n\n\
         Context:\n{context_text}\n\n\
         Question: {question}\n\n\
         Answer using only the context above. If the context doesn't contain \
         the relevant information, say so explicitly."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkingConfig;
    use crate::error::QueryError;
    use crate::test_pdf::write_pdf;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeGenerator {
        response: Result<String, QueryError>,
        calls: AtomicUsize,
    }

    impl FakeGenerator {
        fn answering(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: QueryError) -> Self {
            Self {
                response: Err(error),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnswerGenerator for &FakeGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(QueryError::GeneratorStatus(status)) => {
                    Err(QueryError::GeneratorStatus(*status))
                }
                Err(QueryError::MalformedResponse(reason)) => {
                    Err(QueryError::MalformedResponse(reason.clone()))
                }
                Err(_) => Err(QueryError::MalformedResponse("fake".to_string())),
            }
        }
    }

    fn cats_store(dir: &std::path::Path) -> Arc<IndexStore> {
        let pdf_dir = dir.join("docs");
        fs::create_dir(&pdf_dir).expect("tempdir is writable");
        write_pdf(&pdf_dir.join("cats.pdf"), "Topic: Cats. Cats are mammals.")
            .expect("test pdf should be written");

        let store = Arc::new(IndexStore::open(dir.join("index")).expect("index opens"));
        store.ingest_dir(&pdf_dir, ChunkingConfig::default());
        store
    }

    #[tokio::test]
    async fn empty_index_short_circuits_without_calling_the_generator() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(IndexStore::open(dir.path().join("index")).expect("index opens"));
        let generator = FakeGenerator::answering("should never be used");

        let engine = QueryEngine::new(store, &generator);
        let outcome = engine.query("anything").await;

        assert_eq!(outcome.answer, NO_CONTEXT_ANSWER);
        assert!(outcome.context.is_empty());
        assert!(outcome.sources.is_empty());
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn grounded_answer_carries_context_and_sources() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = cats_store(dir.path());
        let generator = FakeGenerator::answering("Cats are mammals.");

        let engine = QueryEngine::new(store, &generator);
        let outcome = engine.query("What are cats?").await;

        assert_eq!(outcome.answer, "Cats are mammals.");
        assert_eq!(outcome.context.len(), 1);
        assert!(outcome.context[0].contains("Cats are mammals"));
        assert_eq!(
            outcome.sources.iter().collect::<Vec<_>>(),
            vec!["cats.pdf"]
        );
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn generator_http_failure_yields_the_fallback_answer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = cats_store(dir.path());
        let generator = FakeGenerator::failing(QueryError::GeneratorStatus(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        ));

        let engine = QueryEngine::new(store, &generator);
        let outcome = engine.query("What are cats?").await;

        assert_eq!(outcome.answer, GENERATOR_FALLBACK_ANSWER);
        assert!(!outcome.answer.is_empty());
        assert_eq!(outcome.context.len(), 1);
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn vocabulary_miss_takes_the_no_context_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = cats_store(dir.path());
        let generator = FakeGenerator::answering("unused");

        let engine = QueryEngine::new(store, &generator);
        let outcome = engine.query("quantum chromodynamics").await;

        assert_eq!(outcome.answer, NO_CONTEXT_ANSWER);
        assert!(outcome.context.is_empty());
        assert_eq!(generator.call_count(), 0);
    }

    #[test]
    fn prompt_embeds_question_and_context() {
        let prompt = build_prompt("What are cats?", &["Cats are mammals.".to_string()]);
        assert!(prompt.contains("Question: What are cats?"));
        assert!(prompt.contains("Cats are mammals."));
        assert!(prompt.contains("only the context above"));
    }

    #[test]
    fn retrieve_projects_text_in_rank_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = cats_store(dir.path());
        let generator = FakeGenerator::answering("unused");

        let engine = QueryEngine::new(store, &generator);
        let context = engine.retrieve("What are cats?");
        assert_eq!(context.len(), 1);
        assert!(context[0].contains("mammals"));
    }
}
