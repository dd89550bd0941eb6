//! Workspace umbrella crate for Vitrine, the retrieval-augmented product
//! search backend.
//!
//! The member crates each own one external boundary (chat model, embedding
//! model, search engine, object storage); this crate stitches them into the
//! assist pipeline: optional image caption → query generation → concurrent
//! retrieval → grounded reply.

pub mod config;
pub mod prompts;

pub use catalog::{
    load_products, CatalogConfig, CatalogError, ChatTranscript, ChatTurn, LoadReport,
    ProductRecord, Role,
};
pub use embedding::{Embedder, Embedding, EmbeddingConfig, EmbeddingError};
pub use llm::{extract_string_list, ChatMessage, LlmClient, LlmConfig, LlmError};
pub use retrieval::{
    summarize_for_grounding, RetrievalConfig, RetrievalError, Retriever, TermResults,
};
pub use search::{IndexedProduct, SearchClient, SearchConfig, SearchError, SearchHit};
pub use storage::{PresignedUpload, StorageClient, StorageConfig, StorageError};

pub use config::PipelineConfig;

use std::future::Future;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

/// Image context used when the request carries no image.
pub const NO_IMAGE_CONTEXT: &str = "No image provided";

/// Errors from the assist pipeline, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("image caption stage failed: {0}")]
    Caption(#[source] LlmError),

    #[error("query generation stage failed: {0}")]
    QueryGen(#[source] LlmError),

    #[error("retrieval stage failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("reply generation stage failed: {0}")]
    Generation(#[source] LlmError),

    #[error("storage stage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("pipeline configuration error: {0}")]
    Config(String),
}

/// Pipeline stages, as seen by metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Caption,
    QueryGen,
    Retrieval,
    Generation,
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_stage(&self, stage: PipelineStage, latency: Duration, success: bool);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("pipeline metrics lock poisoned");
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn finish(self, stage: PipelineStage, success: bool) {
        self.recorder
            .record_stage(stage, self.start.elapsed(), success);
    }
}

/// Run one stage under the metrics recorder.
async fn observed<T, F>(stage: PipelineStage, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    let span = MetricsSpan::start();
    let result = fut.await;
    if let Some(span) = span {
        span.finish(stage, result.is_ok());
    }
    result
}

/// The clients the pipeline runs against.
///
/// Storage is optional: a deployment without image upload still serves the
/// text-only flows, and requests that name an object key fail with a typed
/// error instead of a panic.
#[derive(Clone)]
pub struct PipelineDeps {
    pub llm: LlmClient,
    pub retriever: Retriever,
    pub storage: Option<StorageClient>,
}

impl PipelineDeps {
    /// Build every client from a pipeline config.
    pub fn from_config(cfg: &PipelineConfig) -> Result<Self, PipelineError> {
        let llm = LlmClient::new(cfg.llm.clone())
            .map_err(|e| PipelineError::Config(format!("llm client: {e}")))?;
        let embedder = Embedder::new(cfg.embedding.clone())
            .map_err(|e| PipelineError::Config(format!("embedding client: {e}")))?;
        let search = SearchClient::new(cfg.search.clone())
            .map_err(|e| PipelineError::Config(format!("search client: {e}")))?;
        let retriever = Retriever::new(embedder, search, cfg.retrieval)
            .map_err(|e| PipelineError::Config(format!("retriever: {e}")))?;
        let storage = match &cfg.storage {
            Some(storage_cfg) => Some(
                StorageClient::new(storage_cfg.clone())
                    .map_err(|e| PipelineError::Config(format!("storage client: {e}")))?,
            ),
            None => None,
        };
        Ok(Self {
            llm,
            retriever,
            storage,
        })
    }
}

/// Everything the assist flow produced, for the response body.
#[derive(Debug, Clone, Serialize)]
pub struct AssistOutcome {
    /// Vision caption of the uploaded image, when one was provided.
    pub caption: Option<String>,
    pub queries: Vec<String>,
    pub results: Vec<TermResults>,
    pub reply: String,
}

/// Turn the conversation (plus image context) into catalog search queries.
///
/// An empty list is a valid outcome: the customer has not mentioned any
/// product yet.
pub async fn generate_queries(
    llm: &LlmClient,
    transcript: &ChatTranscript,
    image_context: &str,
) -> Result<Vec<String>, PipelineError> {
    observed(PipelineStage::QueryGen, async {
        let prompt = prompts::query_generation(&transcript.render(), image_context);
        let reply = llm
            .chat(&[ChatMessage::user(prompt)])
            .await
            .map_err(PipelineError::QueryGen)?;
        let queries = extract_string_list(&reply).map_err(PipelineError::QueryGen)?;
        tracing::debug!(count = queries.len(), "search queries generated");
        Ok(queries)
    })
    .await
}

/// Download an uploaded image and caption it with the vision model.
pub async fn caption_image(
    llm: &LlmClient,
    storage: &StorageClient,
    object_key: &str,
) -> Result<String, PipelineError> {
    observed(PipelineStage::Caption, async {
        let bytes = storage.download(object_key).await?;
        let mime = mime_for_key(object_key);
        llm.caption_image(prompts::CAPTION_PROMPT, &bytes, mime)
            .await
            .map_err(PipelineError::Caption)
    })
    .await
}

/// Run the bounded concurrent retrieval fan-out for a set of query terms.
pub async fn retrieve_results(
    retriever: &Retriever,
    queries: &[String],
) -> Result<Vec<TermResults>, PipelineError> {
    observed(PipelineStage::Retrieval, async {
        retriever.retrieve_many(queries).await.map_err(Into::into)
    })
    .await
}

/// Answer the customer's question from the retrieved product reference.
///
/// An empty reference short-circuits to a canned greeting without spending a
/// model call.
pub async fn grounded_reply(
    llm: &LlmClient,
    question: &str,
    reference: &str,
) -> Result<String, PipelineError> {
    observed(PipelineStage::Generation, async {
        if reference_is_empty(reference) {
            return Ok(prompts::EMPTY_REFERENCE_REPLY.to_string());
        }
        let messages = [
            ChatMessage::system(prompts::GROUNDED_SYSTEM_PROMPT),
            ChatMessage::user(prompts::grounded_user(question, reference)),
        ];
        llm.chat(&messages).await.map_err(PipelineError::Generation)
    })
    .await
}

/// "Complete the look": suggest complementary catalog queries.
pub async fn style_suggestions(
    llm: &LlmClient,
    transcript: &ChatTranscript,
    image_context: &str,
) -> Result<Vec<String>, PipelineError> {
    observed(PipelineStage::Generation, async {
        let prompt = prompts::style_suggestions(&transcript.render(), image_context);
        let reply = llm
            .chat(&[ChatMessage::user(prompt)])
            .await
            .map_err(PipelineError::Generation)?;
        extract_string_list(&reply).map_err(PipelineError::Generation)
    })
    .await
}

/// The full assist flow.
///
/// With no image, the caption stage is skipped and query generation sees
/// [`NO_IMAGE_CONTEXT`]. Query generation returning an empty list skips
/// retrieval and grounds the reply on an empty reference.
pub async fn assist(
    deps: &PipelineDeps,
    transcript: &ChatTranscript,
    object_key: Option<&str>,
) -> Result<AssistOutcome, PipelineError> {
    let caption = match object_key {
        Some(key) => {
            let storage = deps.storage.as_ref().ok_or_else(|| {
                PipelineError::Config("object storage is not configured".into())
            })?;
            Some(caption_image(&deps.llm, storage, key).await?)
        }
        None => None,
    };
    let image_context = caption.as_deref().unwrap_or(NO_IMAGE_CONTEXT);

    let queries = generate_queries(&deps.llm, transcript, image_context).await?;
    let results = retrieve_results(&deps.retriever, &queries).await?;

    let reference = summarize_for_grounding(&results);
    let question = transcript.latest_user().unwrap_or_default();
    let reply = grounded_reply(&deps.llm, question, &reference).await?;

    Ok(AssistOutcome {
        caption,
        queries,
        results,
        reply,
    })
}

fn reference_is_empty(reference: &str) -> bool {
    let trimmed = reference.trim();
    trimmed.is_empty() || trimmed == "[]"
}

fn mime_for_key(key: &str) -> &'static str {
    let lower = key.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else {
        "image/jpeg"
    }
}
