use anyhow::Result;
use axum::{extract::{Path, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use essay_core::cache::{CacheStats, MemoryStore, ResultCache};
use essay_core::persist::{load_index, save_index, StorePaths};
use essay_core::{DocId, FrequencyIndex, MorphNormalizer, ScoreError, Strategy, Summarizer, SummarizerConfig};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

type ApiError = (StatusCode, String);

#[derive(Serialize)]
pub struct DocumentEntry {
    pub doc_id: DocId,
    pub title: String,
    pub chars: usize,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub doc_id: DocId,
    pub title: String,
    pub strategy: Strategy,
    pub summary: String,
    pub keywords: Vec<String>,
    pub took_s: f64,
}

#[derive(Serialize)]
pub struct SentenceEntry {
    pub index: usize,
    pub text: String,
    pub score: f64,
    pub posd: Option<f64>,
    pub posp: Option<f64>,
}

#[derive(Serialize)]
pub struct ScoresResponse {
    pub doc_id: DocId,
    pub title: String,
    pub sentences: Vec<SentenceEntry>,
}

#[derive(Deserialize)]
pub struct UploadDoc {
    pub title: String,
    pub text: String,
}

#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<RwLock<Summarizer>>,
    pub store_root: PathBuf,
    pub admin_token: Option<String>,
}

/// Open (or start) the store at `store_dir` and build the router around it.
pub fn build_app(store_dir: impl Into<PathBuf>, config: SummarizerConfig) -> Result<Router> {
    let store_root = store_dir.into();
    let paths = StorePaths::new(&store_root);
    let normalizer = Arc::new(MorphNormalizer::new());
    let cache = ResultCache::new(MemoryStore::new(), config.cache_ttl());
    let index = if paths.exists() { load_index(&paths, normalizer, cache)? } else { FrequencyIndex::new(normalizer, cache) };
    tracing::info!(store = %store_root.display(), num_docs = index.docs_count(), "store opened");

    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState { summarizer: Arc::new(RwLock::new(Summarizer::from_index(config, index))), store_root, admin_token };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/stats", get(stats_handler))
        .route("/documents", get(documents_handler))
        .route("/document/:doc_id/:strategy", get(summary_handler))
        .route("/scores/:doc_id", get(scores_handler))
        .route("/upload", post(upload_handler))
        .route("/index/commit", post(commit_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

fn status_of(err: &ScoreError) -> StatusCode {
    match err {
        ScoreError::UnknownDocument(_) => StatusCode::NOT_FOUND,
        ScoreError::UnknownStrategy(_) | ScoreError::TooLong { .. } => StatusCode::BAD_REQUEST,
        ScoreError::DuplicateTitle(_) => StatusCode::CONFLICT,
        ScoreError::EmptyDocument { .. }
        | ScoreError::EmptyCorpus
        | ScoreError::TermNotInCorpus { .. }
        | ScoreError::UndefinedPosition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn reject(err: ScoreError) -> ApiError {
    let status = status_of(&err);
    if status != StatusCode::NOT_FOUND {
        tracing::warn!(error = %err, "request failed");
    }
    (status, err.to_string())
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.summarizer.read().index().cache().stats())
}

pub async fn documents_handler(State(state): State<AppState>) -> Json<Vec<DocumentEntry>> {
    let summarizer = state.summarizer.read();
    let docs = summarizer
        .index()
        .documents()
        .map(|d| DocumentEntry { doc_id: d.id, title: d.title.clone(), chars: d.text.chars().count() })
        .collect();
    Json(docs)
}

/// Scoring is CPU-bound; run it on the blocking pool instead of an executor thread.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("scoring task failed: {e}")))?
}

pub async fn summary_handler(State(state): State<AppState>, Path((doc_id, strategy)): Path<(DocId, String)>) -> Result<Json<SummaryResponse>, ApiError> {
    let start = std::time::Instant::now();
    let strategy: Strategy = strategy.parse().map_err(reject)?;
    let shared = state.summarizer.clone();
    run_blocking(move || {
        let summarizer = shared.read();
        let doc = summarizer.index().document(doc_id).map_err(reject)?;
        let summary = summarizer.summarize(doc_id, strategy).map_err(reject)?;
        let keywords = summarizer.keywords(doc_id, summarizer.config().keyword_count).map_err(reject)?;
        Ok(Json(SummaryResponse { doc_id, title: doc.title.clone(), strategy, summary, keywords, took_s: start.elapsed().as_secs_f64() }))
    })
    .await
}

pub async fn scores_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<ScoresResponse>, ApiError> {
    let shared = state.summarizer.clone();
    run_blocking(move || {
        let summarizer = shared.read();
        let doc = summarizer.index().document(doc_id).map_err(reject)?;
        let scores = summarizer.sentence_scores(doc_id).map_err(reject)?;
        let sentences = scores
            .iter()
            .map(|s| SentenceEntry {
                index: s.index,
                text: s.text.clone(),
                score: s.score,
                posd: essay_core::sentence::posd(&s.text, &doc.text).ok(),
                posp: essay_core::sentence::posp(&s.text, &doc.text).ok(),
            })
            .collect();
        Ok(Json(ScoresResponse { doc_id, title: doc.title.clone(), sentences }))
    })
    .await
}

// --- Admin endpoints ---
async fn upload_handler(State(state): State<AppState>, headers: HeaderMap, Json(docs): Json<Vec<UploadDoc>>) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let ids = state.summarizer.write().add_documents(docs.into_iter().map(|d| (d.title, d.text))).map_err(reject)?;
    tracing::info!(added = ids.len(), "documents uploaded");
    Ok(Json(serde_json::json!({ "doc_ids": ids })))
}

async fn commit_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let summarizer = state.summarizer.read();
    save_index(&StorePaths::new(&state.store_root), summarizer.index())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    Ok(Json(serde_json::json!({ "num_docs": summarizer.index().docs_count() })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
