use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use mediasearch_core::document::parse_iso_date;
use mediasearch_core::pipeline::{clamp_page, clamp_page_size, DEFAULT_PAGE_SIZE};
use mediasearch_core::{
    load_corpus, AnalyticsRecorder, AnalyticsSnapshot, IndexOptions, InvertedIndex, MediaDocument, SearchFilters,
    SearchRequest, SearchService, SortMode,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    /// Parsed leniently, see `lenient_count`.
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub photographer: Option<String>,
    /// yyyy-mm-dd
    pub date_start: Option<String>,
    /// yyyy-mm-dd
    pub date_end: Option<String>,
    /// Comma-separated country codes.
    pub countries: Option<String>,
    #[serde(default)]
    pub sort: SortMode,
}

/// Paging values never fail a request: blank or non-numeric input gives `default`,
/// negatives give 0 and values too large for `usize` saturate. Clamping happens after.
fn lenient_count(value: Option<&str>, default: usize) -> usize {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return default,
    };
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return default;
    }
    if negative {
        return 0;
    }
    digits.parse().unwrap_or(usize::MAX)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaHit {
    pub id: String,
    pub search_text: String,
    pub photographer: String,
    pub date: String,
    pub date_iso: String,
    pub height: u32,
    pub width: u32,
    pub restrictions: Vec<String>,
    #[serde(rename = "_score", skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl MediaHit {
    fn new(doc: &MediaDocument, score: Option<f32>) -> Self {
        Self {
            id: doc.id.clone(),
            search_text: doc.search_text.clone(),
            photographer: doc.photographer.clone(),
            date: doc.date.clone(),
            date_iso: doc.date_iso.clone(),
            height: doc.height,
            width: doc.width,
            restrictions: doc.restrictions.iter().cloned().collect(),
            score,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub items: Vec<MediaHit>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub took_ms: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    pub num_docs: usize,
    pub rejected: usize,
}

/// Startup settings for the HTTP app.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub corpus: PathBuf,
    pub index: IndexOptions,
    pub admin_token: Option<String>,
    /// Comma-separated origins; any origin when unset.
    pub cors_allow_origin: Option<String>,
}

impl AppConfig {
    /// Read `ADMIN_TOKEN` and `CORS_ALLOW_ORIGIN` from the environment.
    pub fn from_env(corpus: impl Into<PathBuf>, index: IndexOptions) -> Self {
        Self {
            corpus: corpus.into(),
            index,
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
    pub analytics: Arc<AnalyticsRecorder>,
    pub corpus: PathBuf,
    pub index_options: IndexOptions,
    pub admin_token: Option<String>,
}

fn load_index(corpus: &std::path::Path, options: IndexOptions) -> Result<(InvertedIndex, usize)> {
    let corpus = load_corpus(corpus)?;
    let rejected = corpus.rejected;
    Ok((InvertedIndex::build_with(corpus.documents, options), rejected))
}

pub fn build_app(config: AppConfig) -> Result<Router> {
    // Build the index once before serving
    let (index, _) = load_index(&config.corpus, config.index)?;
    let analytics = Arc::new(AnalyticsRecorder::new());
    let service = Arc::new(SearchService::new(index, analytics.clone()));
    let app_state = AppState {
        service,
        analytics,
        corpus: config.corpus.clone(),
        index_options: config.index,
        admin_token: config.admin_token.clone(),
    };

    let cors = match &config.cors_allow_origin {
        Some(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/search", get(search_handler))
        .route("/api/analytics", get(analytics_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Photographer names compare exactly, so only an empty value is dropped.
fn present(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

fn parse_filters(params: &SearchParams) -> Result<SearchFilters, (StatusCode, String)> {
    let date = |v: &Option<String>| -> Result<_, (StatusCode, String)> {
        non_empty(v.clone())
            .map(|s| parse_iso_date(&s))
            .transpose()
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
    };
    let countries = non_empty(params.countries.clone()).map(|s| {
        s.split(',')
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect()
    });
    Ok(SearchFilters {
        photographer: present(params.photographer.clone()),
        date_start: date(&params.date_start)?,
        date_end: date(&params.date_end)?,
        countries,
    })
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let filters = parse_filters(&params)?;
    let request = SearchRequest {
        filters,
        sort: params.sort,
        page: clamp_page(lenient_count(params.page.as_deref(), 1)),
        page_size: clamp_page_size(lenient_count(params.page_size.as_deref(), DEFAULT_PAGE_SIZE)),
        query: params.q,
    };
    let outcome = state.service.search(&request);

    let items = outcome
        .page
        .items
        .iter()
        .filter_map(|c| outcome.index.document(c.doc_id).map(|d| MediaHit::new(d, Some(c.score))))
        .collect();
    Ok(Json(SearchResponse {
        items,
        page: outcome.page.page,
        page_size: outcome.page.page_size,
        total: outcome.page.total,
        total_pages: outcome.page.total_pages,
        took_ms: outcome.elapsed.as_secs_f64() * 1000.0,
    }))
}

pub async fn analytics_handler(State(state): State<AppState>) -> Json<AnalyticsSnapshot> {
    Json(state.analytics.snapshot())
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<u32>) -> Json<serde_json::Value> {
    let index = state.service.index();
    match index.document(doc_id) {
        Some(doc) => Json(serde_json::to_value(MediaHit::new(doc, None)).unwrap_or_default()),
        None => Json(serde_json::json!({ "error": "not found" })),
    }
}

// --- Admin endpoints ---
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<ReloadResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let corpus = state.corpus.clone();
    let options = state.index_options;
    let (index, rejected) = tokio::task::spawn_blocking(move || load_index(&corpus, options))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    let num_docs = index.num_docs();
    state.service.publish(index);
    Ok(Json(ReloadResponse { num_docs, rejected }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
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
