use crate::analytics::AnalyticsSink;
use crate::index::InvertedIndex;
use crate::pipeline::{self, paginate, ResultPage, SearchFilters, SortMode, DEFAULT_PAGE_SIZE};
use crate::query::ScoredCandidate;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub filters: SearchFilters,
    pub sort: SortMode,
    /// 1-based; clamped.
    pub page: usize,
    /// Clamped into `[1, MAX_PAGE_SIZE]`.
    pub page_size: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: SearchFilters::default(),
            sort: SortMode::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

pub struct SearchOutcome {
    pub page: ResultPage<ScoredCandidate>,
    /// The index the page was computed against; resolve `doc_id`s here.
    pub index: Arc<InvertedIndex>,
    pub elapsed: Duration,
}

/// Owns the current index and reports each search to an analytics sink.
///
/// The index lives behind a shared pointer that is replaced, never modified. A
/// search clones the pointer once and works on that snapshot, so a concurrent
/// [`SearchService::publish`] cannot expose a partially built index.
pub struct SearchService {
    index: RwLock<Arc<InvertedIndex>>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl SearchService {
    pub fn new(index: InvertedIndex, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { index: RwLock::new(Arc::new(index)), analytics }
    }

    pub fn index(&self) -> Arc<InvertedIndex> { self.index.read().clone() }

    /// Swap in a new index and return the previous one.
    pub fn publish(&self, index: InvertedIndex) -> Arc<InvertedIndex> {
        let next = Arc::new(index);
        let prev = std::mem::replace(&mut *self.index.write(), next);
        tracing::info!(num_docs = self.index.read().num_docs(), "published new index");
        prev
    }

    pub fn search(&self, req: &SearchRequest) -> SearchOutcome {
        let start = Instant::now();
        let index = self.index();
        let candidates = pipeline::search(&index, &req.query, &req.filters, req.sort);
        let page = paginate(candidates, req.page, req.page_size);
        let elapsed = start.elapsed();
        tracing::debug!(query = %req.query, total = page.total, elapsed_us = elapsed.as_micros() as u64, "search complete");
        self.analytics.record_search(&req.query, elapsed);
        SearchOutcome { page, index, elapsed }
    }
}
