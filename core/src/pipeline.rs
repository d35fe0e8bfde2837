use crate::document::MediaDocument;
use crate::index::InvertedIndex;
use crate::query::{score_query, ScoredCandidate};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;
use time::Date;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Secondary filters; `None` disables a filter.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Exact photographer name.
    pub photographer: Option<String>,
    /// Inclusive lower bound.
    pub date_start: Option<Date>,
    /// Inclusive upper bound.
    pub date_end: Option<Date>,
    /// Countries the caller wants to publish in. Unrestricted documents always pass;
    /// restricted ones need at least one of their countries in this set.
    pub countries: Option<BTreeSet<String>>,
}

impl SearchFilters {
    pub fn matches(&self, doc: &MediaDocument) -> bool {
        if let Some(p) = &self.photographer {
            if doc.photographer != *p {
                return false;
            }
        }
        if self.date_start.is_some_and(|start| doc.day < start) {
            return false;
        }
        if self.date_end.is_some_and(|end| doc.day > end) {
            return false;
        }
        if let Some(allowed) = &self.countries {
            if !doc.restrictions.is_empty() && doc.restrictions.is_disjoint(allowed) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Relevance,
    DateAsc,
    DateDesc,
}

#[derive(Debug, Error)]
#[error("unknown sort mode {0:?} (expected relevance, date_asc or date_desc)")]
pub struct UnknownSortMode(pub String);

impl FromStr for SortMode {
    type Err = UnknownSortMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SortMode::Relevance),
            "date_asc" => Ok(SortMode::DateAsc),
            "date_desc" => Ok(SortMode::DateDesc),
            other => Err(UnknownSortMode(other.to_string())),
        }
    }
}

/// Drop candidates rejected by `filters`, keeping order.
pub fn apply_filters(index: &InvertedIndex, candidates: &mut Vec<ScoredCandidate>, filters: &SearchFilters) {
    candidates.retain(|c| index.document(c.doc_id).is_some_and(|d| filters.matches(d)));
}

/// Reorder by date when requested. The sort is stable, so equal dates keep their
/// relevance order.
pub fn apply_sort(index: &InvertedIndex, candidates: &mut [ScoredCandidate], sort: SortMode) {
    let day = |c: &ScoredCandidate| index.document(c.doc_id).map(|d| d.day);
    match sort {
        SortMode::Relevance => {}
        SortMode::DateAsc => candidates.sort_by_key(day),
        SortMode::DateDesc => candidates.sort_by_key(|c| Reverse(day(c))),
    }
}

/// Score, filter and order every match of `query`.
pub fn search(index: &InvertedIndex, query: &str, filters: &SearchFilters, sort: SortMode) -> Vec<ScoredCandidate> {
    let mut candidates = score_query(index, query);
    apply_filters(index, &mut candidates, filters);
    apply_sort(index, &mut candidates, sort);
    candidates
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    /// Items before slicing.
    pub total: usize,
    /// `ceil(total / page_size)`; 0 for an empty result.
    pub total_pages: usize,
}

pub fn clamp_page(page: usize) -> usize { page.max(1) }

pub fn clamp_page_size(page_size: usize) -> usize { page_size.clamp(1, MAX_PAGE_SIZE) }

/// Slice `items` to the requested page after clamping page and page size. Pages past
/// the end are empty but still report the totals.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> ResultPage<T> {
    let page = clamp_page(page);
    let page_size = clamp_page_size(page_size);
    let total = items.len();
    let start = (page - 1).saturating_mul(page_size).min(total);
    let items: Vec<T> = items.into_iter().skip(start).take(page_size).collect();
    ResultPage { items, page, page_size, total, total_pages: total.div_ceil(page_size) }
}
