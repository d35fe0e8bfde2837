use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Number of recent response times kept for the mean.
pub const RESPONSE_WINDOW: usize = 100;
pub const TOP_KEYWORDS: usize = 10;
/// Distinct keywords held before the least frequent ones are dropped.
pub const MAX_TRACKED_KEYWORDS: usize = 10_000;

/// Receives one event per completed search. Must not affect the result.
pub trait AnalyticsSink: Send + Sync {
    fn record_search(&self, query: &str, elapsed: Duration);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub total_searches: u64,
    /// Mean over the response window, rounded to two decimals.
    pub avg_response_time_ms: f64,
    pub top_keywords: Vec<KeywordCount>,
}

#[derive(Default)]
struct Counters {
    total: u64,
    times_ms: VecDeque<f64>,
    keywords: HashMap<String, u64>,
}

/// In-memory search statistics.
pub struct AnalyticsRecorder {
    window: usize,
    max_keywords: usize,
    counters: Mutex<Counters>,
}

impl Default for AnalyticsRecorder {
    fn default() -> Self { Self::with_window(RESPONSE_WINDOW) }
}

impl AnalyticsRecorder {
    pub fn new() -> Self { Self::default() }

    pub fn with_window(window: usize) -> Self { Self::with_limits(window, MAX_TRACKED_KEYWORDS) }

    pub fn with_limits(window: usize, max_keywords: usize) -> Self {
        Self {
            window: window.max(1),
            max_keywords: max_keywords.max(TOP_KEYWORDS),
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn snapshot(&self) -> AnalyticsSnapshot {
        let c = self.counters.lock();
        let avg = if c.times_ms.is_empty() {
            0.0
        } else {
            c.times_ms.iter().sum::<f64>() / c.times_ms.len() as f64
        };
        let mut top: Vec<KeywordCount> = c
            .keywords
            .iter()
            .map(|(k, &count)| KeywordCount { keyword: k.clone(), count })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
        top.truncate(TOP_KEYWORDS);
        AnalyticsSnapshot {
            total_searches: c.total,
            avg_response_time_ms: (avg * 100.0).round() / 100.0,
            top_keywords: top,
        }
    }
}

impl AnalyticsSink for AnalyticsRecorder {
    fn record_search(&self, query: &str, elapsed: Duration) {
        let mut c = self.counters.lock();
        c.total += 1;
        c.times_ms.push_back(elapsed.as_secs_f64() * 1000.0);
        while c.times_ms.len() > self.window {
            c.times_ms.pop_front();
        }
        // Raw whitespace-separated words; stop words are counted too.
        for keyword in query.to_lowercase().split_whitespace() {
            *c.keywords.entry(keyword.to_string()).or_insert(0) += 1;
        }
        if c.keywords.len() > self.max_keywords {
            prune_keywords(&mut c.keywords, self.max_keywords / 2);
        }
    }
}

/// Keep the `keep` most frequent keywords, ordered as in the snapshot.
fn prune_keywords(keywords: &mut HashMap<String, u64>, keep: usize) {
    let mut ranked: Vec<(String, u64)> = keywords.drain().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(keep);
    keywords.extend(ranked);
}
