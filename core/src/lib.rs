//! In-memory multi-field search over a static media archive.
//!
//! Load a [`Corpus`], build an [`InvertedIndex`] once, and serve queries through a
//! [`SearchService`], which scores, filters, sorts and paginates each request and
//! reports its timing to an [`AnalyticsSink`].

pub mod analytics;
pub mod corpus;
pub mod document;
pub mod index;
pub mod pipeline;
pub mod query;
pub mod service;
pub mod tokenizer;

pub use analytics::{AnalyticsRecorder, AnalyticsSink, AnalyticsSnapshot};
pub use corpus::{load_corpus, Corpus};
pub use document::{DocumentError, MediaDocument, RawMediaItem};
pub use index::{Field, FieldWeights, IdfMode, IndexOptions, InvertedIndex};
pub use pipeline::{paginate, search, ResultPage, SearchFilters, SortMode};
pub use query::ScoredCandidate;
pub use service::{SearchOutcome, SearchRequest, SearchService};

/// Ordinal of a document in the loaded corpus.
pub type DocId = u32;
