use crate::document::MediaDocument;
use crate::tokenizer::tokenize;
use crate::DocId;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Indexed document fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SearchText,
    Photographer,
    Id,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::SearchText, Field::Photographer, Field::Id];

    /// Relevance weight applied to every match in this field.
    pub const fn weight(self) -> f32 {
        match self {
            Field::SearchText => 1.0,
            Field::Photographer => 0.5,
            Field::Id => 0.3,
        }
    }

    pub fn value(self, doc: &MediaDocument) -> &str {
        match self {
            Field::SearchText => &doc.search_text,
            Field::Photographer => &doc.photographer,
            Field::Id => &doc.id,
        }
    }

    const fn slot(self) -> usize {
        match self {
            Field::SearchText => 0,
            Field::Photographer => 1,
            Field::Id => 2,
        }
    }
}

/// How inverse document frequency is computed from `N` and a posting list length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdfMode {
    /// `ln(N / df)`
    Plain,
    /// `ln(1 + N / df)`; stays positive for tokens present in every document.
    #[default]
    Smoothed,
}

/// Per-field relevance weights. Defaults to [`Field::weight`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldWeights {
    pub search_text: f32,
    pub photographer: f32,
    pub id: f32,
}

impl FieldWeights {
    pub const DEFAULT: FieldWeights = FieldWeights {
        search_text: Field::SearchText.weight(),
        photographer: Field::Photographer.weight(),
        id: Field::Id.weight(),
    };

    pub fn get(&self, field: Field) -> f32 {
        match field {
            Field::SearchText => self.search_text,
            Field::Photographer => self.photographer,
            Field::Id => self.id,
        }
    }
}

impl Default for FieldWeights {
    fn default() -> Self { Self::DEFAULT }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    pub idf: IdfMode,
    pub weights: FieldWeights,
}

/// Ordinals of the documents containing a token, ascending and unique.
pub type PostingList = Vec<DocId>;

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub num_docs: usize,
    pub vocabulary: usize,
    /// (field, distinct tokens, total postings)
    pub fields: Vec<(Field, usize, usize)>,
}

/// Per-field inverted index over a fixed corpus.
///
/// Built once by [`InvertedIndex::build`] and never mutated afterwards; share it
/// behind an `Arc` and replace it wholesale to refresh.
#[derive(Debug)]
pub struct InvertedIndex {
    postings: [HashMap<String, PostingList>; 3],
    /// Every token seen in any field, sorted.
    vocabulary: Vec<String>,
    docs: Vec<MediaDocument>,
    options: IndexOptions,
}

impl InvertedIndex {
    pub fn build(docs: Vec<MediaDocument>) -> Self {
        Self::build_with(docs, IndexOptions::default())
    }

    pub fn build_with(docs: Vec<MediaDocument>, options: IndexOptions) -> Self {
        let mut postings: [HashMap<String, PostingList>; 3] = Default::default();
        for (ord, doc) in docs.iter().enumerate() {
            let doc_id = ord as DocId;
            for field in Field::ALL {
                for token in tokenize(field.value(doc)) {
                    let list = postings[field.slot()].entry(token).or_default();
                    // Ordinals arrive in ascending order, so a repeat can only be the tail.
                    if list.last() != Some(&doc_id) {
                        list.push(doc_id);
                    }
                }
            }
        }

        let vocabulary: Vec<String> = postings
            .iter()
            .flat_map(|m| m.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        tracing::info!(num_docs = docs.len(), vocabulary = vocabulary.len(), "built inverted index");
        Self { postings, vocabulary, docs, options }
    }

    /// N, the number of indexed documents.
    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn options(&self) -> IndexOptions { self.options }

    pub fn vocabulary(&self) -> &[String] { &self.vocabulary }

    pub fn postings(&self, field: Field, token: &str) -> &[DocId] {
        self.postings[field.slot()].get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn document(&self, doc_id: DocId) -> Option<&MediaDocument> { self.docs.get(doc_id as usize) }

    pub fn documents(&self) -> &[MediaDocument] { &self.docs }

    pub fn weight(&self, field: Field) -> f32 { self.options.weights.get(field) }

    /// IDF of `token` in `field`; 0 when the token has no postings there.
    pub fn idf(&self, field: Field, token: &str) -> f32 {
        let df = self.postings(field, token).len();
        if df == 0 {
            return 0.0;
        }
        let ratio = self.num_docs() as f32 / df as f32;
        match self.options.idf {
            IdfMode::Plain => ratio.ln(),
            IdfMode::Smoothed => (1.0 + ratio).ln(),
        }
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            num_docs: self.num_docs(),
            vocabulary: self.vocabulary.len(),
            fields: Field::ALL
                .iter()
                .map(|&f| {
                    let m = &self.postings[f.slot()];
                    (f, m.len(), m.values().map(Vec::len).sum())
                })
                .collect(),
        }
    }
}
