use crate::document::{MediaDocument, RawMediaItem};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Documents accepted from a corpus source, in ordinal order.
#[derive(Debug, Default)]
pub struct Corpus {
    pub documents: Vec<MediaDocument>,
    /// Records dropped because they failed normalization.
    pub rejected: usize,
}

impl Corpus {
    /// Normalize raw records, rejecting the malformed ones. Accepted documents keep
    /// their relative order.
    pub fn from_raw<I>(items: I) -> Self
    where
        I: IntoIterator<Item = RawMediaItem>,
    {
        let mut corpus = Corpus::default();
        for raw in items {
            let id = raw.bildnummer.clone();
            match MediaDocument::from_raw(raw) {
                Ok(doc) => corpus.documents.push(doc),
                Err(err) => {
                    tracing::warn!(%id, error = %err, "rejected corpus record");
                    corpus.rejected += 1;
                }
            }
        }
        corpus
    }

    pub fn len(&self) -> usize { self.documents.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }
}

/// Load a corpus from a `.json` file (array or single object), a `.jsonl` file, or a
/// directory containing such files (visited in sorted path order).
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else {
        files.push(path.to_path_buf());
    }

    let mut raw = Vec::new();
    for file in &files {
        if extension(file) == Some("jsonl") {
            read_jsonl(file, &mut raw)?;
        } else {
            read_json(file, &mut raw)?;
        }
    }

    let corpus = Corpus::from_raw(raw);
    tracing::info!(source = %path.display(), accepted = corpus.len(), rejected = corpus.rejected, "loaded corpus");
    Ok(corpus)
}

fn extension(p: &Path) -> Option<&str> { p.extension().and_then(|s| s.to_str()) }

fn read_jsonl(file: &Path, out: &mut Vec<RawMediaItem>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let item: RawMediaItem = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        out.push(item);
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<RawMediaItem>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                out.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => out.push(serde_json::from_value(json)?),
        _ => anyhow::bail!("{}: expected a JSON array or object", file.display()),
    }
    Ok(())
}
