use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mediasearch_core::document::parse_iso_date;
use mediasearch_core::{
    load_corpus, AnalyticsRecorder, IdfMode, IndexOptions, InvertedIndex, SearchFilters, SearchRequest,
    SearchService, SortMode,
};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the media search index and inspect or query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Corpus path (.json, .jsonl, or a directory of them)
    #[arg(long)]
    input: String,
    /// Use IDF = ln(N/df) instead of the smoothed ln(1 + N/df)
    #[arg(long, default_value_t = false)]
    plain_idf: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the corpus, build the index and print its statistics as JSON
    Stats {
        #[command(flatten)]
        source: Source,
    },
    /// Run a single query and print the result page as JSON
    Query {
        #[command(flatten)]
        source: Source,
        /// Query text
        #[arg(long)]
        q: String,
        /// Exact photographer name
        #[arg(long)]
        photographer: Option<String>,
        /// Inclusive lower date bound (yyyy-mm-dd)
        #[arg(long)]
        date_start: Option<String>,
        /// Inclusive upper date bound (yyyy-mm-dd)
        #[arg(long)]
        date_end: Option<String>,
        /// Allowed publication countries, comma separated
        #[arg(long, value_delimiter = ',')]
        countries: Vec<String>,
        /// relevance, date_asc or date_desc
        #[arg(long, default_value = "relevance")]
        sort: SortMode,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        page_size: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { source } => {
            let (index, rejected) = build_index(&source)?;
            let stats = index.stats();
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "rejected": rejected, "index": stats }))?);
            Ok(())
        }
        Commands::Query { source, q, photographer, date_start, date_end, countries, sort, page, page_size } => {
            let filters = SearchFilters {
                photographer,
                date_start: date_start.as_deref().map(parse_iso_date).transpose()?,
                date_end: date_end.as_deref().map(parse_iso_date).transpose()?,
                countries: if countries.is_empty() {
                    None
                } else {
                    Some(countries.iter().map(|c| c.trim().to_uppercase()).collect())
                },
            };
            let (index, _) = build_index(&source)?;
            let service = SearchService::new(index, Arc::new(AnalyticsRecorder::new()));
            let outcome = service.search(&SearchRequest { query: q, filters, sort, page, page_size });

            let items: Vec<_> = outcome
                .page
                .items
                .iter()
                .filter_map(|c| outcome.index.document(c.doc_id).map(|d| serde_json::json!({ "score": c.score, "doc": d })))
                .collect();
            let out = serde_json::json!({
                "items": items,
                "page": outcome.page.page,
                "pageSize": outcome.page.page_size,
                "total": outcome.page.total,
                "totalPages": outcome.page.total_pages,
                "tookMs": outcome.elapsed.as_secs_f64() * 1000.0,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
    }
}

fn build_index(source: &Source) -> Result<(InvertedIndex, usize)> {
    let corpus = load_corpus(&source.input)?;
    let idf = if source.plain_idf { IdfMode::Plain } else { IdfMode::Smoothed };
    let rejected = corpus.rejected;
    let index = InvertedIndex::build_with(corpus.documents, IndexOptions { idf, ..Default::default() });
    tracing::info!(input = %source.input, num_docs = index.num_docs(), rejected, "index ready");
    Ok((index, rejected))
}
