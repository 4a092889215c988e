//! Command-line interface for the assistant.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use kanoon_client::{KanoonClient, KanoonConfig, SearchQuery};

use crate::chat::ChatService;
use crate::config::AssistantConfig;
use crate::error::Result;
use crate::llm::{LlmRouter, ModelPreference};
use crate::ner::{ClassifierOutput, HttpTokenClassifier, SpanExtractor};

/// Kanoon Assistant - legal questions answered from Indian case law.
#[derive(Parser)]
#[command(name = "kanoon-assistant")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search Indian Kanoon and print the raw JSON response.
    Search {
        /// Free-text query
        query: String,

        /// Zero-based result page
        #[arg(long, default_value_t = 0)]
        pagenum: u32,

        /// Pages to return (max 100, default from KANOON_MAX_PAGES)
        #[arg(short = 'p', long)]
        maxpages: Option<u32>,

        /// Document types, e.g. supremecourt
        #[arg(short = 'c', long)]
        doctypes: Option<String>,

        /// Only documents on or after this date (DD-MM-YYYY)
        #[arg(short, long)]
        fromdate: Option<String>,

        /// Only documents on or before this date (DD-MM-YYYY)
        #[arg(short, long)]
        todate: Option<String>,

        /// Sort order: mostrecent or leastrecent
        #[arg(short = 'S', long)]
        sortby: Option<String>,

        /// Only documents added today
        #[arg(short, long)]
        added_today: bool,
    },

    /// Fetch a document and print the raw JSON response.
    Doc {
        /// Indian Kanoon document id
        docid: u64,

        /// Number of cited documents to include
        #[arg(short = 'm', long)]
        maxcites: Option<u32>,

        /// Number of citing documents to include
        #[arg(short = 'M', long)]
        maxcitedby: Option<u32>,

        /// Only the fragments matching this query
        #[arg(long, conflicts_with_all = ["meta", "original"])]
        fragment: Option<String>,

        /// Only the document metadata
        #[arg(long, conflicts_with = "original")]
        meta: bool,

        /// The original court copy
        #[arg(short, long)]
        original: bool,
    },

    /// Merge saved classifier output into entity spans.
    Entities {
        /// JSON file with parallel `tokens` and `labels` arrays
        file: PathBuf,
    },

    /// Answer a legal question.
    Ask {
        /// The question
        query: String,

        /// Answer model (default from MODEL_PREFERENCE)
        #[arg(long, value_enum)]
        model: Option<ModelPreference>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            query,
            pagenum,
            maxpages,
            doctypes,
            fromdate,
            todate,
            sortby,
            added_today,
        } => {
            let mut search = SearchQuery::new(query);
            if let Some(doctypes) = doctypes {
                search = search.with_doctypes(doctypes);
            }
            if let Some(fromdate) = fromdate {
                search = search.with_fromdate(fromdate)?;
            }
            if let Some(todate) = todate {
                search = search.with_todate(todate)?;
            }
            if let Some(sortby) = sortby {
                search = search.with_sortby(sortby)?;
            }
            if added_today {
                search = search.added_today();
            }
            search_command(&search, pagenum, maxpages)
        }
        Commands::Doc {
            docid,
            maxcites,
            maxcitedby,
            fragment,
            meta,
            original,
        } => {
            let target = if let Some(query) = fragment {
                DocTarget::Fragment(query)
            } else if meta {
                DocTarget::Meta
            } else if original {
                DocTarget::Original
            } else {
                DocTarget::Full
            };
            doc_command(docid, maxcites, maxcitedby, &target)
        }
        Commands::Entities { file } => entities_command(&file),
        Commands::Ask { query, model } => ask_command(&query, model),
    }
}

/// What `doc` fetches.
enum DocTarget {
    Full,
    Fragment(String),
    Meta,
    Original,
}

fn search_command(query: &SearchQuery, pagenum: u32, maxpages: Option<u32>) -> Result<()> {
    let mut config = KanoonConfig::from_env()?;
    if let Some(maxpages) = maxpages {
        config = config.with_max_pages(maxpages);
    }

    let client = KanoonClient::new(&config)?;
    println!("{}", client.search(query, pagenum));
    Ok(())
}

fn doc_command(
    docid: u64,
    maxcites: Option<u32>,
    maxcitedby: Option<u32>,
    target: &DocTarget,
) -> Result<()> {
    let mut config = KanoonConfig::from_env()?;
    if let Some(maxcites) = maxcites {
        config = config.with_max_cites(maxcites);
    }
    if let Some(maxcitedby) = maxcitedby {
        config = config.with_max_cited_by(maxcitedby);
    }

    let client = KanoonClient::new(&config)?;
    let body = match target {
        DocTarget::Full => client.fetch_doc(docid),
        DocTarget::Fragment(query) => client.fetch_doc_fragment(docid, query),
        DocTarget::Meta => client.fetch_doc_meta(docid),
        DocTarget::Original => client.fetch_orig_doc(docid),
    };
    println!("{body}");
    Ok(())
}

fn entities_command(file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let output: ClassifierOutput = serde_json::from_str(&content)?;
    let spans = SpanExtractor::new().extract(&output.into_token_labels()?);
    println!("{}", serde_json::to_string_pretty(&spans)?);
    Ok(())
}

fn ask_command(query: &str, model: Option<ModelPreference>) -> Result<()> {
    let config = AssistantConfig::from_env()?;
    let model = model.unwrap_or(config.default_model);

    let classifier = HttpTokenClassifier::new(&config.ner)?;
    let search = KanoonClient::new(&config.kanoon)?;
    let router = LlmRouter::from_config(&config.llm)?;
    if router.is_empty() {
        eprintln!(
            "{} no LLM API key set (MISTRAL_API_KEY / GEMINI_API_KEY); answering with search results only",
            style("Warning:").yellow().bold()
        );
    }
    let service = ChatService::new(Box::new(classifier), search, router, &config.llm);

    let runtime = tokio::runtime::Runtime::new()?;

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(format!("Asking {}...", style(model).cyan()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = runtime.block_on(service.respond(query, model));
    pb.finish_and_clear();
    let response = result?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
