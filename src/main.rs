mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fastngram::{Backend, IndexConfig, IntSequence, RowId, TextIndex};
use output::RowMatch;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fastngram")]
#[command(about = "In-memory n-gram substring index over the lines of a file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a file and search its lines
    Search {
        /// File to index, one row per line
        file: PathBuf,

        /// Substring to look for (case-insensitive)
        query: String,

        #[command(flatten)]
        index: IndexArgs,

        /// Print raw index candidates instead of confirmed matches
        #[arg(long)]
        candidates: bool,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
    /// Index a file and show index statistics
    Stats {
        /// File to index, one row per line
        file: PathBuf,

        #[command(flatten)]
        index: IndexArgs,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct IndexArgs {
    /// JSON index configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Posting store backend
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Characters per n-gram (2-4)
    #[arg(long = "ngram")]
    ngram_size: Option<usize>,

    /// Bits kept per character (5-7)
    #[arg(long = "bits")]
    bits_per_char: Option<u32>,

    /// Initial trie page count
    #[arg(long)]
    pages: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Array,
    Trie,
}

impl IndexArgs {
    fn resolve(&self) -> Result<IndexConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => IndexConfig::default(),
        };

        if let Some(n) = self.ngram_size {
            config.ngram_size = n;
        }
        if let Some(bits) = self.bits_per_char {
            config.bits_per_char = bits;
        }
        let current_pages = match config.backend {
            Backend::Trie { initial_pages } => initial_pages,
            Backend::Array => Backend::DEFAULT_INITIAL_PAGES,
        };
        config.backend = match self.backend {
            Some(BackendArg::Array) => Backend::Array,
            Some(BackendArg::Trie) => Backend::Trie {
                initial_pages: current_pages,
            },
            None => config.backend,
        };
        if let (Some(pages), Backend::Trie { initial_pages }) = (self.pages, &mut config.backend) {
            *initial_pages = pages;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            file,
            query,
            index,
            candidates,
            json,
        } => {
            let config = index.resolve()?;
            let text = read_rows(&file)?;
            let lines: Vec<&str> = text.lines().collect();
            let idx = build_index(&config, &lines)?;
            search(&idx, &lines, &query, candidates, json)?;
        }
        Commands::Stats { file, index, json } => {
            let config = index.resolve()?;
            let text = read_rows(&file)?;
            let lines: Vec<&str> = text.lines().collect();
            let idx = build_index(&config, &lines)?;
            let stats = idx.stats();
            if json {
                output::print_json_stats(&stats)?;
            } else {
                output::print_stats(&stats)?;
            }
        }
    }

    Ok(())
}

fn read_rows(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn build_index(config: &IndexConfig, lines: &[&str]) -> Result<TextIndex> {
    let mut idx = config.build()?;
    let rows: Vec<(RowId, &str)> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            RowId::try_from(i)
                .map(|row| (row, *line))
                .context("Too many lines to index")
        })
        .collect::<Result<_>>()?;
    idx.add_rows(&rows)?;
    info!(rows = rows.len(), "indexed file");
    Ok(idx)
}

fn search(
    idx: &TextIndex,
    lines: &[&str],
    query: &str,
    raw_candidates: bool,
    json: bool,
) -> Result<()> {
    let index_only = idx.is_index_only(query);
    let candidates: Vec<RowId> = idx.candidates(query)?.rows().collect();

    let matches: Vec<RowMatch<'_>> = candidates
        .iter()
        .filter_map(|&row| {
            let text = *lines.get(row as usize)?;
            (raw_candidates || idx.evaluate(text, query)).then_some(RowMatch {
                row,
                line: row as usize + 1,
                text,
            })
        })
        .collect();

    if json {
        output::print_json_matches(&matches, query, index_only, candidates.len())?;
    } else {
        output::print_matches(&matches, query)?;
    }
    Ok(())
}
