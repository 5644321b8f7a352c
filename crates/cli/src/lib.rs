use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::{AppConfig, EmbeddingConfig};
use output::{render_hits, ResultRow, SearchOutput};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thaifood_search::{SearchError, SearchSession};
use thaifood_vector_store::{
    Embedder, EmbeddingCache, EmbeddingMode, EmbeddingModel, HttpEmbedder, HttpEmbedderConfig,
    StubEmbedder,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::flags::EmbedMode;

mod config;
mod corpus_file;
mod flags;
mod output;

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "thaifood")]
#[command(about = "Semantic search over Thai dishes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file (defaults to ./thaifood.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Corpus JSON file (array of objects)
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Override embedding backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Override embedding model id
    #[arg(long, global = true)]
    embed_model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the dishes closest to a query
    Search(SearchArgs),

    /// Prompt for queries until EOF or `:quit`
    Interactive(InteractiveArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// What you feel like eating, e.g. "อยากกินอะไรเผ็ดๆ"
    query: String,

    /// Number of dishes to return
    #[arg(long, short = 'n')]
    top_k: Option<usize>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InteractiveArgs {
    /// Number of dishes to return per query
    #[arg(long, short = 'n')]
    top_k: Option<usize>,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    if matches!(&cli.command, Commands::Search(args) if args.json) {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // reqwest/hyper connection chatter
    if !cli.verbose {
        builder.filter_module("hyper_util", log::LevelFilter::Warn);
        builder.filter_module("reqwest", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(corpus) = cli.corpus.take() {
        config.corpus_path = corpus;
    }
    if let Some(mode) = cli.embed_mode {
        config.embedding.mode = mode.as_domain();
    }
    if let Some(model) = cli.embed_model.take() {
        config.embedding.model_id = model;
    }

    match cli.command {
        Commands::Search(args) => run_search(args, &config).await?,
        Commands::Interactive(args) => run_interactive(args, &config).await?,
    }

    Ok(())
}

fn build_model(config: &EmbeddingConfig) -> Result<EmbeddingModel> {
    let timeout = config.timeout()?;
    let embedder: Arc<dyn Embedder> = match config.mode {
        EmbeddingMode::Stub => {
            log::info!("Using stub embeddings ({} dims)", config.dimension);
            Arc::new(StubEmbedder::new(config.dimension))
        }
        EmbeddingMode::Http => {
            let api_token = config.token();
            if api_token.is_none() {
                log::info!(
                    "{} is not set; calling {} without a bearer token",
                    config.token_env,
                    config.endpoint
                );
            }
            Arc::new(HttpEmbedder::new(HttpEmbedderConfig {
                endpoint: config.endpoint.clone(),
                model_id: config.model_id.clone(),
                dimension: config.dimension,
                max_batch: config.max_batch,
                api_token,
                request_timeout: timeout,
            })?)
        }
    };
    Ok(EmbeddingModel::new(embedder, timeout)?)
}

async fn open_session(config: &AppConfig) -> Result<SearchSession> {
    let policy = config.policy()?;
    let corpus = corpus_file::load_corpus(&config.corpus_path, &policy)?;
    let model = build_model(&config.embedding)?;
    let cache = Arc::new(EmbeddingCache::new(model, config.embedding.query_cache));
    let session = SearchSession::new(cache, corpus);
    session
        .prepare()
        .await
        .context("Failed to embed the corpus")?;
    Ok(session)
}

async fn run_search(args: SearchArgs, config: &AppConfig) -> Result<()> {
    // Reject before paying for corpus embedding
    if args.query.trim().is_empty() {
        return Err(SearchError::EmptyQuery.into());
    }
    let top_k = args.top_k.unwrap_or(config.top_k);
    let session = open_session(config).await?;
    let hits = session.search(&args.query, top_k).await?;

    if args.json {
        let output = SearchOutput {
            query: args.query.trim().to_string(),
            top_k,
            model_id: session.cache().model().model_id().to_string(),
            corpus_version: session.corpus().version().to_string(),
            results: ResultRow::from_hits(&hits, &config.name_field),
        };
        print_stdout(&serde_json::to_string_pretty(&output)?)?;
    } else {
        print_stdout(&render_hits(&hits, &config.name_field, &config.detail_fields))?;
    }
    Ok(())
}

async fn run_interactive(args: InteractiveArgs, config: &AppConfig) -> Result<()> {
    let top_k = args.top_k.unwrap_or(config.top_k);
    let session = open_session(config).await?;
    eprintln!("Type what you feel like eating; `:reload` re-reads the corpus, `:quit` exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            ":q" | ":quit" | ":exit" => break,
            ":reload" => match reload(&session, config).await {
                Ok(records) => eprintln!("Reloaded {records} records"),
                Err(err) => eprintln!("Reload failed: {err:#}"),
            },
            query => match session.search(query, top_k).await {
                Ok(hits) => print_stdout(&render_hits(
                    &hits,
                    &config.name_field,
                    &config.detail_fields,
                ))?,
                Err(err) if err.is_retryable() => {
                    eprintln!("Search failed, try again: {err}");
                }
                Err(err) => eprintln!("Search failed: {err}"),
            },
        }
    }
    Ok(())
}

async fn reload(session: &SearchSession, config: &AppConfig) -> Result<usize> {
    let corpus = corpus_file::load_corpus(&config.corpus_path, &config.policy()?)?;
    let records = corpus.len();
    session.reload(corpus).await?;
    Ok(records)
}

fn prompt() -> Result<()> {
    let mut stdout = io::stdout().lock();
    match stdout.write_all(b"> ").and_then(|_| stdout.flush()) {
        Err(err) if err.kind() != io::ErrorKind::BrokenPipe => Err(err.into()),
        _ => Ok(()),
    }
}
