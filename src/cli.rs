//! CLI parsing and orchestration. Parses args, runs scrape -> EPUB or JSON. Maps errors to exit codes.

use crate::assemble::output_file_name;
use crate::config::{self, Config};
use crate::epub::{write_epub, EpubError};
use crate::model::{BookManifest, ChapterRange};
use crate::pipeline::{scrape_novel, ScrapeOptions};
use crate::pool::DEFAULT_WORKERS;
use crate::scraper::{Adapter, ErrorKind, HttpClient, ScraperError, Site};
use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Config(#[from] anyhow::Error),

    #[error(transparent)]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Epub(#[from] EpubError),

    #[error("Failed to write {path}: {reason}")]
    Output { path: PathBuf, reason: String },
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) | CliRunError::Config(_) => 1,
            CliRunError::Scraper(e) if e.kind() == ErrorKind::Validation => 1,
            CliRunError::Scraper(_) => 2,
            CliRunError::Epub(_) | CliRunError::Output { .. } => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Epub,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Epub => "epub",
            OutputFormat::Json => "json",
        }
    }
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.trim().to_lowercase().as_str() {
        "epub" => Ok(OutputFormat::Epub),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!(
            "Invalid format value: '{}'. Use epub or json.",
            s
        )),
    }
}

#[derive(Parser, Debug)]
#[command(name = "novelscraper", version)]
#[command(about = "Scrape NovelFull or WuxiaWorld novels into EPUB")]
#[command(
    after_help = "Config file keys (output_dir, user_agent, max_workers, timeout_secs, format) are read from ./novelscraper.toml or the user config directory. CLI flags override config."
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Errors only; no progress bar.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape a novel from novelfull.com.
    Novelfull(ScrapeArgs),
    /// Scrape a novel from wuxiaworld.com.
    Wuxiaworld(ScrapeArgs),
    /// Pick the site from the URL's host.
    Auto(ScrapeArgs),
}

impl Command {
    /// Site named by the subcommand; `None` for auto-detection.
    pub fn site(&self) -> Option<Site> {
        match self {
            Command::Novelfull(_) => Some(Site::NovelFull),
            Command::Wuxiaworld(_) => Some(Site::WuxiaWorld),
            Command::Auto(_) => None,
        }
    }

    pub fn args(&self) -> &ScrapeArgs {
        match self {
            Command::Novelfull(a) | Command::Wuxiaworld(a) | Command::Auto(a) => a,
        }
    }
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Novel listing page URL.
    pub url: String,

    /// First chapter to scrape (1-based).
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    pub start: i64,

    /// Last chapter to scrape, inclusive. Default: same as --start.
    #[arg(short, long, allow_negative_numbers = true)]
    pub end: Option<i64>,

    /// Directory to write the output file to (overrides config; default: current directory).
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Concurrent chapter downloads (overrides config; default 50).
    #[arg(long)]
    pub workers: Option<usize>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds (overrides config; default: none).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format: epub or json (overrides config; default epub).
    #[arg(long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,
}

impl ScrapeArgs {
    /// Requested range; `end` defaults to `start`.
    pub fn range(&self) -> Result<ChapterRange, ScraperError> {
        ChapterRange::new(self.start, self.end.unwrap_or(self.start))
    }
}

/// Effective run settings after merging CLI flags over config over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub workers: usize,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
    pub format: OutputFormat,
}

impl Settings {
    pub fn resolve(args: &ScrapeArgs, config: Option<&Config>) -> Result<Self, CliRunError> {
        let config_format = config
            .and_then(|c| c.format.as_deref())
            .map(parse_format)
            .transpose()
            .map_err(CliRunError::InvalidInput)?;
        Ok(Self {
            output_dir: args
                .output_dir
                .clone()
                .or_else(|| config.and_then(|c| c.output_dir.clone()))
                .unwrap_or_else(|| PathBuf::from(".")),
            workers: args
                .workers
                .or_else(|| config.and_then(|c| c.max_workers))
                .unwrap_or(DEFAULT_WORKERS)
                .max(1),
            user_agent: args
                .user_agent
                .clone()
                .or_else(|| config.and_then(|c| c.user_agent.clone())),
            timeout_secs: args.timeout.or_else(|| config.and_then(|c| c.timeout_secs)),
            format: args.format.or(config_format).unwrap_or(OutputFormat::Epub),
        })
    }
}

/// Build the adapter for the command. Range and URL are validated here, before any request.
pub fn build_adapter(command: &Command) -> Result<Adapter, ScraperError> {
    let args = command.args();
    let range = args.range()?;
    match command.site() {
        Some(site) => Adapter::new(site, &args.url, range),
        None => Adapter::detect(&args.url, range),
    }
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ");
    bar.set_style(style);
    bar.set_message("Scraping chapters");
    bar
}

fn write_json(manifest: &BookManifest, path: &Path) -> Result<(), CliRunError> {
    let output_error = |reason: String| CliRunError::Output {
        path: path.to_path_buf(),
        reason,
    };
    let file = std::fs::File::create(path).map_err(|e| output_error(e.to_string()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), manifest)
        .map_err(|e| output_error(e.to_string()))
}

/// Write the manifest in `format` under `output_dir`, returning the written path.
pub fn write_output(
    manifest: &BookManifest,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<PathBuf, CliRunError> {
    if !output_dir.as_os_str().is_empty() && !output_dir.is_dir() {
        return Err(CliRunError::InvalidInput(format!(
            "Cannot write output: {}: directory does not exist.",
            output_dir.display()
        )));
    }
    let name = output_file_name(
        &manifest.metadata().title,
        manifest.range(),
        format.extension(),
    );
    let path = output_dir.join(name);
    match format {
        OutputFormat::Epub => write_epub(manifest, &path)?,
        OutputFormat::Json => write_json(manifest, &path)?,
    }
    Ok(path)
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(cli: &Cli) -> Result<(), CliRunError> {
    let adapter = build_adapter(&cli.command)?;
    let config = config::load_config()?;
    let settings = Settings::resolve(cli.command.args(), config.as_ref())?;

    let mut builder = HttpClient::builder();
    if let Some(ua) = &settings.user_agent {
        builder = builder.user_agent(ua.clone());
    }
    if let Some(secs) = settings.timeout_secs {
        builder = builder.timeout_secs(secs);
    }
    let client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    let bar = progress_bar(cli.quiet);
    let report = |done: usize, total: usize| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
    };
    let options = ScrapeOptions {
        max_workers: settings.workers,
        progress: Some(&report),
    };
    let manifest = scrape_novel(&adapter, &client, &options);
    bar.finish_and_clear();
    let manifest = manifest?;

    let path = write_output(&manifest, &settings.output_dir, settings.format)?;
    info!(
        path = %path.display(),
        chapters = manifest.chapters().len(),
        failed = manifest.failed_count(),
        "Wrote {}",
        path.display()
    );
    Ok(())
}
