use anyhow::{bail, Context, Result};
use archive_mbox::MboxConfig;
use archive_render::RenderReport;
use archive_store::{MessageStore, StoreStats};
use clap::{Args, Parser, Subcommand};
use config::ArchiveConfig;
use pipeline::{IngestStats, ResolveStats};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

mod config;
mod pipeline;

#[derive(Parser)]
#[command(name = "list-archive")]
#[command(about = "Rebuild reply threads of a mailing-list archive and render them as Markdown", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store directory (overrides [store] dir)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Configuration file (default: ./archive.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print the result as JSON on stdout (implies --quiet)
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a mailbox and add its messages to the store
    Ingest(IngestArgs),

    /// Classify orphans and assign thread roots to every stored message
    Resolve,

    /// Write the Markdown document tree for the resolved store
    Render(RenderArgs),

    /// Ingest, resolve and render in one pass
    Run(RunArgs),

    /// Show store statistics
    Stats,

    /// Delete every stored record and body
    Reset,
}

#[derive(Args)]
struct IngestArgs {
    /// Mailbox file
    mbox: PathBuf,

    #[command(flatten)]
    overrides: IngestOverrides,
}

#[derive(Args)]
struct IngestOverrides {
    /// Separator regex (overrides [ingest] separator)
    #[arg(long)]
    separator: Option<String>,

    /// Source year when no date mentions one (overrides [ingest] fallback_year)
    #[arg(long)]
    fallback_year: Option<i32>,
}

impl IngestOverrides {
    fn apply(&self, mut config: MboxConfig) -> MboxConfig {
        if let Some(separator) = &self.separator {
            config.separator = separator.clone();
        }
        if let Some(year) = self.fallback_year {
            config.fallback_year = year;
        }
        config
    }
}

#[derive(Args)]
struct RenderArgs {
    /// Output directory (overrides [render] output_dir)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct RunArgs {
    /// Mailbox file
    mbox: PathBuf,

    /// Output directory (overrides [render] output_dir)
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    overrides: IngestOverrides,
}

#[derive(Serialize)]
struct RunSummary {
    ingest: IngestStats,
    resolve: ResolveStats,
    render: RenderReport,
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = ArchiveConfig::load(cli.config.as_deref())?;
    let store_dir = cli.store.clone().unwrap_or_else(|| config.store.dir.clone());

    let success = match &cli.command {
        Commands::Ingest(args) => {
            let ingest_config = args.overrides.apply(config.ingest.clone());
            let mut store = open_store(&store_dir)?;
            let stats = run_ingest(&mut store, &args.mbox, &ingest_config)?;
            store.close();
            emit(&cli, &stats, || ingest_lines(&stats))?;
            true
        }
        Commands::Resolve => {
            let mut store = open_store(&store_dir)?;
            let stats = pipeline::resolve_store(&mut store).context("Resolve stage failed")?;
            store.close();
            emit(&cli, &stats, || resolve_lines(&stats))?;
            true
        }
        Commands::Render(args) => {
            let out = output_dir(args.out.as_deref(), &config)?;
            let store = open_store(&store_dir)?;
            let report = pipeline::render_store(&store, &out).context("Render stage failed")?;
            store.close();
            emit(&cli, &report, || render_lines(&report, &out))?;
            report.is_success()
        }
        Commands::Run(args) => {
            let out = output_dir(args.out.as_deref(), &config)?;
            let ingest_config = args.overrides.apply(config.ingest.clone());
            let mut store = open_store(&store_dir)?;
            let ingest = run_ingest(&mut store, &args.mbox, &ingest_config)?;
            let resolve = pipeline::resolve_store(&mut store).context("Resolve stage failed")?;
            let render = pipeline::render_store(&store, &out).context("Render stage failed")?;
            store.close();

            let summary = RunSummary {
                ingest,
                resolve,
                render,
            };
            emit(&cli, &summary, || {
                let mut lines = ingest_lines(&summary.ingest);
                lines.extend(resolve_lines(&summary.resolve));
                lines.extend(render_lines(&summary.render, &out));
                lines
            })?;
            summary.render.is_success()
        }
        Commands::Stats => {
            let store = open_store(&store_dir)?;
            let stats = store.stats();
            store.close();
            emit(&cli, &stats, || stats_lines(&stats))?;
            true
        }
        Commands::Reset => {
            let mut store = open_store(&store_dir)?;
            store.reset().context("Reset failed")?;
            store.close();
            emit(&cli, &store_dir, || {
                vec![format!("Reset message store {}", store_dir.display())]
            })?;
            true
        }
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn open_store(dir: &Path) -> Result<MessageStore> {
    MessageStore::open(dir)
        .with_context(|| format!("Failed to open message store {}", dir.display()))
}

fn run_ingest(store: &mut MessageStore, mbox: &Path, config: &MboxConfig) -> Result<IngestStats> {
    let file = File::open(mbox)
        .with_context(|| format!("Failed to open mailbox {}", mbox.display()))?;
    pipeline::ingest_mailbox(store, BufReader::new(file), config).context("Ingest stage failed")
}

fn output_dir(flag: Option<&Path>, config: &ArchiveConfig) -> Result<PathBuf> {
    match flag.map(Path::to_path_buf).or_else(|| config.render.output_dir.clone()) {
        Some(out) => Ok(out),
        None => bail!("No output directory: pass --out or set [render] output_dir"),
    }
}

/// JSON on stdout with `--json`, otherwise the human lines.
fn emit<T, F>(cli: &Cli, value: &T, lines: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce() -> Vec<String>,
{
    let text = if cli.json {
        serde_json::to_string_pretty(value)?
    } else {
        lines().join("\n")
    };
    print_stdout(&text)
}

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

fn ingest_lines(stats: &IngestStats) -> Vec<String> {
    vec![format!(
        "ingest: {} blocks, {} new, {} duplicates, {} skipped, {} undated, {} unknown senders",
        stats.blocks,
        stats.inserted,
        stats.duplicates,
        stats.skipped,
        stats.degraded_dates,
        stats.unknown_senders
    )]
}

fn resolve_lines(stats: &ResolveStats) -> Vec<String> {
    vec![format!(
        "resolve: {} messages, {} threads, {} dangling, {} ambiguous, {} forced roots, {} iterations",
        stats.messages,
        stats.threads,
        stats.dangling,
        stats.ambiguous,
        stats.forced_roots,
        stats.iterations
    )]
}

fn render_lines(report: &RenderReport, out: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "render: {} documents written to {}, {} failures",
        report.documents,
        out.display(),
        report.failures.len()
    )];
    for failure in &report.failures {
        lines.push(format!("  failed {}: {}", failure.key, failure.error));
    }
    lines
}

fn stats_lines(stats: &StoreStats) -> Vec<String> {
    vec![
        format!("messages:        {}", stats.messages),
        format!("replies:         {}", stats.replies),
        format!("undated:         {}", stats.undated),
        format!("unknown senders: {}", stats.unknown_senders),
        format!("no parent:       {}", stats.no_parent),
        format!("resolved:        {}", stats.resolved),
        format!("threads:         {}", stats.threads),
        format!("participants:    {}", stats.participants),
    ]
}
