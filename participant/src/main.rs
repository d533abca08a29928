//! Study front end - runs one participant session in the terminal.
//!
//! Responses are written to a CSV file per session and, when a submission
//! URL is configured, posted as JSON as well.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use survey_core::{GuidedKind, SessionConfig, SurveySession};
use survey_env::{CsvFileSink, ExportSink, FanoutSink, HttpSink, SystemContext};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

mod screens;
mod terminal;

use terminal::Prompter;

/// Guided prompt-writing study
#[derive(Parser, Debug)]
#[command(name = "study")]
#[command(about = "Run one participant through the prompt-writing study", long_about = None)]
struct Args {
    /// Directory for per-session CSV files
    #[arg(short, long, default_value = "./responses")]
    output_dir: PathBuf,

    /// Endpoint that receives each record as JSON
    #[arg(long, env = "STUDY_SUBMIT_URL")]
    submit_url: Option<String>,

    /// Guided exercise for every scenario (copy-paste, drag-drop, multi-shot)
    #[arg(short, long)]
    guided: Option<GuidedKind>,

    /// Session configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)
            .with_context(|| format!("loading session config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(kind) = args.guided {
        config.default_guided = kind;
    }
    Ok(config)
}

fn build_sink(args: &Args) -> FanoutSink {
    let mut sink = FanoutSink::new().with(CsvFileSink::new(&args.output_dir));
    match &args.submit_url {
        Some(url) if !url.trim().is_empty() => sink = sink.with(HttpSink::new(url.trim())),
        _ => info!("No submission URL configured; writing CSV only"),
    }
    sink
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout belongs to the prompts
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting tracing subscriber")?;

    let config = load_config(&args)?;
    let sink = build_sink(&args);
    info!("Exporting via {} sink(s) ({})", sink.len(), sink.name());

    let ctx = SystemContext::shared();
    let mut session = SurveySession::new(ctx.clone(), Arc::new(sink), config)
        .context("starting session")?;

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout().lock());
    screens::run(&mut session, &mut prompter)?;

    let joined = ctx.join_background();
    debug!("Joined {} background job(s)", joined);
    if let Some(record) = session.last_export() {
        info!("Session {} saved under {}", record.session_id, args.output_dir.display());
    }
    Ok(())
}
