//! CLI binary for packdim.
//!
//! A thin shim over the library crate: maps CLI flags to `ClientConfig`,
//! drives one `WorkflowController` run and prints the result.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use packdim::{
    AnalysisPipeline, AnalysisResult, ClientConfig, DimensionKey, HttpJobClient, SelectedFile,
    Step, ValidationPolicy, WorkflowController, WorkflowObserver, WorkflowState,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a single spinner whose prefix follows the workflow
/// step and whose message follows the job status.
struct CliObserver {
    bar: ProgressBar,
}

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}";

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl WorkflowObserver for CliObserver {
    fn on_state_change(&self, state: &WorkflowState) {
        if state.loading {
            self.bar.set_message("uploading…");
        } else if state.saving {
            self.bar.set_message("saving…");
        }
    }

    fn on_transition(&self, _from: Step, to: Step) {
        match to {
            Step::Landing => self.bar.set_prefix("Idle"),
            Step::Validating => self.bar.set_prefix("Validating"),
            Step::Analyzing => {
                self.bar.set_prefix("Analyzing");
                self.bar.set_message("waiting for job…");
            }
            Step::Result => {
                let done = format!("{} {}", green("✔"), bold("analysis complete"));
                self.bar.println(done);
                self.bar.set_prefix("Review");
                self.bar.set_message("");
            }
        }
    }

    fn on_status(&self, job_id: &str, status: &str) {
        let message = format!("job {} {}", dim(job_id), status);
        self.bar.set_message(message);
    }

    fn on_error(&self, message: &str) {
        self.bar.println(format!("  {} {}", red("✗"), red(message)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyze a label photo with the asynchronous job API
  packdim analyze label.jpg

  # Use the OCR + mapping pipeline and confirm the mapped values
  packdim analyze --pipeline two-phase --save label.png

  # Correct the depth before saving
  packdim analyze label.jpg --set depth=45 --save

  # Machine-readable output
  packdim analyze --json label.jpg > state.json

  # Check a file locally without contacting the backend
  packdim validate label.jpg

ENVIRONMENT VARIABLES:
  PACKDIM_API_BASE   Backend base URL (default http://127.0.0.1:8000)
  PACKDIM_PIPELINE   polling | two-phase
  PACKDIM_POLL_MS    Status poll interval in milliseconds
  PACKDIM_TIMEOUT    Per-request timeout in seconds
  RUST_LOG           Overrides the log filter (e.g. packdim=debug)
"#;

/// Extract package dimensions from label photos.
#[derive(Parser, Debug)]
#[command(
    name = "packdim",
    version,
    about = "Extract package dimensions from label photos via the analysis backend",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PACKDIM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PACKDIM_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload an image, wait for the analysis and print the dimensions.
    Analyze(AnalyzeArgs),
    /// Check an image against the upload rules without contacting the backend.
    Validate {
        /// Image file to check.
        image: PathBuf,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Image file to analyze.
    image: PathBuf,

    /// Analysis pipeline.
    #[arg(long, env = "PACKDIM_PIPELINE", value_enum, default_value = "polling")]
    pipeline: PipelineArg,

    /// Override a dimension before saving, e.g. `--set width=120`.
    /// Two-phase results accept an item id or key.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,

    /// Save (polling) or confirm (two-phase) the dimensions.
    #[arg(long)]
    save: bool,

    /// Print the final workflow state as JSON.
    #[arg(long, env = "PACKDIM_JSON")]
    json: bool,

    /// Backend base URL.
    #[arg(long, env = "PACKDIM_API_BASE", default_value = packdim::config::DEFAULT_BASE_URL)]
    api_base: String,

    /// Status poll interval in milliseconds.
    #[arg(long, env = "PACKDIM_POLL_MS", default_value_t = 2000)]
    poll_ms: u64,

    /// Per-request timeout in seconds.
    #[arg(long, env = "PACKDIM_TIMEOUT", default_value_t = 30)]
    timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PipelineArg {
    Polling,
    TwoPhase,
}

impl From<PipelineArg> for AnalysisPipeline {
    fn from(v: PipelineArg) -> Self {
        match v {
            PipelineArg::Polling => AnalysisPipeline::Polling,
            PipelineArg::TwoPhase => AnalysisPipeline::TwoPhase,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep library logs
    // at error level while it is on screen.
    let json = matches!(&cli.command, Command::Analyze(a) if a.json);
    let show_progress = !cli.quiet && !json && matches!(cli.command, Command::Analyze(_));
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Validate { ref image } => validate_only(image, cli.quiet),
        Command::Analyze(ref args) => analyze(args, cli.quiet, show_progress).await,
    }
}

fn validate_only(image: &Path, quiet: bool) -> Result<()> {
    let policy = ValidationPolicy::default();
    let file = SelectedFile::from_path(image, &policy)
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let result = policy.validate(Some(&file));

    if !result.valid {
        bail!("{}: {}", image.display(), result.message);
    }
    if !quiet {
        println!("{} {}  {}", green("✔"), bold(&file.name), result.message);
        println!("  {} {} bytes", dim(&file.mime_type), file.size);
        if let Some(warning) = policy.warning(&file) {
            println!("  {} {}", cyan("⚠"), warning);
        }
    }
    Ok(())
}

async fn analyze(args: &AnalyzeArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let config = build_config(args)?;
    let client = HttpJobClient::new(&config).context("Failed to build HTTP client")?;
    let client = Arc::new(client);
    let file = SelectedFile::from_path(&args.image, &config.validation_policy())
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    let observer = show_progress.then(CliObserver::new);
    let mut workflow = WorkflowController::new(client, config);
    if let Some(ref obs) = observer {
        workflow = workflow.with_observer(obs.clone() as Arc<dyn WorkflowObserver>);
    }

    workflow.pick(file);
    let outcome = drive(&mut workflow, args).await;
    if let Some(ref obs) = observer {
        obs.finish();
    }
    outcome?;

    let state = workflow.state();
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(state).context("Failed to serialise state")?
        );
    } else if !quiet {
        print_result(state);
    }
    Ok(())
}

/// Validate → analyze → edit → save. Stops at the first surfaced error.
async fn drive(workflow: &mut WorkflowController, args: &AnalyzeArgs) -> Result<()> {
    if !workflow.state().validation.valid {
        bail!("{}", workflow.state().validation.message);
    }
    if let Some(ref warning) = workflow.state().warning {
        eprintln!("{} {}", cyan("⚠"), warning);
    }

    workflow.start_analysis().await;
    if workflow.state().step == Step::Analyzing {
        workflow.run_polling().await;
    }
    if let Some(ref error) = workflow.state().error {
        bail!("{error}");
    }
    if workflow.state().step != Step::Result {
        bail!("analysis did not produce a result");
    }

    for (key, value) in &args.set {
        apply_edit(workflow, key, value)?;
    }

    if args.save {
        workflow.save_or_confirm().await;
        if let Some(ref error) = workflow.state().error {
            bail!("{error}");
        }
    }
    Ok(())
}

fn apply_edit(workflow: &mut WorkflowController, key: &str, value: &str) -> Result<()> {
    match workflow.state().pipeline {
        AnalysisPipeline::Polling => {
            let key: DimensionKey = key.parse().map_err(anyhow::Error::msg)?;
            workflow.edit_dimension(key, value);
        }
        AnalysisPipeline::TwoPhase => {
            if workflow.edit_dimension_item(key, value) {
                return Ok(());
            }
            let id = workflow
                .state()
                .dimension_items()
                .iter()
                .find(|item| item.key.eq_ignore_ascii_case(key))
                .map(|item| item.id.clone());
            match id {
                Some(id) => {
                    workflow.edit_dimension_item(&id, value);
                }
                None => bail!("no dimension item with id or key '{key}'"),
            }
        }
    }
    Ok(())
}

fn print_result(state: &WorkflowState) {
    if let Some(ref file) = state.file {
        println!("{}", bold(&file.name));
    }
    if let Some(ref warning) = state.warning {
        println!("  {} {}", cyan("⚠"), warning);
    }

    match state.result {
        Some(AnalysisResult::Polling { ref dimensions, .. }) => {
            for key in DimensionKey::ALL {
                let value = dimensions.get(key);
                let shown = if value.is_empty() {
                    dim("—")
                } else {
                    format!("{value} mm")
                };
                println!("  {:<8} {}", key.as_str(), shown);
            }
        }
        Some(AnalysisResult::TwoPhase {
            ref dimension_items,
            ref ocr_items,
            ..
        }) => {
            println!("  {}", dim(&format!("{} OCR items", ocr_items.len())));
            if dimension_items.is_empty() {
                println!("  {}", dim("no dimensions mapped"));
            }
            for item in dimension_items {
                println!(
                    "  {:<8} {} {}  {}",
                    item.key,
                    item.value,
                    item.unit,
                    dim(&item.source_text)
                );
            }
        }
        None => {}
    }

    if let Some(ref message) = state.status_message {
        println!("{} {}", green("✔"), message);
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(args: &AnalyzeArgs) -> Result<ClientConfig> {
    ClientConfig::builder()
        .base_url(args.api_base.clone())
        .pipeline(args.pipeline.into())
        .poll_interval_ms(args.poll_ms)
        .request_timeout_secs(args.timeout)
        .user_agent(concat!("packdim/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Invalid configuration")
}

/// Parse `--set KEY=VALUE`.
fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s.split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
