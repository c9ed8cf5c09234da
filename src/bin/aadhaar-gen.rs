//! CLI binary for aadhaar-gen-client.
//!
//! A thin shim over the library crate: maps CLI flags to `ClientConfig`,
//! renders the workflow in the terminal, and asks for a password or date of
//! birth on stdin when the server needs one.

use aadhaar_gen_client::{
    ClientConfig, Event, HttpBackend, Indicator, Outcome, PreferenceStore, RenderedResult,
    SelectedFile, Theme, Workflow, WorkflowError, WorkflowView,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use reqwest::Url;
use std::collections::HashMap;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
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

// ── Terminal view using indicatif ────────────────────────────────────────────

/// Renders workflow events as spinners and status lines on stderr.
struct CliView {
    multi: MultiProgress,
    /// One live spinner per busy indicator.
    spinners: Mutex<HashMap<Indicator, ProgressBar>>,
    quiet: bool,
}

impl CliView {
    fn new(quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            multi: MultiProgress::new(),
            spinners: Mutex::new(HashMap::new()),
            quiet,
        })
    }

    fn line(&self, msg: String) {
        if self.quiet {
            return;
        }
        // A hidden target (stderr not a terminal) swallows println.
        if self.multi.is_hidden() || self.multi.println(&msg).is_err() {
            eprintln!("{msg}");
        }
    }
}

impl WorkflowView for CliView {
    fn set_busy(&self, indicator: Indicator, busy: bool) {
        let mut spinners = self.spinners.lock().unwrap_or_else(|e| e.into_inner());
        if busy {
            if self.quiet {
                return;
            }
            let bar = self.multi.add(ProgressBar::new_spinner());
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.set_message(indicator.busy_label());
            bar.enable_steady_tick(Duration::from_millis(80));
            spinners.insert(indicator, bar);
        } else if let Some(bar) = spinners.remove(&indicator) {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
    }

    fn show_password_error(&self, message: &str) {
        self.line(format!("{} {}", red("✗"), red(message)));
    }

    fn reveal_password_input(&self) {
        self.line(dim("  Pass the password with --password, or type it when asked."));
    }

    fn open_dob_modal(&self, subtitle: &str) {
        self.line(format!("{} {}", cyan("◆"), bold(subtitle)));
    }

    fn show_dob_error(&self, message: &str) {
        self.line(format!("  {} {}", red("✗"), red(message)));
    }

    fn set_previews(&self, front_url: &str, back_url: &str) {
        self.line(format!("  front  {}", dim(front_url)));
        self.line(format!("  back   {}", dim(back_url)));
    }

    fn toast(&self, message: &str, _visible_for: Duration) {
        self.line(format!("{} {}", green("✔"), message));
    }

    fn alert(&self, message: &str) {
        // Alerts are shown even in quiet mode.
        eprintln!("{} {}", red("✘"), red(message));
    }

    fn save_download(&self, path: &Path) {
        self.line(format!("{} saved {}", green("✔"), bold(&path.display().to_string())));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate; the password defaults to the file name without extension
  aadhaar-gen generate card.pdf

  # Explicit password, then download the PDF
  aadhaar-gen generate card.pdf --password ABCD1990 --pdf

  # Cards that only print the year of birth
  aadhaar-gen generate card.pdf --dob 1990-05-12 --pdf -o out/

  # Keep the two preview images too
  aadhaar-gen generate card.pdf --save-images

  # Theme preference shared with the web front-end
  aadhaar-gen theme toggle

ENVIRONMENT VARIABLES:
  AADHAAR_GEN_SERVER      Server URL (default http://localhost:3000)
  AADHAAR_GEN_PREFS       Preferences file location
  RUST_LOG                Overrides -v / -q log filtering
"#;

/// Generate Aadhaar card previews and PDFs from an uploaded card.
#[derive(Parser, Debug)]
#[command(
    name = "aadhaar-gen",
    version,
    about = "Upload an Aadhaar card, confirm its date of birth, and download the generated PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Server base URL.
    #[arg(long, global = true, env = "AADHAAR_GEN_SERVER", default_value = aadhaar_gen_client::config::DEFAULT_SERVER_URL)]
    server: String,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "AADHAAR_GEN_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Give up on a preview image after this many seconds (default: wait).
    #[arg(long, global = true, env = "AADHAAR_GEN_IMAGE_TIMEOUT")]
    image_timeout: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "AADHAAR_GEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "AADHAAR_GEN_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a card and wait for the generated previews.
    Generate(GenerateArgs),
    /// Show or change the stored colour theme.
    Theme {
        #[arg(value_enum, default_value = "show")]
        action: ThemeAction,

        /// Preferences file (default: per-user config directory).
        #[arg(long, env = "AADHAAR_GEN_PREFS")]
        prefs: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// The card to upload.
    file: PathBuf,

    /// Document password. Defaults to the file name without extension.
    #[arg(short, long, env = "AADHAAR_GEN_PASSWORD")]
    password: Option<String>,

    /// Full date of birth (yyyy-mm-dd) for cards that only print the year.
    #[arg(long)]
    dob: Option<String>,

    /// Download the PDF once the previews are ready.
    #[arg(long)]
    pdf: bool,

    /// Save the front and back preview images.
    #[arg(long)]
    save_images: bool,

    /// Where downloads are written.
    #[arg(short, long, env = "AADHAAR_GEN_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ThemeAction {
    Show,
    Light,
    Dark,
    Toggle,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Spinners carry the interesting feedback; keep library logs to errors
    // unless asked for more.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Theme { action, prefs } => run_theme(*action, prefs.clone()),
        Command::Generate(args) => run_generate(&cli, args).await,
    }
}

fn run_theme(action: ThemeAction, prefs: Option<PathBuf>) -> Result<()> {
    let store = match prefs {
        Some(p) => PreferenceStore::new(p),
        None => PreferenceStore::default_location(),
    };
    let theme = match action {
        ThemeAction::Show => store.load_theme(),
        ThemeAction::Toggle => store
            .toggle()
            .with_context(|| format!("Failed to write {}", store.path().display()))?,
        ThemeAction::Light | ThemeAction::Dark => {
            let theme = if matches!(action, ThemeAction::Dark) {
                Theme::Dark
            } else {
                Theme::Light
            };
            store
                .set_theme(theme)
                .with_context(|| format!("Failed to write {}", store.path().display()))?;
            theme
        }
    };
    println!("{}", theme.as_str());
    Ok(())
}

async fn run_generate(cli: &Cli, args: &GenerateArgs) -> Result<()> {
    let config = ClientConfig::builder()
        .server_url(&cli.server)
        .request_timeout_secs(cli.timeout)
        .asset_load_timeout_secs(cli.image_timeout)
        .output_dir(&args.output_dir)
        .build()
        .context("Invalid configuration")?;
    let backend = HttpBackend::new(&config).context("Failed to build HTTP client")?;
    let view = CliView::new(cli.quiet);
    let mut workflow = Workflow::new(backend, view.clone() as Arc<dyn WorkflowView>, config);
    let interactive = io::stdin().is_terminal();

    let file = SelectedFile::from_path(&args.file)
        .await
        .context("Failed to read card")?;

    // ── Submit, re-asking for the password while it is wrong ────────────
    let mut password = args.password.clone();
    let outcome = loop {
        let submit = Event::Submit {
            file: Some(file.clone()),
            password: password.clone(),
        };
        match workflow.dispatch(submit).await {
            Ok(Outcome::NeedsDob { yob }) => {
                break confirm_dob(&mut workflow, &yob, args.dob.clone(), interactive).await?;
            }
            Ok(outcome) => break outcome,
            Err(WorkflowError::WrongPassword { .. }) if interactive => {
                let entered = prompt("Password (blank to give up): ".into()).await?;
                if entered.trim().is_empty() {
                    anyhow::bail!("No password given");
                }
                password = Some(entered);
            }
            Err(e) => return Err(e).context("Generation failed"),
        }
    };

    let rendered = match outcome {
        Outcome::Generated(rendered) => rendered,
        Outcome::DobCancelled => {
            eprintln!("{}", dim("Cancelled."));
            return Ok(());
        }
        other => anyhow::bail!("Unexpected outcome: {other:?}"),
    };

    if args.save_images {
        save_previews(&view, &rendered, &args.output_dir).await?;
    }

    if args.pdf {
        match workflow.dispatch(Event::Export).await {
            Ok(Outcome::Exported(path)) => {
                if cli.quiet {
                    println!("{}", path.display());
                }
            }
            Ok(other) => anyhow::bail!("Unexpected outcome: {other:?}"),
            Err(e) => return Err(e).context("PDF download failed"),
        }
    }

    Ok(())
}

/// Answer the date-of-birth prompt from `--dob`, then from stdin.
async fn confirm_dob(
    workflow: &mut Workflow<HttpBackend>,
    yob: &str,
    mut preset: Option<String>,
    interactive: bool,
) -> Result<Outcome> {
    loop {
        let date = match preset.take() {
            Some(d) => d,
            None if interactive => {
                prompt(format!("Date of birth in {yob} (yyyy-mm-dd, blank to cancel): ")).await?
            }
            None => anyhow::bail!("The card only shows the year {yob}; pass --dob yyyy-mm-dd"),
        };

        if date.trim().is_empty() {
            return workflow
                .dispatch(Event::CancelDob)
                .await
                .context("Failed to cancel");
        }

        match workflow
            .dispatch(Event::ConfirmDob { date: Some(date) })
            .await
        {
            Ok(outcome) => return Ok(outcome),
            // The view already printed the inline reason; ask again.
            Err(_) if interactive => continue,
            Err(e) => return Err(e).context("Date of birth not accepted"),
        }
    }
}

async fn save_previews(view: &CliView, rendered: &RenderedResult, dir: &Path) -> Result<()> {
    for (load, fallback) in [(&rendered.front, "front.png"), (&rendered.back, "back.png")] {
        let Ok(image) = &load.result else {
            view.line(format!("{} {}", cyan("⚠"), dim(&format!("skipping {}", load.url))));
            continue;
        };
        let path = dir.join(preview_file_name(&load.url, fallback));
        aadhaar_gen_client::export::write_download(&path, &image.bytes)
            .await
            .with_context(|| format!("Failed to save {}", path.display()))?;
        view.line(format!(
            "{} saved {}  {}",
            green("✔"),
            bold(&path.display().to_string()),
            dim(&format!("{}x{}", image.width, image.height))
        ));
    }
    Ok(())
}

/// Last path segment of a preview URL, ignoring any query or fragment.
fn preview_file_name(url: &str, fallback: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback.to_string())
}

/// Read one trimmed line from stdin without stalling the runtime.
async fn prompt(label: String) -> Result<String> {
    read_answer(label, io::BufReader::new(io::stdin())).await
}

async fn read_answer<R>(label: String, mut reader: R) -> Result<String>
where
    R: BufRead + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<String> {
        let mut stderr = io::stderr();
        write!(stderr, "{label}").ok();
        stderr.flush().ok();
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        Ok(line.trim().to_string())
    })
    .await
    .context("stdin reader stopped")?
}
