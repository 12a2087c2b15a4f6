//! textcore entrypoint.
//!
//! Headless driver for the editing core: opens a file into a
//! `DisplayManager`, optionally runs find / replace-all and scrolls, then
//! prints the visible page with its line-number gutter.
use anyhow::{Context, Result, bail};
use clap::Parser;
use core_config::load_from;
use core_events::{EditorEvent, event_channel};
use core_model::DisplayManager;
use core_text::breaks::is_break_char;
use core_text::{Document, FsPersistence, SearchOptions};
use crossbeam_channel::Receiver;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tracing::{info, trace};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "textcore.log";
const ESTIMATE_TIMEOUT: Duration = Duration::from_secs(5);

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "textcore", version, about = "Headless text layout and editing driver")]
struct Args {
    /// File to open (UTF-8 text). A missing file starts an empty buffer.
    pub path: Option<PathBuf>,
    /// Configuration file (overrides discovery of `textcore.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Viewport width in cells.
    #[arg(long, default_value_t = 80)]
    pub width: u16,
    /// Viewport height in rows.
    #[arg(long, default_value_t = 24)]
    pub height: u16,
    /// Pattern to find; the first match at or after the caret is highlighted.
    #[arg(long)]
    pub find: Option<String>,
    /// Replace every `--find` match with this text.
    #[arg(long, requires = "find")]
    pub replace: Option<String>,
    /// Treat `--find` as a regular expression.
    #[arg(long)]
    pub regex: bool,
    #[arg(long = "match-case")]
    pub match_case: bool,
    /// Visual lines to scroll before printing (negative scrolls up).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub scroll: isize,
    /// Save the buffer back to PATH after editing.
    #[arg(long, requires = "path")]
    pub write: bool,
    /// Print the visible page.
    #[arg(long)]
    pub dump: bool,
}

impl Args {
    fn search_options(&self) -> SearchOptions {
        let options = if self.regex {
            SearchOptions::regex()
        } else {
            SearchOptions::literal()
        };
        options.match_case(self.match_case)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct RunSummary {
    content_lines: usize,
    visual_lines: usize,
    first_line: usize,
    matches: usize,
    replaced: usize,
    events: usize,
    page: Vec<String>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines ({} visual), top {}, {} matches, {} replaced",
            self.content_lines, self.visual_lines, self.first_line, self.matches, self.replaced
        )
    }
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .with_ansi(false)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global subscriber already installed; dropping the guard stops the writer.
            }
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

/// Drain published events into the log. Returns how many were seen.
fn drain_events(events: &Receiver<EditorEvent>) -> usize {
    let mut seen = 0;
    for event in events.try_iter() {
        trace!(target: "runtime.events", ?event, "event");
        seen += 1;
    }
    seen
}

/// Visible lines with the gutter applied. Continuation lines of a wrapped
/// paragraph get a blank gutter.
fn render_page(display: &mut DisplayManager) -> Vec<String> {
    let digits = display.gutter_digits();
    let rows: Vec<_> = display
        .visible_lines()
        .iter()
        .map(|l| (l.begin, l.text.trim_end_matches(is_break_char).to_string()))
        .collect();
    let mut previous = None;
    rows.into_iter()
        .map(|(begin, text)| {
            if digits == 0 {
                return text;
            }
            let line = display.content_line_at(begin);
            let gutter = if previous == Some(line) {
                " ".repeat(digits)
            } else {
                format!("{:>digits$}", line + 1)
            };
            previous = Some(line);
            format!("{gutter} {text}")
        })
        .collect()
}

fn run(args: &Args) -> Result<RunSummary> {
    let mut config = load_from(args.config.clone())?;
    config.apply_context(args.height);
    let settings = config.settings();
    let width = f32::from(args.width) * settings.cell_width;
    let height = f32::from(args.height) * settings.line_height;

    let (sink, events) = event_channel();
    let mut display = DisplayManager::new(Document::new(), settings, width, height, Box::new(sink));
    let mut summary = RunSummary::default();

    if let Some(path) = args.path.as_ref() {
        if path.exists() {
            display
                .load_file(path, &FsPersistence)
                .with_context(|| format!("opening {}", path.display()))?;
        } else {
            info!(target: "runtime.startup", path = %path.display(), "new_file");
        }
    }
    info!(
        target: "runtime.startup",
        path = args.path.as_ref().map(|p| p.display().to_string()).as_deref(),
        config_override = args.config.is_some(),
        width = args.width,
        height = args.height,
        "bootstrap_complete"
    );
    summary.events += drain_events(&events);

    if let Some(pattern) = args.find.as_deref() {
        let options = args.search_options();
        summary.matches = display.find_all(pattern, options).len();
        if let Some(replacement) = args.replace.as_deref() {
            summary.replaced = display.replace_all_text(pattern, replacement, options);
        }
        summary.events += drain_events(&events);
    }

    if args.scroll != 0 {
        display.scroll_by(args.scroll);
    }
    display.wait_for_estimate(ESTIMATE_TIMEOUT);
    summary.events += drain_events(&events);

    if args.write {
        let Some(path) = args.path.as_ref() else {
            bail!("--write needs a PATH");
        };
        display
            .save_file(path, &FsPersistence)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(target: "runtime", path = %path.display(), "saved");
    }

    summary.content_lines = display.content_lines();
    summary.visual_lines = display.total_lines();
    summary.first_line = display.first_line_index();
    summary.page = render_page(&mut display);
    info!(
        target: "runtime",
        content_lines = summary.content_lines,
        visual_lines = summary.visual_lines,
        events = summary.events,
        "run_complete"
    );
    Ok(summary)
}

fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let summary = run(&args)?;
    if args.dump {
        for line in &summary.page {
            println!("{line}");
        }
    }
    println!("{summary}");
    info!(target: "runtime", "shutdown");
    Ok(())
}
