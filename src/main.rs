use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dashwatch::events;
use dashwatch::source::{FileSource, HttpSource, PayloadFormat, SnapshotSource};
use dashwatch::ui;
use dashwatch::{App, PollOutcome, Poller, Settings};

/// Upper bound on how long the loop waits before checking input again.
const FRAME: Duration = Duration::from_millis(50);

// Minimum terminal size for usable display
const MIN_WIDTH: u16 = 60;
const MIN_HEIGHT: u16 = 12;

#[derive(Parser, Debug)]
#[command(name = "dashwatch")]
#[command(about = "Live operational metrics dashboard for the terminal")]
struct Args {
    /// Settings file (TOML); the built-in layout is used without one
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read snapshots from a file
    #[arg(short, long, default_value = "metrics.json", conflicts_with = "url")]
    file: PathBuf,

    /// Poll snapshots from an HTTP endpoint
    #[arg(short, long)]
    url: Option<String>,

    /// Payload format served by the file or endpoint
    #[arg(long, value_enum, default_value = "json")]
    format: PayloadFormat,

    /// Refresh period (e.g., "1s", "500ms")
    #[arg(short, long)]
    refresh: Option<String>,

    /// History window in minutes
    #[arg(short, long)]
    interval: Option<u32>,

    /// Write logs to this file (the terminal belongs to the dashboard)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let settings = load_settings(&args)?;
    let source = build_source(&args)?;
    info!(
        source = source.description(),
        refresh = ?settings.refresh,
        interval_minutes = settings.interval_minutes,
        "starting dashboard"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, run_tui(source, settings))
}

/// Log to a file, filtered by `RUST_LOG` (default `info`).
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Settings file and environment first, then command-line overrides.
fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(refresh) = &args.refresh {
        settings.set_refresh(refresh)?;
    }
    if let Some(minutes) = args.interval {
        settings.set_interval(minutes)?;
    }
    Ok(settings)
}

fn build_source(args: &Args) -> Result<Box<dyn SnapshotSource>> {
    Ok(match &args.url {
        Some(url) => Box::new(HttpSource::new(url.as_str(), args.format)?),
        None => Box::new(FileSource::with_format(&args.file, args.format)),
    })
}

/// Run the TUI with the given snapshot source
async fn run_tui(source: Box<dyn SnapshotSource>, settings: Settings) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let poller = Rc::new(Poller::new(
        source,
        settings.retry,
        settings.interval_minutes,
    ));
    let refresh = settings.refresh;
    let mut app = App::new(settings, poller.description());

    let result = run_app(&mut terminal, &mut app, poller, refresh).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    poller: Rc<Poller>,
    refresh: Duration,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<PollOutcome>();

    // Polls run as local tasks and report back; the loop stays responsive
    // while a slow fetch retries.
    let spawn_poll = |user_initiated: bool| {
        let poller = Rc::clone(&poller);
        let tx = tx.clone();
        tokio::task::spawn_local(async move {
            let outcome = if user_initiated {
                poller.refresh().await
            } else {
                poller.poll().await
            };
            let _ = tx.send(outcome);
        });
    };

    let mut ticker = tokio::time::interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while app.running {
        terminal.draw(|frame| draw(frame, app))?;

        tokio::select! {
            _ = ticker.tick() => spawn_poll(false),
            Some(outcome) = rx.recv() => {
                app.apply(outcome);
            }
            _ = tokio::time::sleep(FRAME) => {}
        }

        while let Some(event) = events::poll_event(Duration::ZERO)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        if app.take_refresh_request() {
            poller.set_interval_minutes(app.interval_minutes);
            spawn_poll(true);
        }
        app.tick(Instant::now());
    }

    Ok(())
}

fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Check for minimum terminal size
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5)
            .intersection(area);
        frame.render_widget(paragraph, centered);
        return;
    }

    let banner = if app.degraded().is_some() { 1 } else { 0 };
    let chunks = Layout::vertical([
        Constraint::Length(1),      // Header bar
        Constraint::Length(banner), // Degraded banner
        Constraint::Min(8),         // Dashboard
        Constraint::Length(1),      // Status bar
    ])
    .split(area);

    ui::render_header(frame, app, chunks[0]);
    ui::render_degraded_banner(frame, app, chunks[1]);
    ui::render_status_bar(frame, app, chunks[3]);

    // Drawn after the status bar so the tooltip stays on top
    ui::render_dashboard(frame, app, chunks[2]);

    if app.show_help {
        ui::render_help(frame, app, area);
    }
}
