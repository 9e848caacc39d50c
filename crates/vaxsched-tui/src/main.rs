//! vaxsched - a terminal front-end for the vaccination schedule service.
//!
//! Shows a login form until a session token is held, then lists the signed-in
//! doctor's patients with their vaccination schedule.

mod app;
mod ui;
mod utils;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use ui::{handle_input, render};
use vaxsched_core::api::ApiClient;
use vaxsched_core::auth::{FileSessionStore, KeyringSessionStore, MemorySessionStore, SessionStore};
use vaxsched_core::config::{Config, SessionBackend};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix inside the data directory
const LOG_FILE_PREFIX: &str = "vaxsched.log";

/// Environment variables that prefill the login form
const ENV_USERNAME: &str = "VAXSCHED_USERNAME";
const ENV_PASSWORD: &str = "VAXSCHED_PASSWORD";

/// Initialize the tracing subscriber for logging.
///
/// The terminal belongs to the UI, so logs go to a daily file in the data
/// directory. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config.data_dir().ok()?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Some(guard)
}

fn open_session_store(config: &Config, no_persist: bool) -> Result<Box<dyn SessionStore>> {
    if no_persist {
        return Ok(Box::new(MemorySessionStore::new()));
    }
    match config.session_backend {
        SessionBackend::File => Ok(Box::new(FileSessionStore::open(config.data_dir()?))),
        SessionBackend::Keyring => Ok(Box::new(KeyringSessionStore::open()?)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let _log_guard = init_tracing(&config);
    info!(api = %config.api_base_url, "vaxsched starting");

    // Check for CLI commands
    let args: Vec<String> = std::env::args().skip(1).collect();
    let has_flag = |flag: &str| args.iter().any(|a| a == flag);

    let api = ApiClient::from_config(&config)?;

    if has_flag("--check") {
        return check_health(&api).await;
    }

    let mut session = open_session_store(&config, has_flag("--no-persist"))?;

    if has_flag("--logout") {
        session.clear()?;
        println!("Logged out.");
        return Ok(());
    }

    let config_path = Config::config_path().ok();
    let mut app = App::new(config, config_path, session, api);

    if has_flag("--login") {
        return app.login_interactive().await;
    }

    if let Ok(username) = std::env::var(ENV_USERNAME) {
        app.login_username = username;
    }
    if let Ok(password) = std::env::var(ENV_PASSWORD) {
        app.login_password = password;
    }
    if app.state == AppState::LoggingIn {
        app.start_login();
    } else {
        app.activate();
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("vaxsched shutting down");
    Ok(())
}

/// Print the service health status and exit non-zero when unreachable.
async fn check_health(api: &ApiClient) -> Result<()> {
    match api.health().await {
        Ok(status) => {
            println!("{}: {}", api.base_url(), status);
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Health check failed");
            Err(anyhow::anyhow!("{} is not reachable: {}", api.base_url(), e))
        }
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
