use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tadmin::api::auth::{Credentials, LoginDetails};
use tadmin::api::client::ApiClient;
use tadmin::api::error::format_api_error;
use tadmin::app::App;
use tadmin::config::{Config, ENV_PASSWORD, ENV_TOKEN};
use tadmin::resource::ResourceApi;
use tadmin::ui::splash::{render as render_splash, SplashState};
use tadmin::{event, ui};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Terminal admin console for the mentorship API
#[derive(Parser, Debug)]
#[command(name = "tadmin", version, about, long_about = None)]
struct Args {
    /// API base URL (default http://localhost:8000)
    #[arg(short, long)]
    api_url: Option<String>,

    /// Account to sign in with; the password is read from TADMIN_PASSWORD
    #[arg(short, long)]
    email: Option<String>,

    /// Pre-issued bearer token (or TADMIN_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Resource to open: items, users, questionnaires or mentors
    #[arg(short, long)]
    resource: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Run in read-only mode (block all write operations)
    #[arg(long)]
    readonly: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tadmin started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("tadmin").join("tadmin.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tadmin").join("tadmin.log");
    }
    PathBuf::from("tadmin.log")
}

/// Token (flag, then environment) or email plus TADMIN_PASSWORD
fn resolve_credentials(args: &Args, config: &Config) -> Result<Credentials> {
    let token = args
        .token
        .clone()
        .or_else(|| std::env::var(ENV_TOKEN).ok())
        .filter(|token| !token.trim().is_empty());
    if let Some(token) = token {
        return Ok(Credentials::with_token(token.trim()));
    }

    let email = config.effective_email(args.email.as_deref()).with_context(|| {
        format!(
            "No credentials. Pass --token (or set {}), or --email with {} set",
            ENV_TOKEN, ENV_PASSWORD
        )
    })?;
    let password = std::env::var(ENV_PASSWORD)
        .with_context(|| format!("{} must be set to sign in as {}", ENV_PASSWORD, email))?;

    Ok(Credentials::with_login(LoginDetails { email, password }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = initialize_with_splash(&mut terminal, &args).await;

    match result {
        Ok(Some(mut app)) => {
            // The loop blocks on terminal polling; fetches run on the other workers
            let run_result = tokio::task::block_in_place(|| run_app(&mut terminal, &mut app));
            cleanup_terminal(&mut terminal)?;

            if let Err(err) = run_result {
                eprintln!("Error: {err:?}");
            }
        }
        Ok(None) => {
            cleanup_terminal(&mut terminal)?;
        }
        Err(err) => {
            cleanup_terminal(&mut terminal)?;
            eprintln!("Initialization error: {err:?}");
        }
    }

    Ok(())
}

fn cleanup_terminal<B: Backend + std::io::Write>(terminal: &mut Terminal<B>) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

async fn initialize_with_splash<B: Backend>(
    terminal: &mut Terminal<B>,
    args: &Args,
) -> Result<Option<App>>
where
    B::Error: Send + Sync + 'static,
{
    let mut splash = SplashState::new();
    terminal.draw(|f| render_splash(f, &splash))?;

    if check_abort()? {
        return Ok(None);
    }

    // Step 1: configuration
    splash.set_message("Loading configuration");
    terminal.draw(|f| render_splash(f, &splash))?;

    let config = Config::load();
    let api_url = config.effective_api_url(args.api_url.as_deref());
    let kind = config.effective_resource(args.resource.as_deref());
    tracing::info!("Using API: {}, resource: {}", api_url, kind.key());
    splash.complete_step();

    if check_abort()? {
        return Ok(None);
    }

    // Step 2: client
    splash.set_message(&format!("Connecting to {}", api_url));
    terminal.draw(|f| render_splash(f, &splash))?;

    let credentials = resolve_credentials(args, &config)?;
    let client = ApiClient::new(&api_url, credentials)?;
    splash.complete_step();

    if check_abort()? {
        return Ok(None);
    }

    // Step 3: sign in
    splash.set_message("Signing in");
    terminal.draw(|f| render_splash(f, &splash))?;

    if let Err(e) = client.authenticate().await {
        let message = format_api_error(&e);
        splash.set_message(&format!("Error: {}", message));
        terminal.draw(|f| render_splash(f, &splash))?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        return Err(anyhow::anyhow!("Sign-in failed: {}", message));
    }
    splash.complete_step();

    if check_abort()? {
        return Ok(None);
    }

    // Step 4: first page
    splash.set_message(&format!("Fetching {}", kind.key()));
    terminal.draw(|f| render_splash(f, &splash))?;

    let api: Arc<dyn ResourceApi> = Arc::new(client);
    let mut app = App::new(api, kind, api_url, config, args.readonly);
    app.load_current();

    splash.complete_step();
    splash.set_message("Ready!");
    terminal.draw(|f| render_splash(f, &splash))?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    Ok(Some(app))
}

fn check_abort() -> Result<bool> {
    if poll(Duration::from_millis(50))? {
        if let Event::Key(key) = read()? {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Draw, handle one key (100ms poll), then apply finished fetches and mutations
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::handle_events(app)? {
            return Ok(());
        }

        app.drain_background();
    }
}
