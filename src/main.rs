mod backend;
mod config;
mod proxy;
mod tasks;
#[cfg(test)]
mod testutil;
mod ui;

use anyhow::{Context, Result};
use backend::api::ApiClient;
use clap::{Parser, Subcommand};
use config::Config;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use ratatui_image::picker::Picker;
use std::io;
use std::time::{Duration, Instant};
use tasks::BackgroundTask;
use tokio::sync::mpsc;
use ui::app::{App, Effect};
use ui::ui::ui;

#[derive(Parser, Debug)]
#[command(name = "mangaview", about = "Browse and read manga from a catalog API")]
struct Args {
    /// Upstream API base address (overrides MANGA_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Route requests through a running forwarder (overrides MANGA_PROXY_URL)
    #[arg(long, global = true)]
    proxy_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the terminal reader (default)
    Read {
        /// Initial catalog location, e.g. "?search=naruto&page=2"
        #[arg(long, default_value = "")]
        location: String,
    },
    /// Serve /proxy/* in front of the upstream API
    Proxy {
        /// Listen port (overrides MANGA_PROXY_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn init_logging(to_file: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("mangaview=info"));

    // The terminal belongs to the UI while reading.
    if to_file {
        let file = dirs::cache_dir()
            .map(|dir| dir.join("mangaview"))
            .and_then(|dir| {
                std::fs::create_dir_all(&dir).ok()?;
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(dir.join("mangaview.log"))
                    .ok()
            });
        match file {
            Some(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            None => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }

    builder.init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load();
    if let Some(url) = args.api_url.filter(|u| !u.trim().is_empty()) {
        config.api_url = Some(url);
    }
    if let Some(url) = args.proxy_url.filter(|u| !u.trim().is_empty()) {
        config.proxy_url = Some(url);
    }

    match args.command.unwrap_or(Command::Read {
        location: String::new(),
    }) {
        Command::Proxy { port } => {
            init_logging(false);
            let port = port.unwrap_or(config.proxy_port);
            let state = proxy::types::ProxyState::new(config.api_url)
                .context("failed to build HTTP client")?;
            proxy::server::serve(port, state).await
        }
        Command::Read { location } => {
            init_logging(true);
            run_reader(&config, &location).await
        }
    }
}

async fn run_reader(config: &Config, location: &str) -> Result<()> {
    let client = ApiClient::new(config.endpoint()).context("failed to build HTTP client")?;
    log::info!("Starting reader against {:?}", client.endpoint());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Must run after raw mode is on, before the event stream starts.
    let picker = match Picker::from_query_stdio() {
        Ok(picker) => Some(picker),
        Err(e) => {
            log::warn!("No terminal image support: {}", e);
            None
        }
    };

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let debounce = Duration::from_millis(config.search_debounce_ms);
    let mut app = App::new(picker, debounce, location);

    let res = run_app(&mut terminal, &mut app, &client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        log::error!("{:#}", err);
    }
    res
}

/// Carries out effects; returns false once the app asked to quit.
fn execute_effects(
    effects: Vec<Effect>,
    client: &ApiClient,
    task_tx: &mpsc::UnboundedSender<BackgroundTask>,
) -> bool {
    let mut running = true;
    for effect in effects {
        match effect {
            Effect::Fetch(fetch) => tasks::spawn(client, fetch, task_tx.clone()),
            Effect::OpenLink(url) => {
                if let Err(e) = webbrowser::open(&url) {
                    log::warn!("Failed to open {}: {}", url, e);
                }
            }
            Effect::Quit => running = false,
        }
    }
    running
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: &ApiClient,
) -> Result<()> {
    let (task_tx, mut task_rx) = mpsc::unbounded_channel::<BackgroundTask>();
    let mut event_stream = EventStream::new();

    let initial = app.load_catalog();
    execute_effects(initial, client, &task_tx);

    loop {
        terminal.draw(|f| ui(f, app))?;

        let effects = tokio::select! {
            // Wakes the loop for the search debounce and the spinner.
            _ = tokio::time::sleep(Duration::from_millis(50)) => app.tick(Instant::now()),

            Some(event) = event_stream.next() => match event? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    ui::input::handle_key(app, key.code)
                }
                _ => Vec::new(),
            },

            Some(task) = task_rx.recv() => app.apply(task),
        };

        if !execute_effects(effects, client, &task_tx) {
            return Ok(());
        }
    }
}
