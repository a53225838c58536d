//! Terminal management and main run loop
//!
//! The loop itself is synchronous. Network work is spawned onto the tokio
//! runtime and reports back through an unbounded channel that is drained once
//! per tick.

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use flowdeck_core::loader::{execute as run_ticket, LoadKind, LoadResponse, LoadTicket, RequestToken};
use flowdeck_core::{
    CategoryMap, Controller, DeckConfig, DetailFetch, HttpApi, PreferenceStore, Preferences,
    WorkflowApi,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

use super::app::App;
use super::event::{handle_key, poll_event, HandleResult};
use super::ui;
use crate::clipboard;
use crate::commands::download_target;

/// Work finished off the UI thread
#[derive(Debug)]
enum Incoming {
    Load {
        token: RequestToken,
        kind: LoadKind,
        result: flowdeck_core::Result<LoadResponse>,
    },
    Json {
        session: u64,
        result: flowdeck_core::Result<serde_json::Value>,
    },
    Diagram {
        session: u64,
        result: flowdeck_core::Result<String>,
    },
    Downloaded {
        filename: String,
        result: Result<PathBuf>,
    },
}

/// Spawns network work and routes results back to the loop
struct Dispatcher {
    handle: Handle,
    api: Arc<HttpApi>,
    tx: UnboundedSender<Incoming>,
    download_dir: PathBuf,
}

impl Dispatcher {
    fn load(&self, ticket: LoadTicket, mappings: Arc<CategoryMap>) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = run_ticket(api.as_ref(), &ticket, mappings).await;
            let _ = tx.send(Incoming::Load {
                token: ticket.token,
                kind: ticket.kind,
                result,
            });
        });
    }

    fn fetch(&self, fetch: DetailFetch) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let message = match fetch {
                DetailFetch::Json { session, filename } => Incoming::Json {
                    session,
                    result: api.workflow_json(&filename).await,
                },
                DetailFetch::Diagram { session, filename } => Incoming::Diagram {
                    session,
                    result: api.workflow_diagram(&filename).await,
                },
            };
            let _ = tx.send(message);
        });
    }

    fn download(&self, filename: String) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let target = download_target(&filename, None, &self.download_dir);
        self.handle.spawn(async move {
            let result = async {
                let body = api.download(&filename).await?;
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .context(format!("Failed to create {:?}", parent))?;
                }
                tokio::fs::write(&target, &body)
                    .await
                    .context(format!("Failed to write {:?}", target))?;
                Ok::<_, anyhow::Error>(target)
            }
            .await;
            let _ = tx.send(Incoming::Downloaded { filename, result });
        });
    }
}

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Run the interactive browser until the user quits
pub fn run(config: DeckConfig, handle: Handle) -> Result<()> {
    let api = HttpApi::with_timeout(&config.api.base_url, config.timeout())
        .context("Failed to create API client")?;
    let prefs = PreferenceStore::default();
    let theme = prefs.load().theme;

    let controller = Controller::new(config.browse.page_size, config.browse.category_page_size);
    let mut app = App::new(controller, config.debounce(), theme);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher {
        handle,
        api: Arc::new(api),
        tx,
        download_dir: config.download_dir(),
    };

    match app.controller.begin_initial() {
        Ok(ticket) => {
            app.started(&ticket);
            dispatcher.load(ticket, app.controller.category_map());
        }
        Err(e) => app.set_status(e.to_string()),
    }

    let mut terminal = init_terminal()?;
    let result = run_loop(&mut terminal, &mut app, &dispatcher, &mut rx, &prefs);

    // Restore terminal (even if loop failed)
    restore_terminal(&mut terminal)?;
    info!("browser closed");

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    dispatcher: &Dispatcher,
    rx: &mut UnboundedReceiver<Incoming>,
    prefs: &PreferenceStore,
) -> Result<()> {
    loop {
        let now = Instant::now();
        terminal.draw(|frame| ui::render(frame, app, now))?;

        if let Some(Event::Key(key)) = poll_event(app.tick(Instant::now()))? {
            if key.kind == KeyEventKind::Press {
                match handle_key(app, key, Instant::now()) {
                    HandleResult::Quit => app.should_quit = true,
                    HandleResult::Continue => {}
                    HandleResult::Load(ticket) => {
                        dispatcher.load(ticket, app.controller.category_map())
                    }
                    HandleResult::Fetch(fetch) => dispatcher.fetch(fetch),
                    HandleResult::Copy => copy_current(app),
                    HandleResult::Download(filename) => {
                        app.set_status(format!("Downloading {}…", filename));
                        dispatcher.download(filename);
                    }
                    HandleResult::ToggleTheme => toggle_theme(app, prefs),
                }
            }
        }

        if let Some(ticket) = app.poll_debounce(Instant::now()) {
            dispatcher.load(ticket, app.controller.category_map());
        }

        while let Ok(message) = rx.try_recv() {
            apply_incoming(app, message);
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn apply_incoming(app: &mut App, message: Incoming) {
    match message {
        Incoming::Load {
            token,
            kind,
            result,
        } => app.apply_load(token, kind, result),
        Incoming::Json { session, result } => {
            app.overlay.apply_json(session, result);
        }
        Incoming::Diagram { session, result } => {
            app.overlay.apply_diagram(session, result);
        }
        Incoming::Downloaded { filename, result } => match result {
            Ok(path) => {
                info!(filename = %filename, target = %path.display(), "download saved");
                app.set_status(format!("Saved {}", path.display()));
            }
            Err(e) => {
                error!(filename = %filename, error = %e, "download failed");
                app.set_status(format!("Download failed: {}", e));
            }
        },
    }
}

fn copy_current(app: &mut App) {
    let Some(overlay) = app.overlay.current_mut() else {
        return;
    };
    let Some(text) = overlay.copy_text().map(str::to_string) else {
        app.set_status("Nothing to copy yet");
        return;
    };

    match clipboard::copy(&text) {
        Ok(backend) => {
            overlay.mark_copied(Instant::now());
            info!(backend, bytes = text.len(), "copied to clipboard");
        }
        Err(e) => {
            warn!(error = %e, "copy failed");
            app.set_status(format!("Copy failed: {}", e));
        }
    }
}

fn toggle_theme(app: &mut App, prefs: &PreferenceStore) {
    app.theme = app.theme.toggled();
    if let Err(e) = prefs.save(&Preferences { theme: app.theme }) {
        warn!(error = %e, "failed to persist theme");
        app.set_status(format!("Theme not saved: {}", e));
    }
}
