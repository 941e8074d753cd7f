// Event handling and main UI loop

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::engine::reload::ConfigWatcher;
use crate::ui::orchestrator::{
    ConfigFileSource, GenerationSource, KeyOutcome, Orchestrator, ReloadOutcome,
};

// Event types sent from helper threads to the main loop
pub enum UiEvent {
    Input(Event),  // Keyboard, resize and other terminal events
    ConfigChanged, // The watched config file was written
}

/// Spawn a dedicated thread for terminal event polling.
fn spawn_event_thread(tx: Sender<UiEvent>) {
    let poll_timeout = Duration::from_millis(250);

    thread::spawn(move || {
        loop {
            match event::poll(poll_timeout) {
                Ok(true) => {
                    if let Ok(evt) = event::read() {
                        if tx.send(UiEvent::Input(evt)).is_err() {
                            break; // Main thread dropped the receiver
                        }
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("terminal event poll failed: {}", e);
                    break;
                }
            }
        }
    });
}

fn watch_config(path: &Path, tx: Sender<UiEvent>) -> Option<ConfigWatcher> {
    match ConfigWatcher::spawn(path, move || {
        let _ = tx.send(UiEvent::ConfigChanged);
    }) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!("hot reload disabled: {:#}", e);
            None
        }
    }
}

pub fn run_ui(config_path: &Path) -> Result<()> {
    // Setup terminal with alternate screen (full terminal)
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Arc::new(Mutex::new(Terminal::new(backend)?));

    let (event_tx, event_rx) = mpsc::channel();
    spawn_event_thread(event_tx.clone());
    let _watcher = watch_config(config_path, event_tx);

    let result = match Orchestrator::new(Arc::clone(&terminal), ConfigFileSource::new(config_path)) {
        Ok(mut orchestrator) => run_app(&mut orchestrator, event_rx),
        Err(e) => Err(e.into()),
    };

    // Restore terminal. The orchestrator has stopped by now, so nothing else
    // holds the lock.
    {
        let mut terminal = terminal.lock().unwrap_or_else(|e| e.into_inner());
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
    }

    if result.is_ok() {
        println!("{}", exit_message(config_path));
    }
    result
}

/// Printed once the terminal is back to normal after a clean quit.
pub fn exit_message(config_path: &Path) -> String {
    format!(
        "paneldash stopped. Dashboard config: {}",
        config_path.display()
    )
}

fn next_event(event_rx: &Receiver<UiEvent>, retry_at: Option<Instant>) -> Option<UiEvent> {
    match retry_at {
        // A deferred reload is due once the wait runs out
        Some(at) => match event_rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
            Ok(evt) => Some(evt),
            Err(RecvTimeoutError::Timeout) => Some(UiEvent::ConfigChanged),
            Err(RecvTimeoutError::Disconnected) => None,
        },
        None => event_rx.recv().ok(),
    }
}

pub fn run_app<B, S>(orchestrator: &mut Orchestrator<B, S>, event_rx: Receiver<UiEvent>) -> Result<()>
where
    B: ratatui::backend::Backend + Send + 'static,
    S: GenerationSource,
{
    // Set while a config change waits out the reload debounce
    let mut retry_at: Option<Instant> = None;

    loop {
        let Some(evt) = next_event(&event_rx, retry_at) else {
            // Every sender is gone, nothing can drive the UI any more
            orchestrator.exit();
            return Ok(());
        };

        match evt {
            UiEvent::Input(Event::Key(key)) => {
                if orchestrator.handle_key(key) == KeyOutcome::Quit {
                    return Ok(());
                }
            }
            UiEvent::Input(Event::Resize(_, _)) => orchestrator.request_redraw(),
            UiEvent::Input(_) => {}
            UiEvent::ConfigChanged => {
                retry_at = None;
                match orchestrator.reload()? {
                    ReloadOutcome::Reloaded(id) => {
                        tracing::debug!(generation = id, "reload applied")
                    }
                    ReloadOutcome::Deferred(delay) => retry_at = Some(Instant::now() + delay),
                    ReloadOutcome::Rejected(_) => {} // Already logged and shown
                }
            }
        }
    }
}
