// Application orchestrator: owns the live generation, routes keys and
// performs hot reloads

use crossterm::event::KeyEvent;
use ratatui::{Terminal, backend::Backend};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::Config;
use crate::engine::generation::{Generation, GenerationError};
use crate::engine::reload::ReloadGate;
use crate::engine::widget::PanelKey;
use crate::ui::display::{DisplayCoordinator, Screen};
use crate::ui::focus::{FocusState, FocusTracker};
use crate::ui::keys::{KeyCommand, classify};
use crate::ui::layout::GridLayout;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("failed to start display: {0}")]
    Display(#[from] io::Error),
}

/// Where generations come from. Production re-reads the config file; tests
/// supply prepared widget sets.
pub trait GenerationSource {
    fn build(&mut self, id: u64) -> Result<(Generation, GridLayout), GenerationError>;
}

/// Re-parses the config file on every build.
pub struct ConfigFileSource {
    path: PathBuf,
}

impl ConfigFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GenerationSource for ConfigFileSource {
    fn build(&mut self, id: u64) -> Result<(Generation, GridLayout), GenerationError> {
        let config = Config::load_from(&self.path)?;
        let generation = Generation::from_config(id, &config)?;
        Ok((generation, GridLayout::from_config(&config.grid)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    /// The orchestrator has stopped everything; the host should exit
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The new generation with this id is live
    Reloaded(u64),
    /// Too soon after the last reload; retry after this delay
    Deferred(Duration),
    /// The new configuration was unusable; the previous generation keeps running
    Rejected(String),
}

struct Live {
    generation: Generation,
    screen: Arc<Screen>,
    display: DisplayCoordinator,
    focus: FocusTracker,
}

pub struct Orchestrator<B, S>
where
    B: Backend + Send + 'static,
    S: GenerationSource,
{
    terminal: Arc<Mutex<Terminal<B>>>,
    source: S,
    live: Option<Live>,
    next_id: u64,
    gate: ReloadGate,
}

impl<B, S> Orchestrator<B, S>
where
    B: Backend + Send + 'static,
    S: GenerationSource,
{
    /// Build, validate and start the first generation.
    pub fn new(terminal: Arc<Mutex<Terminal<B>>>, source: S) -> Result<Self, StartupError> {
        Self::with_gate(terminal, source, ReloadGate::default())
    }

    pub fn with_gate(
        terminal: Arc<Mutex<Terminal<B>>>,
        mut source: S,
        gate: ReloadGate,
    ) -> Result<Self, StartupError> {
        let (generation, layout) = source.build(1)?;

        let mut orchestrator = Self {
            terminal,
            source,
            live: None,
            next_id: 2,
            gate,
        };
        orchestrator.start_live(generation, layout)?;
        Ok(orchestrator)
    }

    fn start_live(&mut self, mut generation: Generation, layout: GridLayout) -> io::Result<()> {
        debug_assert!(self.live.is_none(), "previous generation still live");

        let Some(drain) = generation.take_drain() else {
            return Err(io::Error::other("generation has no redraw drain"));
        };
        let screen = Arc::new(Screen::new(
            generation.id(),
            generation.widgets().to_vec(),
            layout,
        ));
        let display = DisplayCoordinator::spawn(Arc::clone(&self.terminal), Arc::clone(&screen), drain)?;
        let focus = FocusTracker::new(generation.widgets().iter().map(|w| w.settings()));

        generation.start();
        generation.request_redraw();

        self.live = Some(Live {
            generation,
            screen,
            display,
            focus,
        });
        Ok(())
    }

    /// Stop widgets, join every loop, close the redraw signal and join the
    /// display loop.
    fn stop_live(&mut self) {
        if let Some(mut live) = self.live.take() {
            live.generation.stop();
            live.display.join();
        }
    }

    /// Synchronously stop everything. The host should terminate afterwards.
    pub fn exit(&mut self) -> KeyOutcome {
        tracing::info!("exiting");
        self.stop_live();
        KeyOutcome::Quit
    }

    pub fn is_running(&self) -> bool {
        self.live.is_some()
    }

    pub fn generation_id(&self) -> Option<u64> {
        self.live.as_ref().map(|l| l.generation.id())
    }

    pub fn widget_count(&self) -> usize {
        self.live
            .as_ref()
            .map_or(0, |l| l.generation.widgets().len())
    }

    pub fn active_loops(&self) -> usize {
        self.live
            .as_ref()
            .map_or(0, |l| l.generation.active_loops())
    }

    pub fn focus_state(&self) -> FocusState {
        self.live
            .as_ref()
            .map_or(FocusState::Unfocused, |l| l.focus.state())
    }

    pub fn screen(&self) -> Option<Arc<Screen>> {
        self.live.as_ref().map(|l| Arc::clone(&l.screen))
    }

    pub fn repaints(&self) -> usize {
        self.live.as_ref().map_or(0, |l| l.display.repaints())
    }

    pub fn request_redraw(&self) {
        if let Some(live) = &self.live {
            live.generation.request_redraw();
        }
    }

    /// Route one key event. Events are handled strictly one at a time.
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let command = classify(&key);
        if command == KeyCommand::Quit {
            return self.exit();
        }

        let Some(live) = self.live.as_mut() else {
            return KeyOutcome::Quit;
        };

        match command {
            KeyCommand::Quit | KeyCommand::Ignored => {}
            KeyCommand::RefreshAll => {
                live.generation.refresh_all();
                live.generation.request_redraw();
            }
            KeyCommand::Focus(event) => {
                live.focus.apply(event);
                live.publish_focus();
            }
            KeyCommand::Char(c) => {
                if live.focus.focus_on(c) {
                    live.publish_focus();
                } else if let Some(index) = live.focus.focused() {
                    if c == 'r' {
                        live.generation.refresh_one(index);
                    } else {
                        live.forward(index, PanelKey::Char(c));
                    }
                } else if c == 'q' {
                    return self.exit();
                }
                // '/' and other unbound keys fall through unhandled
            }
            KeyCommand::Panel(key) => {
                if let Some(index) = live.focus.focused() {
                    live.forward(index, key);
                }
            }
        }

        KeyOutcome::Continue
    }

    /// Replace the live generation with one built from the current
    /// configuration.
    ///
    /// The replacement is built and validated before anything is stopped. If
    /// that fails the running generation is kept and the error is shown in
    /// the status line.
    pub fn reload(&mut self) -> io::Result<ReloadOutcome> {
        let _guard = match self.gate.try_begin(Instant::now()) {
            Ok(guard) => guard,
            Err(retry_after) => {
                tracing::debug!(?retry_after, "reload deferred");
                return Ok(ReloadOutcome::Deferred(retry_after));
            }
        };

        let id = self.next_id;
        let (generation, layout) = match self.source.build(id) {
            Ok(built) => built,
            Err(e) => {
                let message = e.to_string();
                tracing::error!("config reload rejected: {}", message);
                if let Some(live) = &self.live {
                    let summary = message.lines().next().unwrap_or_default();
                    live.screen
                        .set_status(Some(format!("Config reload failed: {} (see log)", summary)));
                    live.generation.request_redraw();
                }
                return Ok(ReloadOutcome::Rejected(message));
            }
        };
        self.next_id += 1;

        let previous = self.generation_id();
        self.stop_live();
        self.start_live(generation, layout)?;

        tracing::info!(from = ?previous, to = id, "config reloaded");
        Ok(ReloadOutcome::Reloaded(id))
    }
}

impl Live {
    fn publish_focus(&self) {
        self.screen.set_focused(self.focus.focused());
        self.generation.request_redraw();
    }

    fn forward(&self, index: usize, key: PanelKey) {
        if let Some(widget) = self.generation.widgets().get(index) {
            widget.handle_key(key);
        }
    }
}

impl<B, S> Drop for Orchestrator<B, S>
where
    B: Backend + Send + 'static,
    S: GenerationSource,
{
    fn drop(&mut self) {
        self.stop_live();
    }
}
