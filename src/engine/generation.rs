// One configuration snapshot's widget set and the loops bound to it

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

use super::redraw::{RedrawDrain, RedrawRequester, RedrawSignal};
use super::scheduler::{Scheduler, join_until, refresh_guarded};
use super::validate::{GridBounds, ValidationError, render_report, validate};
use super::widget::Widget;
use crate::config::Config;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to build widgets: {0:#}")]
    Build(#[from] anyhow::Error),

    #[error("{}", render_report(.0))]
    Invalid(Vec<ValidationError>),
}

impl GenerationError {
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Invalid(errors) => errors,
            Self::Build(_) => &[],
        }
    }
}

/// How long `stop` waits for in-flight refreshes before detaching them
pub const STOP_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle: assembled (validated, nothing running) → started → stopped.
///
/// A generation is never restarted and its widget list is never mutated;
/// hot reload builds a new one.
pub struct Generation {
    id: u64,
    widgets: Vec<Arc<dyn Widget>>,
    grid: GridBounds,
    signal: Option<RedrawSignal>,
    drain: Option<RedrawDrain>,
    scheduler: Option<Scheduler>,
    /// Manual refreshes by widget index
    adhoc: Vec<(usize, JoinHandle<()>)>,
    stopped: bool,
}

impl Generation {
    /// Build every widget described by `config` and validate the set.
    pub fn from_config(id: u64, config: &Config) -> Result<Self, GenerationError> {
        let (signal, drain) = RedrawSignal::new();
        let widgets = crate::widgets::make_widgets(config, &signal.requester())?;
        Self::assemble(id, signal, drain, widgets, config.grid.bounds())
    }

    /// Validate an already constructed widget set. The widgets must have been
    /// built with requesters from `signal`.
    pub fn assemble(
        id: u64,
        signal: RedrawSignal,
        drain: RedrawDrain,
        widgets: Vec<Arc<dyn Widget>>,
        grid: GridBounds,
    ) -> Result<Self, GenerationError> {
        validate(&widgets, grid).map_err(GenerationError::Invalid)?;

        Ok(Self {
            id,
            widgets,
            grid,
            signal: Some(signal),
            drain: Some(drain),
            scheduler: None,
            adhoc: Vec::new(),
            stopped: false,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn widgets(&self) -> &[Arc<dyn Widget>] {
        &self.widgets
    }

    pub fn grid(&self) -> GridBounds {
        self.grid
    }

    /// The consumer half for this generation's display coordinator. Yields
    /// once.
    pub fn take_drain(&mut self) -> Option<RedrawDrain> {
        self.drain.take()
    }

    pub fn requester(&self) -> Option<RedrawRequester> {
        self.signal.as_ref().map(RedrawSignal::requester)
    }

    pub fn request_redraw(&self) {
        if let Some(signal) = &self.signal {
            signal.request_redraw();
        }
    }

    /// Start one refresh loop per enabled widget. No-op once started or
    /// stopped.
    pub fn start(&mut self) {
        if self.scheduler.is_some() || self.stopped {
            return;
        }
        tracing::info!(generation = self.id, widgets = self.widgets.len(), "starting generation");
        self.scheduler = Some(Scheduler::start(&self.widgets));
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some() && !self.stopped
    }

    pub fn active_loops(&self) -> usize {
        self.scheduler.as_ref().map_or(0, Scheduler::active_loops)
    }

    /// Refresh every enabled widget once, each on its own thread.
    pub fn refresh_all(&mut self) {
        for index in 0..self.widgets.len() {
            self.refresh_one(index);
        }
    }

    pub fn refresh_one(&mut self, index: usize) {
        if self.stopped {
            return;
        }
        self.adhoc.retain(|(_, handle)| !handle.is_finished());

        let Some(widget) = self.widgets.get(index) else {
            return;
        };
        if !widget.settings().enabled {
            return;
        }
        if self.adhoc.iter().any(|(i, _)| *i == index) {
            tracing::debug!(widget = %widget.settings().name, "manual refresh already running");
            return;
        }

        let widget = Arc::clone(widget);
        match thread::Builder::new()
            .name(format!("refresh-now-{}", widget.settings().name))
            .spawn(move || refresh_guarded(widget.as_ref()))
        {
            Ok(handle) => self.adhoc.push((index, handle)),
            Err(e) => tracing::error!("failed to spawn refresh: {}", e),
        }
    }

    /// Stop every widget, wait up to [`STOP_GRACE`] for loops and in-flight
    /// refreshes, then close the redraw signal. Idempotent.
    ///
    /// A refresh that ignores its stop signal past the grace period is
    /// detached. Its region is no longer drawn and its redraw requests are
    /// dropped once the signal closes.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        for widget in &self.widgets {
            widget.stop();
        }
        let deadline = Instant::now() + STOP_GRACE;
        let mut detached = 0;
        if let Some(scheduler) = self.scheduler.take() {
            detached += scheduler.join_until(deadline);
        }
        let adhoc = self.adhoc.drain(..).map(|(_, handle)| handle).collect();
        detached += join_until(adhoc, deadline);
        if detached > 0 {
            tracing::warn!(generation = self.id, detached, "generation stopped with refreshes still running");
        }
        if let Some(signal) = self.signal.take() {
            signal.close();
        }

        tracing::info!(generation = self.id, "generation stopped");
    }
}

impl Drop for Generation {
    fn drop(&mut self) {
        self.stop();
    }
}
