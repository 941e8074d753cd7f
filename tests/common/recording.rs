#![allow(dead_code)]

use paneldash::engine::{
    Generation, GenerationError, GridBounds, GridPosition, RedrawSignal, Widget, WidgetBase,
    WidgetSettings,
};
use paneldash::ui::{GenerationSource, GridLayout};
use ratatui::{Terminal, backend::TestBackend};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Declaration of one recording widget
#[derive(Debug, Clone)]
pub struct WidgetDef {
    pub name: &'static str,
    pub focus_char: Option<char>,
    pub interval: Duration,
    pub left: u16,
}

impl WidgetDef {
    pub fn new(name: &'static str, focus_char: Option<char>, interval_ms: u64, left: u16) -> Self {
        Self {
            name,
            focus_char,
            interval: Duration::from_millis(interval_ms),
            left,
        }
    }
}

/// Shared record of every refresh performed by recording widgets
#[derive(Debug, Default)]
pub struct Registry {
    /// Generation id of each refresh, in the order they happened
    order: Mutex<Vec<u64>>,
    counts: Mutex<HashMap<(u64, &'static str), usize>>,
    /// Refreshes currently running, per generation
    in_flight: Mutex<HashMap<u64, usize>>,
    overlaps: Mutex<usize>,
}

impl Registry {
    fn enter(&self, generation: u64, name: &'static str) {
        let mut in_flight = self.in_flight.lock().unwrap();
        if in_flight
            .iter()
            .any(|(other, &n)| *other != generation && n > 0)
        {
            *self.overlaps.lock().unwrap() += 1;
        }
        *in_flight.entry(generation).or_default() += 1;
        drop(in_flight);

        self.order.lock().unwrap().push(generation);
        *self
            .counts
            .lock()
            .unwrap()
            .entry((generation, name))
            .or_default() += 1;
    }

    fn leave(&self, generation: u64) {
        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(n) = in_flight.get_mut(&generation) {
            *n -= 1;
        }
    }

    pub fn count(&self, generation: u64, name: &'static str) -> usize {
        self.counts
            .lock()
            .unwrap()
            .get(&(generation, name))
            .copied()
            .unwrap_or(0)
    }

    pub fn order(&self) -> Vec<u64> {
        self.order.lock().unwrap().clone()
    }

    pub fn overlaps(&self) -> usize {
        *self.overlaps.lock().unwrap()
    }

    /// True if no refresh of an older generation ran after a newer one started
    pub fn generations_never_interleave(&self) -> bool {
        self.order().windows(2).all(|pair| pair[0] <= pair[1])
    }
}

pub struct RecordingWidget {
    base: WidgetBase,
    name: &'static str,
    generation: u64,
    registry: Arc<Registry>,
}

impl Widget for RecordingWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn refresh(&self) {
        self.registry.enter(self.generation, self.name);
        // Long enough that a stop can land mid-refresh
        thread::sleep(Duration::from_millis(2));
        self.base
            .display(vec![format!("generation {}", self.generation)]);
        self.registry.leave(self.generation);
    }
}

/// Builds recording generations; can be told to produce an invalid set.
pub struct RecordingSource {
    pub registry: Arc<Registry>,
    pub defs: Arc<Mutex<Vec<WidgetDef>>>,
    pub fail_next: Arc<AtomicBool>,
}

impl RecordingSource {
    pub fn new(defs: Vec<WidgetDef>) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            defs: Arc::new(Mutex::new(defs)),
            fail_next: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handles(&self) -> (Arc<Registry>, Arc<Mutex<Vec<WidgetDef>>>, Arc<AtomicBool>) {
        (
            Arc::clone(&self.registry),
            Arc::clone(&self.defs),
            Arc::clone(&self.fail_next),
        )
    }
}

impl GenerationSource for RecordingSource {
    fn build(&mut self, id: u64) -> Result<(Generation, GridLayout), GenerationError> {
        let mut defs = self.defs.lock().unwrap().clone();
        if self.fail_next.swap(false, Ordering::SeqCst) {
            // Two widgets fighting over one focus key
            defs = vec![WidgetDef::new("x", Some('x'), 0, 0), WidgetDef::new("y", Some('x'), 0, 1)];
        }

        let columns = defs.iter().map(|s| s.left as usize + 1).max().unwrap_or(1);
        let (signal, drain) = RedrawSignal::new();
        let widgets: Vec<Arc<dyn Widget>> = defs
            .iter()
            .map(|def| {
                let mut settings = WidgetSettings::new(def.name);
                settings.focus_char = def.focus_char;
                settings.refresh_interval = def.interval;
                settings.position = GridPosition::new(0, def.left, 1, 1);
                Arc::new(RecordingWidget {
                    base: WidgetBase::new(settings, signal.requester()),
                    name: def.name,
                    generation: id,
                    registry: Arc::clone(&self.registry),
                }) as Arc<dyn Widget>
            })
            .collect();

        let generation =
            Generation::assemble(id, signal, drain, widgets, GridBounds { columns, rows: 1 })?;
        Ok((generation, GridLayout::new(vec![0; columns], vec![0])))
    }
}

pub fn test_terminal() -> Arc<Mutex<Terminal<TestBackend>>> {
    Arc::new(Mutex::new(Terminal::new(TestBackend::new(80, 12)).unwrap()))
}

pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}
