// Orchestration core - independent of the terminal

pub mod generation;
pub mod redraw;
pub mod reload;
pub mod scheduler;
pub mod validate;
pub mod widget;

pub use generation::{Generation, GenerationError, STOP_GRACE};
pub use redraw::{Drained, RedrawDrain, RedrawRequester, RedrawSignal};
pub use reload::{ConfigWatcher, RELOAD_DEBOUNCE, ReloadGate};
pub use scheduler::Scheduler;
pub use validate::{GridBounds, ValidationError, validate};
pub use widget::{GridPosition, PanelContent, PanelKey, PanelColors, Widget, WidgetBase, WidgetSettings};
