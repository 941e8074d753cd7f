// Terminal UI using Ratatui

pub mod display;
pub mod events;
pub mod focus;
pub mod keys;
pub mod layout;
pub mod orchestrator;

pub use display::{DisplayCoordinator, Screen};
pub use events::{UiEvent, run_app, run_ui};
pub use focus::{FocusEvent, FocusState, FocusTracker};
pub use layout::GridLayout;
pub use orchestrator::{
    ConfigFileSource, GenerationSource, KeyOutcome, Orchestrator, ReloadOutcome, StartupError,
};
