// Key classification for the dashboard

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::engine::widget::PanelKey;
use crate::ui::focus::FocusEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Ctrl+C, always quits
    Quit,
    /// Ctrl+R
    RefreshAll,
    Focus(FocusEvent),
    /// Printable character; may be a focus key, a global shortcut or widget input
    Char(char),
    /// Non-printable key that only a focused widget may care about
    Panel(PanelKey),
    Ignored,
}

pub fn classify(key: &KeyEvent) -> KeyCommand {
    // Windows reports releases too
    if key.kind == KeyEventKind::Release {
        return KeyCommand::Ignored;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('C') if ctrl => KeyCommand::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') if ctrl => KeyCommand::RefreshAll,
        KeyCode::Char(_) if ctrl => KeyCommand::Ignored,
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => {
            KeyCommand::Focus(FocusEvent::Prev)
        }
        KeyCode::Tab => KeyCommand::Focus(FocusEvent::Next),
        KeyCode::BackTab => KeyCommand::Focus(FocusEvent::Prev),
        KeyCode::Esc => KeyCommand::Focus(FocusEvent::Clear),
        KeyCode::Char(c) => KeyCommand::Char(c),
        KeyCode::Up => KeyCommand::Panel(PanelKey::Up),
        KeyCode::Down => KeyCommand::Panel(PanelKey::Down),
        KeyCode::PageUp => KeyCommand::Panel(PanelKey::PageUp),
        KeyCode::PageDown => KeyCommand::Panel(PanelKey::PageDown),
        KeyCode::Home => KeyCommand::Panel(PanelKey::Home),
        _ => KeyCommand::Ignored,
    }
}
