// Keyboard routing through the orchestrator

use crate::common::recording::{RecordingSource, WidgetDef, test_terminal, wait_until};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use paneldash::ui::{FocusState, KeyOutcome, Orchestrator};
use std::thread;
use std::time::Duration;

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[test]
fn test_manual_widget_refreshes_once_and_focus_scenario() {
    let source = RecordingSource::new(vec![
        WidgetDef::new("a", Some('a'), 5_000, 0),
        WidgetDef::new("b", Some('b'), 0, 1),
    ]);
    let registry = source.registry.clone();
    let mut orchestrator = Orchestrator::new(test_terminal(), source).unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        registry.count(1, "a") == 1 && registry.count(1, "b") == 1
    }));
    thread::sleep(Duration::from_millis(100));
    assert_eq!(registry.count(1, "b"), 1, "manual widget refreshes only at startup");
    assert_eq!(registry.count(1, "a"), 1, "5s widget has only done its first tick");

    assert_eq!(orchestrator.focus_state(), FocusState::Unfocused);

    orchestrator.handle_key(key('b'));
    assert_eq!(orchestrator.focus_state(), FocusState::FocusedOn(1));

    orchestrator.handle_key(code(KeyCode::Esc));
    assert_eq!(orchestrator.focus_state(), FocusState::Unfocused);

    orchestrator.handle_key(code(KeyCode::Tab));
    assert_eq!(orchestrator.focus_state(), FocusState::FocusedOn(0));

    assert_eq!(orchestrator.exit(), KeyOutcome::Quit);
}

#[test]
fn test_focus_is_published_to_screen() {
    let source = RecordingSource::new(vec![
        WidgetDef::new("a", Some('a'), 0, 0),
        WidgetDef::new("b", Some('b'), 0, 1),
    ]);
    let mut orchestrator = Orchestrator::new(test_terminal(), source).unwrap();
    let screen = orchestrator.screen().unwrap();

    orchestrator.handle_key(code(KeyCode::BackTab));
    assert_eq!(screen.focused(), Some(1));

    orchestrator.handle_key(code(KeyCode::Esc));
    assert_eq!(screen.focused(), None);
}

#[test]
fn test_q_quits_only_when_unfocused() {
    let source = RecordingSource::new(vec![WidgetDef::new("a", Some('a'), 0, 0)]);
    let mut orchestrator = Orchestrator::new(test_terminal(), source).unwrap();

    orchestrator.handle_key(key('a'));
    assert_eq!(orchestrator.handle_key(key('q')), KeyOutcome::Continue);
    assert!(orchestrator.is_running());

    orchestrator.handle_key(code(KeyCode::Esc));
    assert_eq!(orchestrator.handle_key(key('q')), KeyOutcome::Quit);
    assert!(!orchestrator.is_running());
}

#[test]
fn test_ctrl_c_always_quits() {
    let source = RecordingSource::new(vec![WidgetDef::new("a", Some('a'), 10, 0)]);
    let mut orchestrator = Orchestrator::new(test_terminal(), source).unwrap();
    orchestrator.handle_key(key('a'));

    let outcome = orchestrator.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert_eq!(outcome, KeyOutcome::Quit);
    assert_eq!(orchestrator.active_loops(), 0);
    assert_eq!(orchestrator.generation_id(), None);
}

#[test]
fn test_refresh_all_and_focused_refresh() {
    let source = RecordingSource::new(vec![
        WidgetDef::new("a", Some('a'), 0, 0),
        WidgetDef::new("b", Some('b'), 0, 1),
    ]);
    let registry = source.registry.clone();
    let mut orchestrator = Orchestrator::new(test_terminal(), source).unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        registry.count(1, "a") == 1 && registry.count(1, "b") == 1
    }));

    orchestrator.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
    assert!(wait_until(Duration::from_secs(5), || {
        registry.count(1, "a") == 2 && registry.count(1, "b") == 2
    }));

    // 'r' while focused refreshes just that widget
    orchestrator.handle_key(key('b'));
    orchestrator.handle_key(key('r'));
    assert!(wait_until(Duration::from_secs(5), || registry.count(1, "b") == 3));
    assert_eq!(registry.count(1, "a"), 2);

    orchestrator.exit();
}

#[test]
fn test_widget_output_is_painted() {
    let source = RecordingSource::new(vec![WidgetDef::new("a", Some('a'), 0, 0)]);
    let terminal = test_terminal();
    let orchestrator = Orchestrator::new(terminal.clone(), source).unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        let terminal = terminal.lock().unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        text.contains("generation 1")
    }));
    assert!(orchestrator.repaints() >= 1);
}
