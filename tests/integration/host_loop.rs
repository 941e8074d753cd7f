// The main event loop driven through a channel

use crate::common::recording::{RecordingSource, WidgetDef, test_terminal, wait_until};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use paneldash::engine::ReloadGate;
use paneldash::ui::{Orchestrator, UiEvent, run_app};
use ratatui::{Terminal, backend::TestBackend};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

// Refresh once only, so nothing repaints on its own after startup
fn defs() -> Vec<WidgetDef> {
    vec![
        WidgetDef::new("a", Some('a'), 0, 0),
        WidgetDef::new("b", None, 0, 1),
    ]
}

fn key(c: char) -> UiEvent {
    UiEvent::Input(Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)))
}

fn screen(terminal: &Mutex<Terminal<TestBackend>>) -> (u16, String) {
    let terminal = terminal.lock().unwrap();
    let buffer = terminal.backend().buffer();
    let text = buffer.content().iter().map(|c| c.symbol()).collect();
    (buffer.area.width, text)
}

#[test]
fn test_loop_reloads_repaints_on_resize_and_quits() {
    let source = RecordingSource::new(defs());
    let registry = Arc::clone(&source.registry);
    let terminal = test_terminal();
    let mut orchestrator =
        Orchestrator::with_gate(terminal.clone(), source, ReloadGate::new(Duration::ZERO)).unwrap();
    let (tx, rx) = mpsc::channel();

    let feeder = {
        let terminal = Arc::clone(&terminal);
        thread::spawn(move || {
            let started = wait_until(Duration::from_secs(5), || registry.count(1, "a") >= 1);

            tx.send(UiEvent::ConfigChanged).unwrap();
            let reloaded = wait_until(Duration::from_secs(5), || registry.count(2, "a") >= 1);

            terminal.lock().unwrap().backend_mut().resize(100, 20);
            tx.send(UiEvent::Input(Event::Resize(100, 20))).unwrap();
            let repainted = wait_until(Duration::from_secs(5), || {
                let (width, text) = screen(&terminal);
                width == 100 && text.contains("generation 2")
            });

            tx.send(key('q')).unwrap();
            (started, reloaded, repainted)
        })
    };

    run_app(&mut orchestrator, rx).unwrap();
    let (started, reloaded, repainted) = feeder.join().unwrap();

    assert!(started);
    assert!(reloaded, "config change did not start generation 2");
    assert!(repainted, "resize did not repaint at the new size");
    assert!(!orchestrator.is_running());
    assert_eq!(orchestrator.generation_id(), None);
}

#[test]
fn test_loop_exits_when_all_senders_drop() {
    let source = RecordingSource::new(defs());
    let mut orchestrator = Orchestrator::new(test_terminal(), source).unwrap();
    let (tx, rx) = mpsc::channel::<UiEvent>();

    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        drop(tx);
    });

    run_app(&mut orchestrator, rx).unwrap();
    sender.join().unwrap();

    assert!(!orchestrator.is_running());
    assert_eq!(orchestrator.active_loops(), 0);
}

#[test]
fn test_change_inside_debounce_window_is_applied_later() {
    let source = RecordingSource::new(defs());
    let registry = Arc::clone(&source.registry);
    let mut orchestrator = Orchestrator::with_gate(
        test_terminal(),
        source,
        ReloadGate::new(Duration::from_millis(200)),
    )
    .unwrap();
    let (tx, rx) = mpsc::channel();

    let feeder = thread::spawn(move || {
        // The first change reloads at once, the second lands inside the
        // window that reload opened
        tx.send(UiEvent::ConfigChanged).unwrap();
        let reloaded = wait_until(Duration::from_secs(5), || registry.count(2, "a") >= 1);
        tx.send(UiEvent::ConfigChanged).unwrap();

        let sent = Instant::now();
        let applied = wait_until(Duration::from_secs(5), || registry.count(3, "a") >= 1);
        let waited = sent.elapsed();
        // Dropping the sender ends the loop
        (reloaded, applied, waited)
    });

    run_app(&mut orchestrator, rx).unwrap();
    let (reloaded, applied, waited) = feeder.join().unwrap();

    assert!(reloaded);
    assert!(applied, "deferred change was never reloaded");
    assert!(waited < Duration::from_secs(2));
    assert!(!orchestrator.is_running());
}
