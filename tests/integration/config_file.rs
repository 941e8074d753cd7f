// Dashboards driven by a real config file on disk

use crate::common::recording::{test_terminal, wait_until};
use paneldash::config::Config;
use paneldash::engine::ReloadGate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use paneldash::ui::{ConfigFileSource, FocusState, KeyOutcome, Orchestrator, ReloadOutcome};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

const TWO_PANELS: &str = r#"
[grid]
columns = [0, 0]
rows = [0]

[[widgets]]
name = "notes"
type = "text"
text = "first note"
focus_char = "n"
position = { top = 0, left = 0 }

[[widgets]]
name = "todo"
type = "text"
text = "buy milk"
focus_char = "t"
position = { top = 0, left = 1 }
"#;

const ONE_PANEL: &str = r#"
[grid]
columns = [0]
rows = [0]

[[widgets]]
name = "notes"
type = "text"
text = "rewritten"
position = { top = 0, left = 0 }
"#;

const CLASHING: &str = r#"
[grid]
columns = [0, 0]
rows = [0]

[[widgets]]
name = "notes"
type = "text"
focus_char = "n"
position = { top = 0, left = 0 }

[[widgets]]
name = "news"
type = "text"
focus_char = "n"
position = { top = 0, left = 1 }
"#;

fn write(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
}

fn screen_text(terminal: &std::sync::Mutex<ratatui::Terminal<ratatui::backend::TestBackend>>) -> String {
    let terminal = terminal.lock().unwrap();
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|c| c.symbol())
        .collect()
}

#[test]
fn test_config_file_drives_startup_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    write(&path, TWO_PANELS);

    let terminal = test_terminal();
    let mut orchestrator = Orchestrator::with_gate(
        terminal.clone(),
        ConfigFileSource::new(&path),
        ReloadGate::new(Duration::ZERO),
    )
    .unwrap();

    assert_eq!(orchestrator.widget_count(), 2);
    assert!(wait_until(Duration::from_secs(5), || {
        let text = screen_text(&terminal);
        text.contains("first note") && text.contains("buy milk")
    }));

    write(&path, ONE_PANEL);
    assert_eq!(orchestrator.reload().unwrap(), ReloadOutcome::Reloaded(2));
    assert_eq!(orchestrator.widget_count(), 1);
    assert!(wait_until(Duration::from_secs(5), || {
        let text = screen_text(&terminal);
        text.contains("rewritten") && !text.contains("buy milk")
    }));

    orchestrator.exit();
}

#[test]
fn test_broken_file_on_reload_keeps_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    write(&path, TWO_PANELS);

    let mut orchestrator = Orchestrator::with_gate(
        test_terminal(),
        ConfigFileSource::new(&path),
        ReloadGate::new(Duration::ZERO),
    )
    .unwrap();

    write(&path, "[[widgets]\nname = ");
    assert!(matches!(
        orchestrator.reload().unwrap(),
        ReloadOutcome::Rejected(_)
    ));

    write(&path, CLASHING);
    match orchestrator.reload().unwrap() {
        ReloadOutcome::Rejected(message) => {
            assert!(message.contains("notes (focus_char)"));
            assert!(message.contains("news (focus_char)"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }

    assert_eq!(orchestrator.generation_id(), Some(1));
    assert_eq!(orchestrator.widget_count(), 2);
}

#[test]
fn test_missing_file_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Orchestrator::new(test_terminal(), ConfigFileSource::new(&path))
        .err()
        .unwrap();
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_default_config_builds_a_generation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    assert!(Config::ensure_default(&path).unwrap());

    let config = Config::load_from(&path).unwrap();
    let generation = paneldash::engine::Generation::from_config(1, &config).unwrap();
    assert_eq!(generation.widgets().len(), config.widgets.len());
}

#[cfg(unix)]
#[test]
fn test_quit_does_not_wait_for_running_command() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    write(
        &path,
        r#"
[grid]
columns = [0]
rows = [0]

[[widgets]]
name = "slow"
type = "command"
command = "sleep 30"
position = { top = 0, left = 0 }
"#,
    );

    let mut orchestrator = Orchestrator::new(test_terminal(), ConfigFileSource::new(&path)).unwrap();
    thread::sleep(Duration::from_millis(200));

    let started = Instant::now();
    let outcome = orchestrator.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

    assert_eq!(outcome, KeyOutcome::Quit);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "quit took {:?}",
        started.elapsed()
    );
}

#[test]
fn test_r_refreshes_focused_panel_with_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    assert!(Config::ensure_default(&path).unwrap());

    let mut orchestrator = Orchestrator::new(test_terminal(), ConfigFileSource::new(&path)).unwrap();
    let key = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);

    orchestrator.handle_key(key('c'));
    assert_eq!(orchestrator.focus_state(), FocusState::FocusedOn(0));

    // 'r' is a refresh, not a jump to another panel
    assert_eq!(orchestrator.handle_key(key('r')), KeyOutcome::Continue);
    assert_eq!(orchestrator.focus_state(), FocusState::FocusedOn(0));

    orchestrator.exit();
}
