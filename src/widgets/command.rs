// Shell command output panel

use anyhow::{Context, Result, bail};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::engine::widget::{Widget, WidgetBase};

/// How often a running child is checked for exit or a stop request
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct CommandWidget {
    base: WidgetBase,
    program: String,
    args: Vec<String>,
}

/// Drain a child pipe on its own thread so a chatty command cannot fill the
/// pipe and block on write.
fn collect<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    let mut pipe = pipe?;
    thread::Builder::new()
        .name("command-output".to_string())
        .spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
        .ok()
}

fn joined(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

impl CommandWidget {
    pub fn new(base: WidgetBase, command: &str) -> Result<Self> {
        let mut parts = shlex::split(command)
            .with_context(|| format!("Invalid command for widget '{}'", base.settings().name))?
            .into_iter();
        let Some(program) = parts.next() else {
            bail!("Empty command for widget '{}'", base.settings().name);
        };

        Ok(Self {
            base,
            program,
            args: parts.collect(),
        })
    }

    fn kill(&self, child: &mut Child) {
        if let Err(e) = child.kill() {
            tracing::debug!(program = %self.program, "kill failed: {}", e);
        }
        let _ = child.wait();
    }

    /// Run the command to completion. Returns `Ok(None)` if the widget was
    /// stopped first; the child is killed in that case.
    fn run(&self) -> Result<Option<Vec<String>>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {}", self.program))?;

        let stdout = collect(child.stdout.take());
        let stderr = collect(child.stderr.take());
        let stop = self.base.stop_signal();

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    self.kill(&mut child);
                    return Err(e).with_context(|| format!("Failed to wait for {}", self.program));
                }
            }
            if stop.wait_timeout(POLL_INTERVAL) {
                tracing::debug!(program = %self.program, "stopped while running, killing");
                self.kill(&mut child);
                // Output readers finish on their own once the pipes close
                return Ok(None);
            }
        };

        let stdout = joined(stdout);
        if !status.success() {
            let stderr = joined(stderr);
            let stderr = String::from_utf8_lossy(&stderr);
            bail!("{} exited with {}: {}", self.program, status, stderr.trim());
        }

        Ok(Some(
            String::from_utf8_lossy(&stdout)
                .lines()
                .map(str::to_string)
                .collect(),
        ))
    }
}

impl Widget for CommandWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn refresh(&self) {
        match self.run() {
            Ok(Some(lines)) => self.base.display(lines),
            Ok(None) => {}
            Err(e) => self.base.publish(Err(e)),
        }
    }
}
