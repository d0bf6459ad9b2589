// Thinking indicator - a spinner shown while a model call is in flight
//
// Cosmetic only. Frames are drawn straight to stdout and only when stdout is
// a terminal; the completion message goes through the Output port.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::output::{Output, Style};

const FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
const FRAME_INTERVAL: Duration = Duration::from_millis(120);
const CLEAR_WIDTH: usize = 120;

pub struct ThinkingIndicator {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    output: Arc<dyn Output>,
}

impl ThinkingIndicator {
    /// Start spinning with `message`. Draws nothing unless stdout is a TTY.
    pub fn start(message: &str, output: Arc<dyn Output>) -> Self {
        let draw = io::stdout().is_terminal();
        Self::start_with(message, output, draw)
    }

    /// Start with drawing forced on or off.
    pub fn start_with(message: &str, output: Arc<dyn Output>, draw: bool) -> Self {
        let cancel = CancellationToken::new();

        let handle = draw.then(|| {
            let cancel = cancel.clone();
            let label = message.to_string();
            let output = Arc::clone(&output);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(FRAME_INTERVAL);
                let mut index = 0usize;
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            let frame = output.paint(
                                Style::Thinking,
                                &format!("{} {}", FRAMES[index % FRAMES.len()], label),
                            );
                            write_raw(&format!("\r{}", frame));
                            index += 1;
                        }
                    }
                }
            })
        });

        Self {
            cancel,
            handle,
            output,
        }
    }

    /// Stop, wait for the ticking task, clear the line, then print `message`
    /// (skipped when blank).
    pub async fn stop(mut self, message: &str) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::debug!("Thinking indicator task ended abnormally: {}", e);
            }
            write_raw(&format!("\r{}\r", " ".repeat(CLEAR_WIDTH)));
        }

        if !message.trim().is_empty() {
            self.output.info(message);
        }
    }
}

fn write_raw(text: &str) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = write!(stdout, "{}", text).and_then(|_| stdout.flush()) {
        tracing::debug!("spinner write failed: {}", e);
    }
}

impl Drop for ThinkingIndicator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
