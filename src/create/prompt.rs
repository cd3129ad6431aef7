use std::io::{self, IsTerminal, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use super::types::CancelToken;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Decimal units, as used for image sizes by the container tools.
const UNITS: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("failed to read the answer")]
    Io(#[from] io::Error),

    #[error("prompt cancelled")]
    Cancelled,

    #[error("no answer within {} seconds", .0.as_secs())]
    TimedOut(Duration),
}

/// Whether an answer to a `[y/N]` question means yes.
pub fn parse_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Format a byte count with four significant digits, e.g. `1.235MB`.
pub fn human_size(bytes: f64) -> String {
    let mut size = bytes.max(0.0);
    let mut unit = 0;
    while size >= 1000.0 && unit < UNITS.len() - 1 {
        size /= 1000.0;
        unit += 1;
    }

    let integer_digits = if size >= 100.0 {
        3
    } else if size >= 10.0 {
        2
    } else {
        1
    };
    let mut number = format!("{:.*}", 4 - integer_digits, size);
    if number.contains('.') {
        number = number.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{number}{}", UNITS[unit])
}

/// Where download confirmations are asked.
pub trait Console {
    /// Whether a human can answer questions (standard input is a terminal).
    fn is_interactive(&self) -> bool;

    /// Show `prompt` and return the raw answer line.
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError>;
}

/// The process's own stdin/stdout.
///
/// Without a timeout or a cancel token the answer is a plain blocking read.
/// Otherwise the read runs on a helper thread and is abandoned when either
/// one fires. The command-line front end sets no token, so Ctrl-C keeps its
/// default effect of ending the process.
#[derive(Debug, Clone, Default)]
pub struct Terminal {
    timeout: Option<Duration>,
    cancel: Option<CancelToken>,
}

impl Terminal {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            cancel: None,
        }
    }

    /// Let an embedding application abandon a pending question.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_watched(&self) -> bool {
        self.timeout.is_some() || self.cancel.is_some()
    }
}

impl Console for Terminal {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let read = || {
            let mut line = String::new();
            io::stdin().read_line(&mut line).map(|_| line)
        };
        if !self.is_watched() {
            return Ok(read()?);
        }
        let cancel = self.cancel.clone().unwrap_or_default();
        ask_with_deadline(read, &cancel, self.timeout)
    }
}

/// Run `read` on a helper thread and wait for it, giving up when `cancel`
/// fires or `timeout` elapses. An abandoned read is left running.
pub fn ask_with_deadline<F>(
    read: F,
    cancel: &CancelToken,
    timeout: Option<Duration>,
) -> Result<String, PromptError>
where
    F: FnOnce() -> io::Result<String> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        // Receiver may be gone after a timeout; ignore send errors.
        let _ = tx.send(read());
    });

    let start = Instant::now();
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(answer) => return Ok(answer?),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(PromptError::Io(io::ErrorKind::UnexpectedEof.into()));
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        if cancel.is_cancelled() {
            return Err(PromptError::Cancelled);
        }
        if let Some(timeout) = timeout
            && start.elapsed() > timeout
        {
            return Err(PromptError::TimedOut(timeout));
        }
    }
}
