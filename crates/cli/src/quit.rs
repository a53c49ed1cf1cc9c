//! Quit-key listeners and signal handling.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use contracts::{CancelReason, CancellationToken, ContractError, QuitListener};
use tracing::{debug, info, warn};

/// Listener fed by lines on stdin
///
/// A line reading `q` or `quit` requests quit. EOF stops the reader thread
/// without requesting quit.
pub struct StdinQuitListener {
    pressed: Arc<AtomicBool>,
}

impl StdinQuitListener {
    pub fn new() -> std::io::Result<Self> {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    /// Listen on any line source (tests feed a cursor)
    pub fn from_reader<R>(reader: R) -> std::io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let pressed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&pressed);

        // Detached: a blocking read on stdin cannot be interrupted
        thread::Builder::new()
            .name("quit-stdin".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) if is_quit_command(&line) => {
                            flag.store(true, Ordering::SeqCst);
                            return;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            debug!(error = %e, "stdin read failed");
                            return;
                        }
                    }
                }
                debug!("stdin closed");
            })?;

        Ok(Self { pressed })
    }
}

fn is_quit_command(line: &str) -> bool {
    matches!(line.trim(), "q" | "Q" | "quit")
}

impl QuitListener for StdinQuitListener {
    fn is_quit_pressed(&mut self) -> Result<bool, ContractError> {
        Ok(self.pressed.load(Ordering::SeqCst))
    }
}

/// Listener that reports quit when any of its members does
#[derive(Default)]
pub struct CompositeQuitListener {
    listeners: Vec<Box<dyn QuitListener>>,
}

impl CompositeQuitListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, listener: Box<dyn QuitListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl QuitListener for CompositeQuitListener {
    fn is_quit_pressed(&mut self) -> Result<bool, ContractError> {
        let mut first_error = None;
        for listener in &mut self.listeners {
            match listener.is_quit_pressed() {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(false),
        }
    }
}

/// Cancel the run with `CancelReason::Signal` on Ctrl+C or SIGTERM
pub fn watch_signals(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        if cancel.cancel(CancelReason::Signal) {
            info!("Received shutdown signal, stopping rig...");
        }
    })
}
