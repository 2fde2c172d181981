//! Cooperative cancellation shared by the discoverer, the orchestrator and every worker.

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::error::JobError;

const ESC: u8 = 0x1b;

/// One-way flag: starts clear, [`set`](Self::set) once, never reset. Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; callable from any thread.
    pub fn set(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Non-blocking read.
    pub fn is_set(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Set the signal on Ctrl+C. Only one handler can be installed per process.
    pub fn install_ctrlc(&self) -> Result<(), JobError> {
        let signal = self.clone();
        ctrlc::set_handler(move || {
            if !signal.is_set() {
                log::warn!("Cancellation requested; finishing files already in progress");
            }
            signal.set();
        })?;
        Ok(())
    }

    /// Watch stdin on a detached thread and set the signal when ESC is read.
    pub fn spawn_esc_monitor(&self) {
        let signal = self.clone();
        thread::spawn(move || watch_for_esc(std::io::stdin().lock(), &signal));
    }
}

/// Read `input` byte by byte until ESC (sets `signal`), EOF or a read error.
pub fn watch_for_esc<R: Read>(input: R, signal: &CancellationSignal) {
    for byte in input.bytes() {
        match byte {
            Ok(ESC) => {
                log::warn!("ESC pressed; cancelling");
                signal.set();
                return;
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("Error reading input: {}", e);
                return;
            }
        }
    }
}
