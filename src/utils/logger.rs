//! env_logger setup. Lines logged from pool workers carry the worker's name, so per-file
//! warnings from a parallel run can be told apart.

use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;
use std::thread;

use crate::utils::config::PoolConsts;

/// `w3` for the thread named `imgbatch-worker-3`; None off the pool.
fn worker_tag() -> Option<String> {
    let current = thread::current();
    current
        .name()?
        .strip_prefix(PoolConsts::THREAD_NAME)
        .and_then(|n| n.strip_prefix('-'))
        .map(|n| format!("w{n}"))
}

/// Install the logger. Verbose turns on debug output for this crate; dependencies only warn.
/// Safe to call more than once (later calls are ignored).
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME").cyan();
            let tag = worker_tag()
                .map(|t| format!(" {}", t.dimmed()))
                .unwrap_or_default();
            let line = match record.level() {
                Level::Error => format!("[{name}{tag} {}] {}", "ERROR".red(), record.args()),
                Level::Warn => format!("[{name}{tag} {}] {}", "WARN".yellow(), record.args()),
                Level::Debug | Level::Trace => format!(
                    "[{name}{tag} {}] {}",
                    record.target().white(),
                    record.args()
                ),
                Level::Info => format!("[{name}{tag}] {}", record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}
