// Signal wiring. Per spec.md: only flip an atomic, no logging or other
// async-signal-unsafe work in the handler itself - `signal_hook::flag`
// already implements exactly that contract.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};

const SIGNALS: &[i32] = &[
    signal_hook::consts::SIGINT,
    signal_hook::consts::SIGTERM,
    signal_hook::consts::SIGABRT,
    signal_hook::consts::SIGILL,
    signal_hook::consts::SIGFPE,
    signal_hook::consts::SIGSEGV,
];

/// Registers every signal in `SIGNALS` to set `shutdown` to true. Safe to
/// call once at startup, before any worker threads exist.
pub fn install(shutdown: Arc<AtomicBool>) -> Result<()> {
    for &signal in SIGNALS {
        signal_hook::flag::register(signal, shutdown.clone())
            .with_context(|| format!("registering handler for signal {signal}"))?;
    }
    Ok(())
}
