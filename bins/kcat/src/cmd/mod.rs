pub mod config;
pub mod consume;
pub mod dump;
pub mod error;
pub mod list;
pub mod produce;

use kcat_engine::RunContext;

use config::{Effective, Mode};
use error::CatError;

// ═══════════════════════════════════════════════════════════════
//  Main dispatch
// ═══════════════════════════════════════════════════════════════

/// Run the selected mode on a blocking thread. `Ok(false)` means the run
/// completed but some messages or files failed.
pub async fn run(eff: Effective) -> Result<bool, CatError> {
    let ctx = RunContext::new();
    let signals = tokio::spawn(listen_for_signals(ctx.clone()));

    let worker_ctx = ctx.clone();
    let worker = tokio::task::spawn_blocking(move || match eff.mode {
        Mode::Produce => produce::run(&eff, &worker_ctx),
        Mode::Consume => consume::run(&eff, &worker_ctx),
        Mode::List => list::run(&eff),
        Mode::Dump => dump::run(&eff),
    });

    // A worker stuck in a blocking read never sees the flag; the second
    // signal gives up on it.
    let result = tokio::select! {
        joined = worker => joined?,
        _ = ctx.abort_token().cancelled() => Err(CatError::Aborted),
    };

    signals.abort();
    result
}

async fn listen_for_signals(ctx: RunContext) {
    loop {
        if let Err(e) = wait_for_signal().await {
            tracing::warn!(error = %e, "failed to listen for signals");
            return;
        }
        if ctx.is_running() {
            tracing::debug!("signal received, shutting down");
        } else {
            tracing::debug!("second signal received, aborting");
        }
        ctx.interrupt();
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    tokio::select! {
        r = tokio::signal::ctrl_c() => r,
        _ = term.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
