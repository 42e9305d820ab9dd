use log::info;
use std::io::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::select;
#[cfg(not(target_os = "windows"))]
use tokio::signal::unix::{signal, SignalKind};
#[cfg(target_os = "windows")]
use tokio::signal::windows::{ctrl_break, ctrl_c, ctrl_close, ctrl_shutdown};

/// Waits for a stop request and returns the name of the signal that sent it.
#[cfg(not(target_os = "windows"))]
pub async fn await_stop_signal() -> Result<&'static str, Error> {
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;
    let mut quit = signal(SignalKind::quit())?;
    Ok(select! {
        _ = term.recv() => "SIGTERM",
        _ = int.recv() => "SIGINT",
        _ = quit.recv() => "SIGQUIT",
    })
}

#[cfg(target_os = "windows")]
pub async fn await_stop_signal() -> Result<&'static str, Error> {
    let mut brk = ctrl_break()?;
    let mut c = ctrl_c()?;
    let mut close = ctrl_close()?;
    let mut shutdown = ctrl_shutdown()?;
    Ok(select! {
        _ = brk.recv() => "CTRL_BREAK",
        _ = c.recv() => "CTRL_C",
        _ = close.recv() => "CTRL_CLOSE",
        _ = shutdown.recv() => "CTRL_SHUTDOWN",
    })
}

/// Clears `run` once the process is asked to stop. Servers poll the flag
/// between accepts.
pub async fn stop_on_signal(run: Arc<AtomicBool>) -> Result<(), Error> {
    let signal = await_stop_signal().await?;
    info!("Received {signal}, shutting down");
    run.store(false, Ordering::Relaxed);
    Ok(())
}
