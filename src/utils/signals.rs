//! Signal handling for graceful shutdown

use tracing::info;

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
pub async fn shutdown_signal() -> std::io::Result<()> {
    use futures::stream::StreamExt;
    use signal_hook_tokio::Signals;

    let mut signals = Signals::new([
        signal_hook::consts::SIGTERM,
        signal_hook::consts::SIGINT,
    ])?;

    if let Some(signal) = signals.next().await {
        info!("Received signal: {}", signal);
    }
    Ok(())
}

/// Wait for Ctrl-C
#[cfg(not(unix))]
pub async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C");
    Ok(())
}
