//! Keep Awake - keeps the display and system awake for a number of hours
//!
//! This is the main entry point for the keep-awake application.

use tracing::{info, warn};

use keep_awake::{
    config::Config,
    inhibit::{check_helper_available, inhibitor_for, Platform},
    state::CountdownController,
    tasks::run_event_loop,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr; stdout carries the activity log
    tracing_subscriber::fmt()
        .with_env_filter(format!("keep_awake={}", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting keep-awake v{}", env!("CARGO_PKG_VERSION"));

    let platform = Platform::detect();
    let inhibitor = inhibitor_for(platform);
    info!("Platform: {}", platform.describe());

    // A missing helper is not fatal, the countdown still runs
    if let Some(program) = inhibitor.helper_program() {
        if let Err(e) = check_helper_available(program).await {
            warn!("{}", e);
        }
    }

    let controller = CountdownController::new(inhibitor);
    run_event_loop(controller, &config, platform).await?;

    info!("Shutdown complete");
    Ok(())
}
