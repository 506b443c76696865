use anyhow::Context;
use log::info;
use rhomb::{App, AppConfig};

fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("starting rhomb...");

    let config = AppConfig::load_or_default().context("Failed to load configuration")?;
    info!(
        "configuration loaded: {}x{}, {:?} backend, {:?} mode",
        config.window.width, config.window.height, config.render.backend, config.render.mode
    );

    let app = App::bootstrap(config).context("Failed to bootstrap wayland client")?;
    info!("bootstrap complete");

    app.run().context("Client run loop failed")?;

    info!("rhomb exited successfully.");
    Ok(())
}
