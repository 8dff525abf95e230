use anyhow::Context;
use tabletop::{config::AppConfig, TabletopApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    log::info!(
        "Starting {} ({}x{}, assets in {})",
        config.title,
        config.window_width,
        config.window_height,
        config.asset_root.display()
    );

    let app = TabletopApp::new(config).context("failed to create application")?;
    app.run().context("application stopped with an error")
}
