use anyhow::Result;
use log::info;
use rnd_adapter::{build_pipeline, config::Config, shutdown::Shutdown};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load_or_default("config.json")?;
    let mut pipeline = build_pipeline(&config, Shutdown::new())?;

    info!(
        "Sending {}/{} to {} every {} ms",
        config.metadata.path,
        config.metadata.name,
        config.target,
        config.interval_ms
    );

    // Runs until the process is killed.
    let stats = pipeline.run();
    info!("Stopped after {:?}", stats);

    Ok(())
}
