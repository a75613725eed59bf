use anyhow::{Context, Result};
use std::{env, net::SocketAddr};

use rnd_adapter::{build_pipeline, config::Config, shutdown::Shutdown};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let mut args = env::args().skip(1);

    let dst_address = args
        .next()
        .context("Usage: udp_test <dst_address> [delay_ms]")?;
    let target: SocketAddr = dst_address
        .parse()
        .with_context(|| format!("Invalid destination address {}", dst_address))?;

    let mut config = Config {
        target,
        ..Config::default()
    };
    if let Some(delay) = args.next() {
        config.interval_ms = delay
            .parse()
            .with_context(|| format!("Invalid delay {}", delay))?;
    }

    println!(
        "Sending packets every {} milliseconds. Press CTRL+C to quit.",
        config.interval_ms
    );

    build_pipeline(&config, Shutdown::new())?.run();

    Ok(())
}
