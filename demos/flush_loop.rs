//! Counts simulated jobs and flushes them to Carbon on an interval.
//!
//! ```sh
//! CARBON_HOST=127.0.0.1 CARBON_PORT=2003 FLUSH_INTERVAL=5s \
//!     RUST_LOG=carbonstat=debug cargo run --example flush_loop
//! ```

use std::time::Duration;

use anyhow::Context;
use carbonstat::Registry;
use tracing_subscriber::{filter, EnvFilter};

fn flush_interval() -> anyhow::Result<Duration> {
    match std::env::var("FLUSH_INTERVAL") {
        Ok(value) => humantime::parse_duration(&value)
            .with_context(|| format!("invalid FLUSH_INTERVAL `{value}`")),
        Err(_) => Ok(Duration::from_secs(10)),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut stat = Registry::from_env()?.with_namespace("demo");
    tracing::info!(destination = %stat.destination(), "sending metrics");

    let jobs = stat.metric("jobs.done")?;
    let uptime = stat.metric("uptime.flushes")?;
    uptime.set_accumulate(true);
    let mut job = stat.wrapper("jobs.run")?.wrap_with(|n: u64| (1..=n).sum::<u64>());

    let mut flush = tokio::time::interval(flush_interval()?);
    let mut work = tokio::time::interval(Duration::from_millis(250));
    let mut n = 0;
    loop {
        tokio::select! {
            _ = work.tick() => {
                n = (n + 1_000) % 100_000;
                job(n)?;
                jobs.incr();
            }
            _ = flush.tick() => {
                uptime.incr();
                if let Err(e) = stat.send() {
                    tracing::error!(error = %e, "flush failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                stat.send()?;
                tracing::info!("bye");
                return Ok(());
            }
        }
    }
}
