//! Presence beacon - minimal host presence-reporting agent
//!
//! Resolves the host identity (primary MAC + hostname) once at startup, then
//! loops forever: sample who is logged in, encode the report, POST it to the
//! collector given on the command line, pause with jitter, repeat.
//!
//! Startup failures are fatal; everything after that is best effort.

mod identity;
mod payload;
mod report;
mod sample;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

fn parse_endpoint(mut args: impl Iterator<Item = String>) -> Option<String> {
    match (args.next(), args.next()) {
        (Some(url), None) => Some(url),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("presence_beacon=info")),
        )
        .init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "presence-beacon".to_string());
    let endpoint = match parse_endpoint(args) {
        Some(url) => url,
        None => {
            eprintln!("usage: {program} <server-url>");
            std::process::exit(2);
        }
    };

    let host_identity = identity::resolve(&identity::SystemHardwareAddr, &identity::SystemHostName)
        .context("host identity resolution failed")?;

    let sampler = sample::PresenceSampler::new(sample::WhoSessions, sample::SystemClock);
    let sink = report::HttpSink::new()?;
    let mut reporter = report::Reporter::new(endpoint, host_identity, sampler, sink);
    reporter.run().await
}
