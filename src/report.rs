//! Reporting loop driver
//!
//! One report per cycle: sample, encode, deliver, then pause for the base
//! interval plus a bounded random jitter so a fleet of beacons started
//! together does not phase-lock into request storms.
//!
//! Delivery is best effort. A failed send is logged and dropped; the next
//! attempt is the next scheduled cycle, never an immediate retry. The loop
//! only exits on a termination signal.

use crate::identity::HostIdentity;
use crate::payload::ReportPayload;
use crate::sample::{Clock, PresenceSampler, SessionSource};
use anyhow::{bail, Context, Result};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Reference pacing: one report roughly every 5 seconds.
pub const BASE_INTERVAL: Duration = Duration::from_secs(5);

/// Opaque transport capability for delivering one encoded report body.
pub trait ReportSink {
    async fn deliver(&self, endpoint: &str, body: &str) -> Result<()>;
}

/// HTTP transport: POST the body form-urlencoded, bounded by a timeout equal
/// to the base interval so a stalled request cannot delay later cycles past
/// their schedule.
pub struct HttpSink {
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(BASE_INTERVAL)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl ReportSink for HttpSink {
    async fn deliver(&self, endpoint: &str, body: &str) -> Result<()> {
        let resp = self
            .client
            .post(endpoint)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .context("request failed")?;
        if !resp.status().is_success() {
            bail!("server status {}", resp.status());
        }
        Ok(())
    }
}

/// Base interval plus uniform jitter in `[0, base)`.
pub fn jittered_pause(base: Duration) -> Duration {
    let jitter_ms = rand::thread_rng().gen_range(0..base.as_millis() as u64);
    base + Duration::from_millis(jitter_ms)
}

/// Drives the sample → encode → deliver → pause cycle forever.
pub struct Reporter<S, C, K> {
    endpoint: String,
    identity: HostIdentity,
    sampler: PresenceSampler<S, C>,
    sink: K,
    cycle: u64,
}

impl<S, C, K> Reporter<S, C, K>
where
    S: SessionSource,
    C: Clock,
    K: ReportSink,
{
    pub fn new(
        endpoint: String,
        identity: HostIdentity,
        sampler: PresenceSampler<S, C>,
        sink: K,
    ) -> Self {
        Self {
            endpoint,
            identity,
            sampler,
            sink,
            cycle: 0,
        }
    }

    /// One full cycle. Transient failures are contained here; nothing
    /// escalates past a cycle boundary.
    pub async fn run_cycle(&mut self) {
        self.cycle += 1;
        let sample = self.sampler.sample();
        let body = ReportPayload::encode(&self.identity, &sample).body();
        match self.sink.deliver(&self.endpoint, &body).await {
            Ok(()) => {
                info!(
                    cycle = self.cycle,
                    endpoint = %self.endpoint,
                    bytes = body.len(),
                    "report delivered"
                );
            }
            Err(e) => {
                warn!(
                    cycle = self.cycle,
                    endpoint = %self.endpoint,
                    error = %e,
                    "report dropped, next attempt at next cycle"
                );
            }
        }
    }

    /// Loop forever; returns only on a termination signal.
    pub async fn run(&mut self) -> Result<()> {
        info!(endpoint = %self.endpoint, host = %self.identity.hostname, "starting report loop");
        loop {
            self.run_cycle().await;
            tokio::select! {
                _ = tokio::time::sleep(jittered_pause(BASE_INTERVAL)) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("termination signal received, stopping report loop");
                    return Ok(());
                }
            }
        }
    }
}
