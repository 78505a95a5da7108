//! Per-cycle presence sampling
//!
//! Each cycle reads two values:
//! - The current logged-in session owners, newline-joined, in the order the
//!   OS reports them (not sorted, not deduplicated)
//! - A wall-clock timestamp as formatted text
//!
//! A transiently unavailable source degrades to an empty field instead of
//! aborting: the beacon favors uptime over any single report's completeness.

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use std::process::Command;
use tracing::warn;

/// Snapshot of who is logged in, created fresh every cycle.
#[derive(Debug, Clone)]
pub struct PresenceSample {
    pub session_owners: String,
    pub sampled_at: String,
}

/// Source of the current session-owner list, as raw text.
pub trait SessionSource {
    fn session_owners(&self) -> Result<String>;
}

/// Source of the report timestamp, as formatted text.
pub trait Clock {
    fn now(&self) -> Result<String>;
}

/// Samples presence once per loop iteration.
pub struct PresenceSampler<S, C> {
    sessions: S,
    clock: C,
}

impl<S: SessionSource, C: Clock> PresenceSampler<S, C> {
    pub fn new(sessions: S, clock: C) -> Self {
        Self { sessions, clock }
    }

    /// Never fails: a failed source yields an empty field and the cycle
    /// proceeds with whatever was readable.
    pub fn sample(&self) -> PresenceSample {
        let session_owners = match self.sessions.session_owners() {
            Ok(owners) => owners,
            Err(e) => {
                warn!(error = %e, "session listing unavailable, reporting empty field");
                String::new()
            }
        };
        let sampled_at = match self.clock.now() {
            Ok(now) => now,
            Err(e) => {
                warn!(error = %e, "clock unavailable, reporting empty field");
                String::new()
            }
        };
        PresenceSample {
            session_owners,
            sampled_at,
        }
    }
}

/// Keep the first whitespace-delimited column of each line (the login name
/// in `who` output), newline-joined.
fn owner_column(raw: &str) -> String {
    raw.lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect::<Vec<_>>()
        .join("\n")
}

/// System implementation: session owners from `who`.
pub struct WhoSessions;

impl SessionSource for WhoSessions {
    fn session_owners(&self) -> Result<String> {
        let out = Command::new("who")
            .output()
            .context("failed to run `who`")?;
        if !out.status.success() {
            bail!("`who` exited with {}", out.status);
        }
        Ok(owner_column(&String::from_utf8_lossy(&out.stdout)))
    }
}

/// System implementation: UTC wall clock, RFC 3339.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<String> {
        Ok(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}
