//! # Run Context
//!
//! One distribution run carries exactly one reference instant: the epoch
//! captured when the process started (or supplied explicitly in
//! redeem-script-only mode). Every vesting unlock time in the run is derived
//! from that single instant, so two records with the same `DaysForPayment`
//! always unlock at the same moment.
//!
//! The context is created once in `main()` and threaded as an explicit
//! parameter. There is deliberately no global epoch and no way to mutate
//! the context after construction.

use chrono::{DateTime, TimeZone, Utc};

use crate::config::Network;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Immutable per-run parameters shared by the parser, the summary, and the
/// audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    epoch_millis: i64,
    network: Network,
    test_mode: bool,
}

impl RunContext {
    /// Creates a context anchored at the current wall-clock time.
    pub fn new(network: Network, test_mode: bool) -> Self {
        Self {
            epoch_millis: Utc::now().timestamp_millis(),
            network,
            test_mode,
        }
    }

    /// Creates a context anchored at an explicit epoch, in milliseconds.
    ///
    /// Used by redeem-script-only mode, where the operator reproduces the
    /// unlock conditions of a past run by supplying that run's epoch.
    pub fn with_epoch(epoch_millis: i64, network: Network, test_mode: bool) -> Self {
        Self {
            epoch_millis,
            network,
            test_mode,
        }
    }

    /// The run's reference instant as milliseconds since the Unix epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.epoch_millis
    }

    /// The run's reference instant as a UTC timestamp.
    pub fn epoch(&self) -> DateTime<Utc> {
        // timestamp_millis_opt is total for any i64 we can produce here.
        Utc.timestamp_millis_opt(self.epoch_millis)
            .single()
            .unwrap_or_default()
    }

    /// The target network of this run.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Whether reduced-control test mode is active.
    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    /// Absolute unlock instant for a vesting delay of `days`, in
    /// milliseconds since the Unix epoch.
    ///
    /// Deterministic for a given context: the same days always map to the
    /// same instant within one run. Computed in plain millisecond
    /// arithmetic, so every `u32` day count yields a finite instant; no
    /// calendar library bounds apply here.
    pub fn unlock_at(&self, days: u32) -> i64 {
        self.epoch_millis
            .saturating_add(i64::from(days) * MILLIS_PER_DAY)
    }
}
