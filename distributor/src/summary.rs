//! Pre-flight distribution summary.
//!
//! Computed from the parsed records alone, before any wallet or network
//! collaborator is touched. The operator reads this report and confirms
//! it before a single unit moves. Calculation is a pure function: calling
//! it twice over the same records yields the same aggregate, and nothing
//! is mutated along the way.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{TimeZone, Utc};

use crate::config::format_coins;
use crate::context::RunContext;
use crate::record::DistributionRecord;

/// Aggregate view of a distribution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    epoch_millis: i64,
    total: u64,
    count: usize,
    per_alias: BTreeMap<String, u64>,
}

impl Summary {
    /// Aggregates `records` under the run's reference instant. Duplicate
    /// aliases are merged into a single per-alias total; `count` still
    /// reflects the number of records, not the number of aliases.
    pub fn calculate(records: &[DistributionRecord], ctx: &RunContext) -> Self {
        let mut per_alias = BTreeMap::new();
        let mut total: u64 = 0;
        for record in records {
            total = total.saturating_add(record.amount());
            *per_alias.entry(record.alias().to_owned()).or_insert(0u64) +=
                record.amount();
        }
        Self {
            epoch_millis: ctx.epoch_millis(),
            total,
            count: records.len(),
            per_alias,
        }
    }

    /// Total value across all records, smallest units.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of records aggregated.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Merged per-alias totals, smallest units, in alias order.
    pub fn per_alias(&self) -> &BTreeMap<String, u64> {
        &self.per_alias
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = Utc
            .timestamp_millis_opt(self.epoch_millis)
            .single()
            .map(|t| t.format("%Y/%m/%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.epoch_millis.to_string());
        writeln!(f, "Distribution summary (reference instant: {when})")?;
        writeln!(f, "  payments: {}", self.count)?;
        writeln!(f, "  total:    {}", format_coins(self.total))?;
        for (alias, amount) in &self.per_alias {
            writeln!(f, "  {:<24} {}", alias, format_coins(*amount))?;
        }
        Ok(())
    }
}
