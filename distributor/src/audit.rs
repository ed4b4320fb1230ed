//! Append-only record of executed distributions.
//!
//! Every successful broadcast leaves a block of lines in the output log:
//! when it ran, which reference instant governed the time locks, the
//! normalized content that was distributed, and the transaction id that
//! went out. The file is never truncated, so the log accumulates one
//! block per run for the lifetime of the operation.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::config::format_plain;
use crate::context::RunContext;
use crate::record::DistributionRecord;
use crate::transaction::Txid;

/// One run's worth of audit lines, built in memory and appended whole.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    lines: Vec<String>,
}

impl ExecutionRecord {
    /// Builds the audit block for a broadcast distribution. Rows are
    /// echoed in normalized form: recipients as their network address,
    /// amounts in whole coins without a currency suffix.
    pub fn new(records: &[DistributionRecord], ctx: &RunContext, txid: &Txid) -> Self {
        let now = Utc::now().format("%Y/%m/%d %H:%M:%S");
        let mut lines = vec![
            now.to_string(),
            format!("Execution epoch time: {}", ctx.epoch_millis()),
            String::new(),
            "File content used:".to_owned(),
            "Name,PublicKey,Fermats,DaysForPayment".to_owned(),
        ];
        for record in records {
            lines.push(format!(
                "{},{},{},{}",
                record.alias(),
                record.recipient().address(ctx.network()),
                format_plain(record.amount()),
                record.days_for_payment(),
            ));
        }
        lines.push(String::new());
        lines.push(format!("Transaction broadcasted: {txid}"));
        Self { lines }
    }

    /// The lines of this block, in file order. The caller prints these
    /// when appending fails, so the run is never silently unrecorded.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Appends the block to `path`, creating the file on first use.
    pub fn append_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        let mut file = OpenOptions::new().append(true).create(true).open(path)?;
        for line in &self.lines {
            writeln!(file, "{line}")?;
        }
        writeln!(file)?;
        info!(path = %path.display(), "execution recorded");
        Ok(())
    }
}
