//! Input-file schema validation and record construction.
//!
//! Two exact schemas are supported, compared case-insensitively:
//!
//! - the 4-column legacy schema `Name, PublicKey, Fermats, DaysForPayment`;
//! - the 6-column schema adding `Send` and `Transaction` marker columns,
//!   used when the same spreadsheet tracks several partial distribution
//!   runs. A row is only included when its `Send` marker is non-empty, and
//!   a marked row whose `Transaction` column is already populated is
//!   rejected outright — it was paid in a previous run.
//!
//! All validation happens before any record is handed downstream: a single
//! bad row fails the whole file, because a partially distributed batch is
//! worse than no batch at all.

use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::config::{COIN, PREMINED_SUPPLY};
use crate::context::RunContext;
use crate::crypto::keys::{KeyError, Recipient};
use crate::record::reader::{RawRow, RawTable};
use crate::record::types::DistributionRecord;

/// Column names of the 4-column legacy schema, in order.
const LEGACY_COLUMNS: [&str; 4] = ["Name", "PublicKey", "Fermats", "DaysForPayment"];

/// Column names of the 6-column marker schema, in order.
const EXTENDED_COLUMNS: [&str; 6] = [
    "Name",
    "PublicKey",
    "Fermats",
    "DaysForPayment",
    "Send",
    "Transaction",
];

/// Why an input file was refused. Every variant is fatal to the run and is
/// reported before any funds are touched.
#[derive(Debug, Error)]
pub enum InputFileError {
    /// The file could not be read at all.
    #[error("input file invalid: cannot read file: {0}")]
    Io(#[from] std::io::Error),

    /// The header has neither 4 nor 6 columns.
    #[error("input file invalid: expected 4 or 6 columns, found {found}")]
    ColumnCount {
        /// Number of header columns found.
        found: usize,
    },

    /// A header column does not match the expected schema name.
    #[error("input file invalid: missing column `{expected}`, found `{found}`")]
    MissingColumn {
        /// The schema column expected at this position.
        expected: &'static str,
        /// What the header actually contains there.
        found: String,
    },

    /// Header only, or every row skipped: nothing to distribute.
    #[error("input file invalid: no distribution rows detected")]
    NoRows,

    /// A data row is missing required fields.
    #[error("input file invalid: row at line {line} has only {found} fields")]
    RowTooShort {
        /// 1-based line number.
        line: usize,
        /// Fields present.
        found: usize,
    },

    /// The name column is empty.
    #[error("input file invalid: empty recipient name at line {line}")]
    EmptyName {
        /// 1-based line number.
        line: usize,
    },

    /// The recipient field is neither a public key nor an address.
    #[error("input file invalid: bad recipient at line {line}: {source}")]
    BadRecipient {
        /// 1-based line number.
        line: usize,
        /// Underlying key decoding failure.
        source: KeyError,
    },

    /// The amount field is not a positive integer.
    #[error("input file invalid: amount `{value}` at line {line} is not a whole number")]
    AmountInvalid {
        /// 1-based line number.
        line: usize,
        /// Offending field text.
        value: String,
    },

    /// The amount of fermats can't be zero.
    #[error("input file invalid: the amount of fermats can't be zero (line {line})")]
    AmountZero {
        /// 1-based line number.
        line: usize,
    },

    /// The amount of fermats can't be higher than the premined value.
    #[error(
        "input file invalid: the amount of fermats at line {line} can't be higher than the \
         total amount of premined value ({max})"
    )]
    AmountTooHigh {
        /// 1-based line number.
        line: usize,
        /// The premined supply cap, in whole fermats.
        max: u64,
    },

    /// The days-for-payment field is not a non-negative integer.
    #[error("input file invalid: days `{value}` at line {line} is not a non-negative integer")]
    DaysInvalid {
        /// 1-based line number.
        line: usize,
        /// Offending field text.
        value: String,
    },

    /// A `Send`-marked row already carries a transaction id.
    #[error("row at line {line} already has a transaction assigned; refusing to send it again")]
    AlreadyExecuted {
        /// 1-based line number.
        line: usize,
    },

    /// A vesting row named its recipient by address, but the redeem script
    /// needs the full public key.
    #[error("time-constrained row at line {line} requires a public key, not an address")]
    TimeLockNeedsPublicKey {
        /// 1-based line number.
        line: usize,
    },
}

/// Which of the two supported schemas a file declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schema {
    Legacy,
    Extended,
}

/// Parses and validates an input file from disk.
pub fn parse_file(
    path: &Path,
    ctx: &RunContext,
) -> Result<Vec<DistributionRecord>, InputFileError> {
    let text = std::fs::read_to_string(path)?;
    parse_str(&text, ctx)
}

/// Parses and validates input text; see the module docs for the schema
/// rules. Returns the records in file order — this ordering later becomes
/// the on-ledger output ordering and must be stable.
pub fn parse_str(
    input: &str,
    ctx: &RunContext,
) -> Result<Vec<DistributionRecord>, InputFileError> {
    let table = RawTable::parse(input);
    let schema = validate_header(&table.header)?;

    if table.rows.is_empty() {
        return Err(InputFileError::NoRows);
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        if schema == Schema::Extended && !row_is_marked_for_sending(row)? {
            warn!(line = row.line, "row skipped: no Send marker");
            continue;
        }
        records.push(build_record(row, ctx)?);
    }

    if records.is_empty() {
        return Err(InputFileError::NoRows);
    }
    Ok(records)
}

/// Checks the header against the two exact schemas, case-insensitively.
fn validate_header(header: &[String]) -> Result<Schema, InputFileError> {
    let (schema, expected): (Schema, &[&'static str]) = match header.len() {
        4 => (Schema::Legacy, &LEGACY_COLUMNS),
        6 => (Schema::Extended, &EXTENDED_COLUMNS),
        found => return Err(InputFileError::ColumnCount { found }),
    };

    for (found, expected) in header.iter().zip(expected.iter()) {
        if !found.eq_ignore_ascii_case(expected) {
            return Err(InputFileError::MissingColumn {
                expected,
                found: found.clone(),
            });
        }
    }
    Ok(schema)
}

/// Extended-schema row gate: include the row only when `Send` is non-empty,
/// and refuse rows that were already executed in a previous run.
fn row_is_marked_for_sending(row: &RawRow) -> Result<bool, InputFileError> {
    let send = row.fields.get(4).map(String::as_str).unwrap_or("");
    if send.is_empty() {
        return Ok(false);
    }
    let transaction = row.fields.get(5).map(String::as_str).unwrap_or("");
    if !transaction.is_empty() {
        return Err(InputFileError::AlreadyExecuted { line: row.line });
    }
    Ok(true)
}

/// Builds one record from a validated row.
fn build_record(row: &RawRow, ctx: &RunContext) -> Result<DistributionRecord, InputFileError> {
    if row.fields.len() < 3 {
        return Err(InputFileError::RowTooShort {
            line: row.line,
            found: row.fields.len(),
        });
    }

    let alias = row.fields[0].trim().to_string();
    if alias.is_empty() {
        return Err(InputFileError::EmptyName { line: row.line });
    }

    let recipient = Recipient::parse(&row.fields[1]).map_err(|source| {
        InputFileError::BadRecipient {
            line: row.line,
            source,
        }
    })?;

    let amount = parse_amount(&row.fields[2], row.line)?;

    let days: u32 = match row.fields.get(3).map(String::as_str) {
        None | Some("") => 0,
        Some(value) => value.parse().map_err(|_| InputFileError::DaysInvalid {
            line: row.line,
            value: value.to_string(),
        })?,
    };

    if days == 0 {
        return Ok(DistributionRecord::new(alias, recipient, amount));
    }

    // The redeem script embeds the recipient key itself; an address-only
    // row cannot be time-constrained.
    if recipient.public_key().is_none() {
        return Err(InputFileError::TimeLockNeedsPublicKey { line: row.line });
    }
    Ok(DistributionRecord::with_vesting(
        alias, recipient, amount, days, ctx,
    ))
}

/// Validates the whole-fermat amount and converts it to smallest units.
fn parse_amount(field: &str, line: usize) -> Result<u64, InputFileError> {
    let quantity: u64 = field.parse().map_err(|_| InputFileError::AmountInvalid {
        line,
        value: field.to_string(),
    })?;
    if quantity == 0 {
        return Err(InputFileError::AmountZero { line });
    }
    if quantity > PREMINED_SUPPLY {
        return Err(InputFileError::AmountTooHigh {
            line,
            max: PREMINED_SUPPLY,
        });
    }
    Ok(quantity * COIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;

    const PUBKEY: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn ctx() -> RunContext {
        RunContext::with_epoch(1_700_000_000_000, Network::Regtest, true)
    }

    fn legacy(rows: &str) -> String {
        format!("Name,PublicKey,Fermats,DaysForPayment\n{rows}")
    }

    fn extended(rows: &str) -> String {
        format!("Name,PublicKey,Fermats,DaysForPayment,Send,Transaction\n{rows}")
    }

    #[test]
    fn parses_a_plain_legacy_row() {
        let input = legacy(&format!("Alice,{PUBKEY},500,0\n"));
        let records = parse_str(&input, &ctx()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].alias(), "Alice");
        assert_eq!(records[0].amount(), 500 * COIN);
        assert!(!records[0].is_time_constrained());
    }

    #[test]
    fn parses_a_vesting_row() {
        let input = legacy(&format!("Bob,{PUBKEY},100,200\n"));
        let records = parse_str(&input, &ctx()).unwrap();
        assert!(records[0].is_time_constrained());
        assert_eq!(records[0].days_for_payment(), 200);
        assert_eq!(records[0].unlock_at_millis(), Some(ctx().unlock_at(200)));
    }

    #[test]
    fn huge_days_value_parses_to_a_finite_unlock_instant() {
        let input = legacy(&format!("Alice,{PUBKEY},500,4000000000\n"));
        let records = parse_str(&input, &ctx()).unwrap();
        assert_eq!(records[0].days_for_payment(), 4_000_000_000);
        assert_eq!(
            records[0].unlock_at_millis(),
            Some(ctx().unlock_at(4_000_000_000))
        );
    }

    #[test]
    fn header_is_case_insensitive() {
        let input = format!("name,publickey,FERMATS,daysforpayment\nAlice,{PUBKEY},1,0\n");
        assert!(parse_str(&input, &ctx()).is_ok());
    }

    #[test]
    fn wrong_column_name_is_rejected() {
        let input = format!("Name,PublicKey,Amount,DaysForPayment\nAlice,{PUBKEY},1,0\n");
        let err = parse_str(&input, &ctx()).unwrap_err();
        assert!(matches!(
            err,
            InputFileError::MissingColumn {
                expected: "Fermats",
                ..
            }
        ));
    }

    #[test]
    fn wrong_column_count_is_rejected() {
        let err = parse_str("Name,PublicKey,Fermats\nAlice,x,1\n", &ctx()).unwrap_err();
        assert!(matches!(err, InputFileError::ColumnCount { found: 3 }));
    }

    #[test]
    fn header_only_file_is_rejected() {
        let err = parse_str(&legacy(""), &ctx()).unwrap_err();
        assert!(matches!(err, InputFileError::NoRows));
    }

    #[test]
    fn zero_amount_is_rejected() {
        let input = legacy(&format!("Alice,{PUBKEY},0,0\n"));
        let err = parse_str(&input, &ctx()).unwrap_err();
        assert!(matches!(err, InputFileError::AmountZero { line: 2 }));
    }

    #[test]
    fn amount_above_premined_supply_is_rejected() {
        let input = legacy(&format!("Alice,{PUBKEY},2100001,0\n"));
        let err = parse_str(&input, &ctx()).unwrap_err();
        assert!(matches!(err, InputFileError::AmountTooHigh { line: 2, .. }));
    }

    #[test]
    fn amount_at_the_cap_is_accepted() {
        let input = legacy(&format!("Alice,{PUBKEY},2100000,0\n"));
        let records = parse_str(&input, &ctx()).unwrap();
        assert_eq!(records[0].amount(), 2_100_000 * COIN);
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        let input = legacy(&format!("Alice,{PUBKEY},half,0\n"));
        let err = parse_str(&input, &ctx()).unwrap_err();
        assert!(matches!(err, InputFileError::AmountInvalid { line: 2, .. }));
    }

    #[test]
    fn extended_schema_skips_unmarked_rows() {
        let input = extended(&format!(
            "Alice,{PUBKEY},500,0,x,\nBob,{PUBKEY},100,0,,\n"
        ));
        let records = parse_str(&input, &ctx()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].alias(), "Alice");
    }

    #[test]
    fn extended_schema_rejects_already_executed_rows() {
        let input = extended(&format!("Alice,{PUBKEY},500,0,x,deadbeef\n"));
        let err = parse_str(&input, &ctx()).unwrap_err();
        assert!(matches!(err, InputFileError::AlreadyExecuted { line: 2 }));
    }

    #[test]
    fn extended_schema_with_no_marked_rows_is_rejected() {
        let input = extended(&format!("Alice,{PUBKEY},500,0,,\n"));
        let err = parse_str(&input, &ctx()).unwrap_err();
        assert!(matches!(err, InputFileError::NoRows));
    }

    #[test]
    fn vesting_row_with_address_recipient_is_rejected() {
        use crate::crypto::keys::PrivateKey;
        let address = PrivateKey::from_bytes(&[7; 32], Network::Regtest)
            .unwrap()
            .address()
            .to_string();
        let input = legacy(&format!("Alice,{address},500,30\n"));
        let err = parse_str(&input, &ctx()).unwrap_err();
        assert!(matches!(
            err,
            InputFileError::TimeLockNeedsPublicKey { line: 2 }
        ));
    }

    #[test]
    fn address_recipient_is_fine_without_vesting() {
        use crate::crypto::keys::PrivateKey;
        let address = PrivateKey::from_bytes(&[7; 32], Network::Regtest)
            .unwrap()
            .address()
            .to_string();
        let input = legacy(&format!("Alice,{address},500,0\n"));
        assert!(parse_str(&input, &ctx()).is_ok());
    }

    #[test]
    fn spaces_inside_amount_field_are_tolerated() {
        let input = legacy(&format!("Alice,{PUBKEY}, 5 00 ,0\n"));
        let records = parse_str(&input, &ctx()).unwrap();
        assert_eq!(records[0].amount(), 500 * COIN);
    }

    #[test]
    fn record_order_follows_file_order() {
        let input = legacy(&format!(
            "First,{PUBKEY},1,0\nSecond,{PUBKEY},2,0\nThird,{PUBKEY},3,0\n"
        ));
        let records = parse_str(&input, &ctx()).unwrap();
        let aliases: Vec<_> = records.iter().map(|r| r.alias().to_string()).collect();
        assert_eq!(aliases, ["First", "Second", "Third"]);
    }
}
