//! Raw tabular input reading.
//!
//! Splits UTF-8 text into comma-separated rows and applies the one piece of
//! normalization the tool has always done: every field except the first has
//! its internal spaces stripped, so loosely formatted spreadsheets
//! (`" 500 "`, `"03ab cd..."`) still parse. The first field is the
//! recipient's name and is preserved verbatim — multi-word names are legal.
//!
//! No schema knowledge lives here; that belongs to the parser.

/// One data row, with its 1-based line number for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the input file.
    pub line: usize,
    /// Normalized fields, in column order.
    pub fields: Vec<String>,
}

/// A read table: one header row plus zero or more data rows.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Header fields, space-stripped like any non-name field.
    pub header: Vec<String>,
    /// Data rows in file order.
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Reads a table from text. Blank lines are skipped; the first
    /// non-blank line is the header.
    pub fn parse(input: &str) -> Self {
        let mut header = Vec::new();
        let mut rows = Vec::new();

        for (index, raw_line) in input.lines().enumerate() {
            if raw_line.trim().is_empty() {
                continue;
            }
            let fields = split_and_normalize(raw_line);
            if header.is_empty() {
                // Header fields are never names; strip spaces from all of
                // them, first column included.
                header = fields
                    .iter()
                    .map(|f| f.replace(' ', ""))
                    .collect();
            } else {
                rows.push(RawRow {
                    line: index + 1,
                    fields,
                });
            }
        }

        Self { header, rows }
    }
}

/// Splits one line on commas and strips internal spaces from every field
/// except the first.
fn split_and_normalize(line: &str) -> Vec<String> {
    line.split(',')
        .enumerate()
        .map(|(i, field)| {
            if i == 0 {
                field.to_string()
            } else {
                field.replace(' ', "")
            }
        })
        .collect()
}
