//! # Distribution Records
//!
//! The input side of a run: reading the operator's tabular file, validating
//! it against one of the two supported schemas, and producing the immutable
//! list of [`DistributionRecord`]s that everything downstream consumes.
//!
//! ```text
//! types.rs  — DistributionRecord, the per-recipient entitlement
//! reader.rs — Raw comma-separated table reading and field normalization
//! parser.rs — Schema validation and record construction
//! ```

pub mod parser;
pub mod reader;
pub mod types;

pub use parser::{parse_file, parse_str, InputFileError};
pub use types::DistributionRecord;
