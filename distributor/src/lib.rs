// Copyright (c) 2026 Fermat Community. MIT License.
// See LICENSE for details.

//! # Fermat Premine Distributor — Core Library
//!
//! This crate builds exactly one transaction, and it builds it carefully:
//! the transaction that spends the single premined genesis output and pays
//! it out to a list of recipients, some immediately, some locked behind a
//! time-constrained redeem script.
//!
//! Getting that transaction wrong is not a bug report, it's a funeral. A
//! misencoded locktime push or a misplaced script op means funds that can
//! never be redeemed. So the core is small, deterministic, and validated
//! before anything touches the network.
//!
//! ## Architecture
//!
//! The modules mirror the stages of a distribution run:
//!
//! - **config** — Network parameters and every constant with consensus weight.
//! - **context** — The immutable run context: one epoch per run, no globals.
//! - **crypto** — hash160 / double-SHA-256, keys, Base58Check addresses.
//! - **script** — Minimal output-script model and the redeem-script synthesizer.
//! - **record** — Distribution records and the input-file parser/validator.
//! - **transaction** — The three-phase assembler, local signer, and the
//!   structural validator that gets the last word before broadcast.
//! - **summary** — The pre-broadcast aggregate shown to the operator.
//! - **audit** — The append-only execution log. Broadcasts are forever;
//!   so is this file.
//! - **env** — Narrow traits for the external collaborators (funding wallet,
//!   broadcaster). Networking lives behind them, not in here.
//!
//! ## Design Philosophy
//!
//! 1. One funding input, consumed exactly once. No coin selection heroics.
//! 2. Deterministic output ordering — on-ledger indices follow input order.
//! 3. Every failure is a typed error with a human-readable cause. No error
//!    in this crate is silently swallowed.
//! 4. If it touches money, it has tests. Plural.

pub mod audit;
pub mod config;
pub mod context;
pub mod crypto;
pub mod env;
pub mod record;
pub mod script;
pub mod summary;
pub mod transaction;
