// Copyright (c) 2026 Fermat Community. MIT License.

//! # Fermat Premine Distributor
//!
//! Entry point for the `fermat-distributor` binary. Parses CLI arguments,
//! initializes logging, and drives one distribution run end to end: read
//! the distribution file, show the operator a summary, assemble and sign
//! the single outgoing transaction, broadcast it through a trusted node,
//! and append the audit trail.
//!
//! A second mode (`--generate-scripts`) reproduces the time-lock redeem
//! scripts of a past run for a given reference instant, without touching
//! any funds or any node.

mod cli;
mod logging;
mod rpc;

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;

use fermat_distributor::audit::ExecutionRecord;
use fermat_distributor::config::{
    format_coins, Network, BROADCAST_TIMEOUT, OUTPUT_LOG_FILE,
};
use fermat_distributor::context::RunContext;
use fermat_distributor::crypto::{Address, PrivateKey};
use fermat_distributor::env::{BroadcastError, Broadcaster, FundingError, FundingWallet};
use fermat_distributor::record::{self, DistributionRecord};
use fermat_distributor::summary::Summary;
use fermat_distributor::transaction::{FeePolicy, LocalSigner, TransactionAssembler};

use cli::DistributorCli;
use logging::LogFormat;
use rpc::RpcClient;

#[tokio::main]
async fn main() -> Result<()> {
    let args = DistributorCli::parse();

    let default_level = if args.debug {
        "fermat_distributor=debug,fermat_distributor_cli=debug"
    } else {
        "fermat_distributor=info,fermat_distributor_cli=info"
    };
    logging::init_logging(default_level, LogFormat::from_str_lossy(&args.log_format));

    let network = Network::from(args.network);
    match args.generate_scripts {
        Some(epoch_millis) => generate_scripts(&args, network, epoch_millis),
        None => distribute(&args, network).await,
    }
}

/// Reproduces the redeem scripts a distribution file yields under the
/// given reference instant, printing them to stdout. Direct payments have
/// no script and are skipped.
fn generate_scripts(args: &DistributorCli, network: Network, epoch_millis: i64) -> Result<()> {
    let ctx = RunContext::with_epoch(epoch_millis, network, args.test);
    let mut records = parse_records(&args.input, &ctx)?;

    let mut assembler = TransactionAssembler::script_only(&ctx);
    for record in &mut records {
        assembler
            .add_record(record)
            .with_context(|| format!("building script for '{}'", record.alias()))?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for record in &records {
        let Some(redeem) = record.redeem_script() else {
            continue;
        };
        let p2sh = Address::p2sh(redeem.script().script_hash(), network);
        writeln!(out, "{}", record.alias())?;
        writeln!(out, "  unlocks at (epoch ms): {}", redeem.unlock_at_millis())?;
        writeln!(out, "  pay-to-script-hash:    {p2sh}")?;
        writeln!(out, "  redeem script:         {}", hex::encode(redeem.to_bytes()))?;
    }
    Ok(())
}

/// The real run: summary, confirmation, assembly, broadcast, audit.
async fn distribute(args: &DistributorCli, network: Network) -> Result<()> {
    let ctx = RunContext::new(network, args.test);
    tracing::info!(
        network = network.name(),
        test_mode = args.test,
        epoch = ctx.epoch_millis(),
        "starting distribution run"
    );

    // Validate the operator key before reading anything else; a typo in
    // the WIF string must not survive until signing time.
    let wif = args
        .private_key
        .as_deref()
        .context("an operator private key (-p) is required to distribute funds")?;
    let key = PrivateKey::from_wif(wif, network)
        .context("the operator private key is not valid for this network")?;

    let mut records = parse_records(&args.input, &ctx)?;

    let summary = Summary::calculate(&records, &ctx);
    println!("{summary}");
    confirm("Press ENTER to continue with this distribution")?;

    let node = RpcClient::new(args.rpc_url.clone());
    node.import_key(&key)
        .await
        .context("importing the operator key into the node wallet")?;
    let imported = node
        .imported_addresses()
        .await
        .context("listing the node wallet's imported addresses")?;
    if !imported.contains(&key.address()) {
        return Err(FundingError::KeyNotImported)
            .with_context(|| format!("operator address {}", key.address()));
    }
    let balance = node
        .available_balance()
        .await
        .context("querying the node wallet balance")?;
    println!("Wallet balance: {}", format_coins(balance));
    if balance < summary.total() {
        return Err(FundingError::InsufficientBalance {
            requested: summary.total(),
            available: balance,
        })
        .context("the wallet cannot cover this distribution");
    }

    let funding = node
        .single_unspent()
        .await
        .context("locating the funding output")?;

    let mut assembler = TransactionAssembler::new(funding, &ctx)
        .context("the funding output failed its preconditions")?;
    for record in &mut records {
        assembler
            .add_record(record)
            .with_context(|| format!("adding the payment for '{}'", record.alias()))?;
    }

    println!(
        "About to distribute {} out of {} available.",
        format_coins(assembler.collected_value()),
        format_coins(assembler.funding_value().unwrap_or(0)),
    );
    confirm("Press ENTER to sign and broadcast")?;

    let signer = LocalSigner::new(key.clone());
    let tx = match assembler.finalize(&signer, &key.address(), FeePolicy::Zero) {
        Ok(tx) => tx.clone(),
        Err(err) => {
            // Show what was built so the operator can inspect the failure.
            eprintln!("Assembled transaction at time of failure:");
            eprintln!("{}", assembler.transaction());
            return Err(err).context("the assembled transaction failed validation");
        }
    };

    let txid = tokio::time::timeout(
        BROADCAST_TIMEOUT,
        node.broadcast(&tx, network.min_broadcast_peers()),
    )
    .await
    .map_err(|_| BroadcastError::Timeout {
        seconds: BROADCAST_TIMEOUT.as_secs(),
    })?
    .context("broadcasting the transaction")?;

    println!("Transaction broadcasted: {txid}");

    let block = ExecutionRecord::new(&records, &ctx, &txid);
    if let Err(err) = block.append_to(OUTPUT_LOG_FILE) {
        // The run already happened; the record must survive somewhere.
        tracing::error!(%err, file = OUTPUT_LOG_FILE, "could not append the execution record");
        eprintln!("Write this down, the output file could not be updated:");
        for line in block.lines() {
            eprintln!("{line}");
        }
    }
    Ok(())
}

fn parse_records(path: &std::path::Path, ctx: &RunContext) -> Result<Vec<DistributionRecord>> {
    let records = record::parse_file(path, ctx)
        .with_context(|| format!("reading distribution file {}", path.display()))?;
    tracing::info!(count = records.len(), "distribution file parsed");
    Ok(records)
}

/// Blocks until the operator presses ENTER. Any read failure (for
/// instance a closed stdin in a misconfigured batch run) aborts.
fn confirm(prompt: &str) -> Result<()> {
    println!("{prompt} (Ctrl-C to abort)");
    let mut line = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading confirmation from stdin")?;
    if read == 0 {
        bail!("stdin closed before confirmation");
    }
    Ok(())
}
