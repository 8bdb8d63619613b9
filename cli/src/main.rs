// Copyright (c) 2026 Payflow Contributors. MIT License.
// See LICENSE for details.

//! # Payflow CLI
//!
//! Entry point for the `payflow` binary. Parses CLI arguments,
//! initializes logging, and runs the composition engine one-shot over a
//! JSON request file: network description, account view, fee info and
//! form snapshot in, composed fee levels out.
//!
//! The binary supports three subcommands:
//!
//! - `compose`  — compose candidates for every fee level
//! - `validate` — run field validation only
//! - `version`  — print build version information
//!
//! UTXO networks need a coin-selecting provider; offline, the CLI uses
//! a deterministic estimator that prices candidates from a fixed
//! virtual size. Signing is not available offline by design.

mod cli;
mod logging;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use serde::Deserialize;
use serde_json::json;

use payflow_engine::compose::utxo::ComposeOutputShape;
use payflow_engine::compose::{CandidateOutput, CandidateTransaction, ComposeError, ComposeResult};
use payflow_engine::fees::resolve_level;
use payflow_engine::form::validate::validate;
use payflow_engine::provider::SignedPayload;
use payflow_engine::{
    AccountView, FeeInfo, FeeLevel, FormSnapshot, Network, NetworkComposer, ProviderError,
    TransactionProvider,
};

use cli::{Commands, PayflowCli};
use logging::LogFormat;

/// Virtual size (in fee units) the offline estimator assumes for a
/// candidate. Real coin selection varies with the input set; offline we
/// only need plausible, stable numbers.
const ESTIMATED_VSIZE: u64 = 200;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = PayflowCli::parse();

    match cli.command {
        Commands::Compose(args) => run_compose(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Request Loading
// ---------------------------------------------------------------------------

/// Everything one compose run needs, as the caller supplies it.
#[derive(Debug, Deserialize)]
struct ComposeRequest {
    network: Network,
    account: AccountView,
    fee_info: FeeInfo,
    #[serde(default)]
    form: FormSnapshot,
}

fn load_request(path: &Path) -> Result<ComposeRequest> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request file: {}", path.display()))?
    };
    serde_json::from_str(&raw).context("failed to parse compose request")
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

/// Composes the request's form at every fee level and prints the level
/// map plus the resolved selection as JSON on stdout.
async fn run_compose(args: cli::ComposeArgs) -> Result<()> {
    logging::init_logging(
        "payflow=info,payflow_engine=info",
        LogFormat::from_str_lossy(&args.log_format),
    );

    let request = load_request(&args.request)?;
    tracing::info!(
        symbol = %request.network.symbol,
        kind = ?request.network.kind,
        account = %request.account.key,
        "composing request"
    );

    let errors = validate(&request.form, &request.network, &request.fee_info);
    if errors.has_blocking_errors() {
        // Same contract as the session: a form that fails field
        // validation composes nothing.
        let report = json!({
            "errors": errors.as_value(),
            "levels": [],
            "selected": null,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        std::process::exit(1);
    }
    let composer = NetworkComposer::new(request.network);
    let provider = OfflineEstimator;

    let composed = composer
        .compose(
            &request.form,
            &request.account,
            &request.fee_info,
            &provider,
        )
        .await
        .context("compose attempt failed")?;

    let selection = if composed.is_empty() {
        None
    } else {
        let selection = resolve_level(&composed, request.form.selected_fee);
        Some(json!({
            "level": selection.label.to_string(),
            "switched": selection.switched,
            "result": selection.result,
        }))
    };

    let report = json!({
        "errors": errors.as_value(),
        "levels": composed
            .iter()
            .map(|(label, result)| json!({ "level": label.to_string(), "result": result }))
            .collect::<Vec<_>>(),
        "selected": selection,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Runs field validation only and prints the error tree.
fn run_validate(args: cli::ValidateArgs) -> Result<()> {
    logging::init_logging(
        "payflow=info,payflow_engine=info",
        LogFormat::from_str_lossy(&args.log_format),
    );

    let request = load_request(&args.request)?;
    let errors = validate(&request.form, &request.network, &request.fee_info);

    println!("{}", serde_json::to_string_pretty(errors.as_value())?);
    if errors.has_blocking_errors() {
        std::process::exit(1);
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("payflow {}", env!("CARGO_PKG_VERSION"));
    println!(
        "debounce window {}ms",
        payflow_engine::config::DEBOUNCE_WINDOW_MS
    );
}

// ---------------------------------------------------------------------------
// Offline Estimator
// ---------------------------------------------------------------------------

/// Deterministic stand-in for the wallet's coin-selecting backend:
/// prices every candidate at `fee_per_unit × ESTIMATED_VSIZE` against
/// the account's available balance. Signing and broadcast are refused —
/// this binary has no keys.
struct OfflineEstimator;

impl OfflineEstimator {
    fn compose_one(
        available: u64,
        level: &FeeLevel,
        shapes: &[ComposeOutputShape],
    ) -> ComposeResult {
        let fee_per_unit: u64 = match level.fee_per_unit.parse() {
            Ok(v) => v,
            Err(_) => return ComposeResult::error(ComposeError::NotEnoughFunds),
        };
        let fee = fee_per_unit.saturating_mul(ESTIMATED_VSIZE);

        let mut requested: u64 = 0;
        let mut addressed = true;
        let mut send_max = false;
        let mut outputs = Vec::new();
        let mut data_hex = None;

        for shape in shapes {
            match shape {
                ComposeOutputShape::External { address, amount } => {
                    requested = requested.saturating_add(amount.parse().unwrap_or(0));
                    outputs.push(CandidateOutput {
                        address: address.clone(),
                        amount: amount.clone(),
                    });
                }
                ComposeOutputShape::NoAddress { amount } => {
                    requested = requested.saturating_add(amount.parse().unwrap_or(0));
                    addressed = false;
                }
                ComposeOutputShape::SendMax { address } => {
                    send_max = true;
                    outputs.push(CandidateOutput {
                        address: address.clone(),
                        amount: "0".to_string(),
                    });
                }
                ComposeOutputShape::SendMaxNoAddress => {
                    send_max = true;
                    addressed = false;
                }
                ComposeOutputShape::OpReturn { data_hex: data } => {
                    data_hex = Some(data.clone());
                }
            }
        }

        if available < requested.saturating_add(fee) {
            return ComposeResult::error(ComposeError::NotEnoughFunds);
        }
        let remainder = available - requested - fee;

        let total_spent = if send_max {
            for output in &mut outputs {
                if output.amount == "0" {
                    output.amount = remainder.to_string();
                }
            }
            available.to_string()
        } else {
            (requested + fee).to_string()
        };
        let max = send_max.then(|| remainder.to_string());

        if addressed {
            ComposeResult::Final {
                total_spent,
                fee: fee.to_string(),
                fee_per_unit: level.fee_per_unit.clone(),
                fee_limit: None,
                max,
                transaction: CandidateTransaction { outputs, data_hex },
            }
        } else {
            ComposeResult::Nonfinal {
                total_spent,
                fee: fee.to_string(),
                fee_per_unit: level.fee_per_unit.clone(),
                max,
            }
        }
    }
}

#[async_trait]
impl TransactionProvider for OfflineEstimator {
    async fn compose_candidates(
        &self,
        account: &AccountView,
        levels: &[FeeLevel],
        shapes: &[ComposeOutputShape],
    ) -> Result<Vec<ComposeResult>, ProviderError> {
        let available: u64 = account.available_balance.parse().map_err(|_| {
            ProviderError::MalformedResponse("available balance is not an integer".to_string())
        })?;
        Ok(levels
            .iter()
            .map(|level| Self::compose_one(available, level, shapes))
            .collect())
    }

    async fn sign(
        &self,
        _account: &AccountView,
        _transaction: &CandidateTransaction,
    ) -> Result<SignedPayload, ProviderError> {
        Err(ProviderError::Rejected(
            "offline estimator cannot sign".to_string(),
        ))
    }

    async fn broadcast(&self, _payload: &SignedPayload) -> Result<String, ProviderError> {
        Err(ProviderError::Unreachable(
            "offline estimator cannot broadcast".to_string(),
        ))
    }
}
