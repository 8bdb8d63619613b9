//! # CLI Interface
//!
//! Defines the command-line argument structure for `payflow` using
//! `clap` derive. Supports three subcommands: `compose`, `validate`,
//! and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Payflow transaction composition tool.
///
/// A one-shot front end for the composition engine: feed it a request
/// file describing the network, account, fee info and form, and it
/// prints the composed fee levels (or the validation errors) as JSON.
#[derive(Parser, Debug)]
#[command(
    name = "payflow",
    about = "Payflow transaction composition tool",
    version,
    propagate_version = true
)]
pub struct PayflowCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the payflow binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compose candidate transactions for every fee level.
    Compose(ComposeArgs),
    /// Run field validation over a request without composing.
    Validate(ValidateArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `compose` subcommand.
#[derive(Parser, Debug)]
pub struct ComposeArgs {
    /// Path to the JSON compose request (network, account, fee info,
    /// form). Use `-` to read from stdin.
    #[arg(env = "PAYFLOW_REQUEST")]
    pub request: PathBuf,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "PAYFLOW_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `validate` subcommand.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the JSON compose request. Use `-` to read from stdin.
    #[arg(env = "PAYFLOW_REQUEST")]
    pub request: PathBuf,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "PAYFLOW_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}
