//! # External Provider Contracts
//!
//! The engine's two outward seams, as traits so tests can run against
//! deterministic in-process fakes:
//!
//! - [`TransactionProvider`] — coin selection on UTXO networks, signing
//!   and broadcast everywhere. This is the *only* place a composition
//!   failure is a raised error: an unaffordable transaction comes back
//!   as [`ComposeResult::Error`] data, but a dead connection is a
//!   [`ProviderError`].
//! - [`FiatRateSource`] — best-effort exchange rates for the fiat
//!   mirror. No error type at all; an unavailable rate is `None` and
//!   the form simply shows no fiat.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::AccountView;
use crate::compose::result::{CandidateTransaction, ComposeResult};
use crate::compose::utxo::ComposeOutputShape;
use crate::fees::FeeLevel;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Transport-level failure talking to the external provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider could not be reached or dropped the connection.
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    /// The provider answered with something the engine cannot use.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// The user rejected the action on the signing device.
    #[error("signing rejected: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// TransactionProvider
// ---------------------------------------------------------------------------

/// A signed transaction ready to broadcast. Opaque to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    /// Serialized signed transaction, hex.
    pub payload_hex: String,
}

/// Coin selection, signing and broadcast, delegated to the wallet's
/// backend/device stack.
#[async_trait]
pub trait TransactionProvider: Send + Sync {
    /// Compose UTXO candidates for every fee level in one call. The
    /// provider performs coin selection over the account's outputs and
    /// answers one [`ComposeResult`] per requested level, in order.
    async fn compose_candidates(
        &self,
        account: &AccountView,
        levels: &[FeeLevel],
        shapes: &[ComposeOutputShape],
    ) -> Result<Vec<ComposeResult>, ProviderError>;

    /// Sign a final candidate.
    async fn sign(
        &self,
        account: &AccountView,
        transaction: &CandidateTransaction,
    ) -> Result<SignedPayload, ProviderError>;

    /// Broadcast a signed payload; returns the transaction id.
    async fn broadcast(&self, payload: &SignedPayload) -> Result<String, ProviderError>;
}

// ---------------------------------------------------------------------------
// FiatRateSource
// ---------------------------------------------------------------------------

/// Best-effort exchange rates for the fiat mirror.
pub trait FiatRateSource: Send + Sync {
    /// Current rate of the network's currency in the wallet's fiat
    /// currency, as a decimal string. `None` when unknown — never an
    /// error, the mirror just stays blank.
    fn rate(&self, symbol: &str) -> Option<String>;
}

/// A rate source that knows nothing. The engine works fully without
/// fiat data.
pub struct NoRates;

impl FiatRateSource for NoRates {
    fn rate(&self, _symbol: &str) -> Option<String> {
        None
    }
}
