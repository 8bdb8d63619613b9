//! # Network & Account Views
//!
//! Read-only descriptions of the ledger and account a composition
//! session operates on. The engine never mutates these — balances and
//! token lists belong to the surrounding wallet; the engine only asks
//! "can this be sent, and for how much".
//!
//! Three ledger families are supported, and everything downstream
//! dispatches on [`NetworkKind`]:
//!
//! - **Utxo** — spendable balance is a set of discrete outputs; coin
//!   selection is delegated to the external provider.
//! - **Account** — one balance, metered computation: fee is
//!   `gas price × gas limit`, optionally carrying a token transfer.
//! - **Reserve** — one balance with a minimum retained amount the
//!   ledger refuses to release.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// The ledger model a network follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    /// Discrete unspent outputs, external coin selection.
    Utxo,
    /// Single account balance, gas-denominated fees, token support.
    Account,
    /// Single account balance with a mandatory retained reserve.
    Reserve,
}

/// Static description of one supported network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Network {
    /// Ticker symbol, lowercase (`"btc"`, `"eth"`, `"xrp"`).
    pub symbol: String,

    /// Number of decimal places between display units and smallest units.
    pub decimals: u32,

    /// Which composition strategy applies.
    pub kind: NetworkKind,

    /// Smallest amount (in smallest units) an output may carry without
    /// being rejected as dust. `"0"` disables the check.
    pub dust_limit: String,

    /// Minimum balance (smallest units) the ledger requires the account
    /// to retain. Only meaningful for [`NetworkKind::Reserve`].
    pub reserve: String,
}

impl Network {
    /// Display name for the network's fee unit, used by the UI layer
    /// next to the custom fee input.
    pub fn fee_units(&self) -> &'static str {
        match self.kind {
            NetworkKind::Utxo => "sat/B",
            NetworkKind::Account => "gwei",
            NetworkKind::Reserve => "drops",
        }
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// A token held by an account on an account-based network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Contract address the transfer call is sent to.
    pub contract: String,

    /// Ticker symbol for display.
    pub symbol: String,

    /// Token decimal places (display ↔ smallest units).
    pub decimals: u32,

    /// Current token balance in smallest units.
    pub balance: String,
}

/// Find a token by contract address. `None` when `contract` is absent
/// or unknown — the caller falls back to a native-currency transfer.
pub fn find_token<'a>(tokens: &'a [TokenInfo], contract: Option<&str>) -> Option<&'a TokenInfo> {
    let contract = contract?;
    tokens.iter().find(|t| t.contract == contract)
}

// ---------------------------------------------------------------------------
// AccountView
// ---------------------------------------------------------------------------

/// The engine's view of the account being spent from.
///
/// `available_balance` already has any ledger reserve subtracted — the
/// wallet computes it once per account refresh so that every composer
/// sees the same spendable number.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountView {
    /// Stable account identity; also the draft-store key.
    pub key: String,

    /// Wallet descriptor handed to the external provider for coin
    /// selection and signing. Opaque to the engine.
    pub descriptor: String,

    /// Total confirmed balance in smallest units.
    pub balance: String,

    /// Spendable balance in smallest units (reserve already deducted).
    pub available_balance: String,

    /// Tokens held, for account-based networks. Empty elsewhere.
    pub tokens: Vec<TokenInfo>,

    /// Number of spendable unspent outputs. Zero on non-UTXO networks;
    /// zero on a UTXO network means there is nothing to compose with.
    pub utxo_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(contract: &str) -> TokenInfo {
        TokenInfo {
            contract: contract.to_string(),
            symbol: "tkn".to_string(),
            decimals: 6,
            balance: "1000000".to_string(),
        }
    }

    #[test]
    fn find_token_matches_contract() {
        let tokens = vec![token("0xaaaa"), token("0xbbbb")];
        assert_eq!(
            find_token(&tokens, Some("0xbbbb")).map(|t| t.contract.as_str()),
            Some("0xbbbb")
        );
        assert!(find_token(&tokens, Some("0xcccc")).is_none());
        assert!(find_token(&tokens, None).is_none());
    }

    #[test]
    fn fee_units_per_kind() {
        let mut net = Network {
            symbol: "btc".to_string(),
            decimals: 8,
            kind: NetworkKind::Utxo,
            dust_limit: "546".to_string(),
            reserve: "0".to_string(),
        };
        assert_eq!(net.fee_units(), "sat/B");
        net.kind = NetworkKind::Account;
        assert_eq!(net.fee_units(), "gwei");
        net.kind = NetworkKind::Reserve;
        assert_eq!(net.fee_units(), "drops");
    }
}
