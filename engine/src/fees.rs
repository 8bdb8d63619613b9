//! # Fee Levels & Level Resolution
//!
//! A fee level is a named pricing tier (`normal`, `economy`, …) with a
//! per-unit price and a confirmation-time estimate. Levels arrive from
//! an external fee source per block height and are immutable once
//! fetched — the engine only appends the synthetic `custom` level and
//! picks which tier the session should sit on after each attempt.
//!
//! Level resolution is where "the user asked for normal but normal
//! doesn't fit" gets handled: scan the defined order for the nearest
//! level that composes, and when even that fails, hand back a synthetic
//! exhausted error instead of pretending nothing happened.

use serde::{Deserialize, Serialize};

use crate::account::{Network, NetworkKind};
use crate::compose::result::{ComposeError, ComposeResult, ComposedLevels};
use crate::config::TOKEN_TRANSFER_FEE_LIMIT;

// ---------------------------------------------------------------------------
// FeeLabel
// ---------------------------------------------------------------------------

/// Named fee tier. Closed set — a fee source cannot invent new tiers
/// without the engine knowing how to order them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeLabel {
    High,
    Normal,
    Economy,
    Low,
    /// User-priced tier; `fee_per_unit` comes from the form's custom
    /// fee input, seeded from the previously active level.
    Custom,
}

impl std::fmt::Display for FeeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Normal => "normal",
            Self::Economy => "economy",
            Self::Low => "low",
            Self::Custom => "custom",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// FeeLevel & FeeInfo
// ---------------------------------------------------------------------------

/// One fee tier as supplied by the fee source (plus the synthetic
/// custom tier the engine appends).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLevel {
    /// Tier name.
    pub label: FeeLabel,

    /// Price per fee unit in the network's fee denomination
    /// (sat/B, gwei, drops — see [`Network::fee_units`]).
    pub fee_per_unit: String,

    /// Confirmation-time estimate in blocks. `-1` for the custom tier,
    /// which carries no estimate.
    pub blocks: i64,

    /// Fee-unit budget (gas-limit analogue) on metered ledgers.
    pub fee_limit: Option<String>,
}

impl FeeLevel {
    /// The synthetic user-priced tier appended to every level set.
    pub fn custom() -> Self {
        Self {
            label: FeeLabel::Custom,
            fee_per_unit: "0".to_string(),
            blocks: -1,
            fee_limit: None,
        }
    }
}

/// Per-network fee snapshot, fetched externally once per block height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeInfo {
    /// Block height the levels were estimated at.
    pub block_height: u64,

    /// Average block time in seconds, for "≈ N minutes" rendering.
    pub block_time: u64,

    /// Lowest fee-per-unit the network relays. Custom fee input is
    /// validated against this.
    pub min_fee: u64,

    /// Highest fee-per-unit the form accepts. Guards against fat-finger
    /// fees, not against the network.
    pub max_fee: u64,

    /// Tiers in defined (fallback-scan) order, fastest first.
    pub levels: Vec<FeeLevel>,
}

/// Assemble the level set one composition attempt runs against.
///
/// Appends the synthetic custom tier, and on account-based networks
/// forces the token-transfer fee limit onto every tier when a token is
/// being sent — a plain-transfer gas budget cannot execute a contract
/// call.
pub fn fee_levels_for(network: &Network, fee_info: &FeeInfo, token: bool) -> Vec<FeeLevel> {
    let mut levels = fee_info.levels.clone();
    levels.push(FeeLevel::custom());

    if network.kind == NetworkKind::Account && token {
        for level in &mut levels {
            level.fee_limit = Some(TOKEN_TRANSFER_FEE_LIMIT.to_string());
        }
    }

    levels
}

// ---------------------------------------------------------------------------
// Level Resolution
// ---------------------------------------------------------------------------

/// Outcome of resolving one [`ComposedLevels`] against the user's
/// selected tier.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    /// The tier the session should sit on after this attempt.
    pub label: FeeLabel,

    /// The result backing that tier. Synthetic
    /// [`ComposeError::LevelsExhausted`] when nothing composed.
    pub result: ComposeResult,

    /// Fee-per-unit value to seed the custom input with, when the
    /// fallback landed on the custom tier. The session applies this
    /// only if the user hasn't typed a custom value yet.
    pub custom_fee_seed: Option<String>,

    /// True when the resolver moved away from the requested tier.
    pub switched: bool,
}

/// Map a composed attempt to a single selected tier.
///
/// The requested tier wins when it composed. When it errored (or the
/// user never picked one), the scan walks the defined order and takes
/// the first non-error tier — "nearest possible". When every tier
/// errored, the selection keeps the requested label and degrades to a
/// synthetic exhausted error so the caller still has exactly one result
/// to show.
pub fn resolve_level(composed: &ComposedLevels, selected: Option<FeeLabel>) -> Selection {
    let requested = selected.unwrap_or(FeeLabel::Normal);

    if let Some(result) = composed.get(requested) {
        if !result.is_error() {
            return Selection {
                label: requested,
                result: result.clone(),
                custom_fee_seed: None,
                switched: false,
            };
        }
    }

    match composed.first_non_error() {
        Some((label, result)) => {
            let custom_fee_seed = if label == FeeLabel::Custom {
                result.fee_per_unit().map(str::to_string)
            } else {
                None
            };
            Selection {
                label,
                result: result.clone(),
                custom_fee_seed,
                switched: label != requested,
            }
        }
        None => Selection {
            label: requested,
            result: ComposeResult::error(ComposeError::LevelsExhausted),
            custom_fee_seed: None,
            switched: false,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
