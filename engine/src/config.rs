//! # Engine Configuration & Constants
//!
//! Every magic number in the composition engine lives here. If you're
//! hardcoding a constant somewhere else, you're doing it wrong and you
//! owe the team coffee.
//!
//! Most of these values are user-visible timing and validation knobs, so
//! changing them changes how the send form *feels*. Tread carefully.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Composition Timing
// ---------------------------------------------------------------------------

/// Quiet window between the last form edit and the composition attempt.
///
/// Short enough that the form feels live, long enough that mad-clicking
/// an amount stepper produces one external call instead of twenty.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Debounce window as milliseconds — because some APIs want a u64,
/// not a Duration. Keep in sync with [`DEBOUNCE_WINDOW`].
pub const DEBOUNCE_WINDOW_MS: u64 = 300;

// ---------------------------------------------------------------------------
// Token Transfers (account-based networks)
// ---------------------------------------------------------------------------

/// 4-byte method selector for the canonical token `transfer(address,uint256)`
/// call, hex-encoded without a `0x` prefix.
pub const TOKEN_TRANSFER_SELECTOR: &str = "a9059cbb";

/// Fixed fee-unit budget (gas limit) applied to token transfers.
///
/// Token transfers touch contract storage, so the network's default
/// plain-transfer limit is never enough. This is the industry-standard
/// ceiling for a single `transfer` call.
pub const TOKEN_TRANSFER_FEE_LIMIT: &str = "200000";

/// Byte width of a single ABI-encoded call parameter.
pub const CALL_PARAM_BYTES: usize = 32;

// ---------------------------------------------------------------------------
// Field Validation Bounds
// ---------------------------------------------------------------------------

/// Highest lock time interpreted as a block height rather than a unix
/// timestamp. The form only supports height-based lock times; anything
/// above this is rejected at validation.
pub const MAX_BLOCK_LOCK_TIME: u64 = 500_000_000;

/// Maximum number of payment lines a single form may carry. Beyond this
/// the candidate transaction gets unwieldy for every ledger we support.
pub const MAX_FORM_OUTPUTS: usize = 32;

/// Maximum accepted length of a destination address string. A shape
/// check only — real address decoding belongs to the ledger library.
pub const MAX_ADDRESS_LENGTH: usize = 128;

/// Maximum accepted opreturn/memo payload size in bytes (decoded).
pub const MAX_DATA_PAYLOAD_BYTES: usize = 80;

// ---------------------------------------------------------------------------
// Draft Persistence
// ---------------------------------------------------------------------------

/// Name of the sled tree holding per-account form drafts.
pub const DRAFT_TREE: &str = "drafts";

// ---------------------------------------------------------------------------
// Fiat
// ---------------------------------------------------------------------------

/// Number of decimal places shown for fiat mirror values.
pub const FIAT_DECIMALS: u32 = 2;
