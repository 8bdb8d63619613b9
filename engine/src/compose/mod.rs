//! # Composition — Candidates per Ledger Family
//!
//! Turning the form into candidate transactions, one result per fee
//! level. The strategy differs per ledger family and is dispatched by
//! [`composer::NetworkComposer`]:
//!
//! ```text
//! utxo.rs      — output shaping + one provider round-trip for all levels
//! account.rs   — local gas math, token transfer encoding
//! reserve.rs   — local flat-fee math over a reserved balance
//! result.rs    — the closed result union + the per-attempt level map
//! debounce.rs  — the edit-burst coordinator around compose attempts
//! ```
//!
//! Affordability failures are results, not errors: every path below
//! returns [`result::ComposeResult`], and only provider transport
//! failures escape as `Err`.

pub mod account;
pub mod composer;
pub mod debounce;
pub mod reserve;
pub mod result;
pub mod utxo;

pub use composer::NetworkComposer;
pub use debounce::{DebounceCoordinator, Debounced};
pub use result::{
    CandidateOutput, CandidateTransaction, ComposeError, ComposeResult, ComposedLevels,
};
pub use utxo::ComposeOutputShape;
