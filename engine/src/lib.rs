// Copyright (c) 2026 Payflow Contributors. MIT License.
// See LICENSE for details.

//! # Payflow Engine — Transaction Composition
//!
//! The library behind a wallet's send form: it turns a half-typed form
//! into candidate transactions, one per fee level, continuously and
//! cancellably, and walks the survivor through sign and broadcast.
//!
//! A send form is a surprisingly hostile environment. Every keystroke
//! invalidates the previous answer, fee markets move underneath you,
//! three ledger families disagree about what a "transaction" even is,
//! and the user expects the fee display to keep up with all of it.
//! The engine's answer is a small set of hard rules:
//!
//! - **One writer.** The session owns the form; everything else reads
//!   clones. No reactive soup.
//! - **Stale results die.** Compose attempts carry a generation; an
//!   attempt that finishes after a newer edit mutates nothing.
//! - **Failure is data.** "Can't afford it" is a result, not an error.
//!   Only transport failures raise.
//! - **No floating point near money.** All amount math is exact
//!   fixed-point over decimal strings.
//!
//! ## Architecture
//!
//! - **amounts** — Exact decimal arithmetic for totals, max and fees.
//! - **account** — Network descriptions, account views, tokens.
//! - **fees** — Fee tiers, level assembly, selected-level resolution.
//! - **form** — The form snapshot, mutations, validation, field errors.
//! - **compose** — Per-ledger-family candidate composition + debounce.
//! - **provider** — The seams to the coin-selection/signing backend.
//! - **draft** — Per-account form persistence (memory and sled).
//! - **session** — The compose → sign → push state machine.
//! - **config** — Engine constants.

pub mod account;
pub mod amounts;
pub mod compose;
pub mod config;
pub mod draft;
pub mod fees;
pub mod form;
pub mod provider;
pub mod session;

pub use account::{AccountView, Network, NetworkKind, TokenInfo};
pub use compose::{
    ComposeError, ComposeOutputShape, ComposeResult, ComposedLevels, NetworkComposer,
};
pub use draft::{Draft, DraftStore, MemoryDraftStore, SledDraftStore};
pub use fees::{FeeInfo, FeeLabel, FeeLevel};
pub use form::{FormErrors, FormSnapshot};
pub use provider::{
    FiatRateSource, NoRates, ProviderError, SignedPayload, TransactionProvider,
};
pub use session::{CompositionSession, SessionError, SessionState};
