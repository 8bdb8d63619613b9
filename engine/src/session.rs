//! # Composition Session
//!
//! One account's journey from an empty form to a broadcast transaction.
//! The session owns the form snapshot, the error tree and the composed
//! levels, and is the only writer of all three; observers get clones.
//!
//! ```text
//! Idle ──edit──▶ Composing ──levels──▶ Composed ──sign──▶ Signing ──▶ Pushed
//!   ▲                                      │                  │
//!   └────────────── reset ◀────────────────┴──── failure ─────┘
//! ```
//!
//! `Cancelled` is terminal and reachable from anywhere via [`cancel`].
//!
//! Concurrency contract: shared state sits behind a `parking_lot`
//! RwLock that is *never* held across an await. Every edit that passes
//! field validation submits a debounced compose; the result is applied
//! only after re-checking that its generation is still the newest, so a
//! stale attempt can never overwrite a fresher form. A form with
//! blocking validation errors never composes at all — the session drops
//! back to `Idle` until the offending field is fixed.
//!
//! [`cancel`]: CompositionSession::cancel

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::account::AccountView;
use crate::amounts::to_fiat;
use crate::compose::debounce::{DebounceCoordinator, Debounced};
use crate::compose::result::{CandidateTransaction, ComposeResult, ComposedLevels};
use crate::compose::NetworkComposer;
use crate::draft::{Draft, DraftError, DraftStore};
use crate::fees::{resolve_level, FeeInfo, FeeLabel, FeeLevel};
use crate::form::errors::{ErrorKind, FormErrors};
use crate::form::output::OutputKind;
use crate::form::snapshot::FormSnapshot;
use crate::form::validate::validate;
use crate::provider::{FiatRateSource, ProviderError, TransactionProvider};

// ---------------------------------------------------------------------------
// State & errors
// ---------------------------------------------------------------------------

/// Where the session is in the compose → sign → push flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing composable on the form yet.
    Idle,
    /// An edit happened; a compose attempt is pending or in flight.
    Composing,
    /// The last attempt produced levels; the form shows fees.
    Composed,
    /// A sign + broadcast is in flight.
    Signing,
    /// Broadcast succeeded. Terminal for this transaction; `reset`
    /// starts the next one.
    Pushed,
    /// The user abandoned the session. Terminal.
    Cancelled,
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// The requested action is not legal in the current state.
    #[error("illegal transition: cannot {action} while {state:?}")]
    IllegalTransition {
        action: &'static str,
        state: SessionState,
    },

    /// The selected level has no signable candidate.
    #[error("no final candidate on the selected fee level")]
    NoFinalCandidate,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Draft(#[from] DraftError),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct Inner {
    snapshot: FormSnapshot,
    errors: FormErrors,
    composed: ComposedLevels,
    state: SessionState,
    /// Set when a persisted draft was loaded and not yet replayed.
    draft_pending: bool,
    last_txid: Option<String>,
}

/// The composition coordinator for one account.
pub struct CompositionSession {
    account: AccountView,
    composer: NetworkComposer,
    fee_info: FeeInfo,
    provider: Arc<dyn TransactionProvider>,
    drafts: Arc<dyn DraftStore>,
    rates: Arc<dyn FiatRateSource>,
    debounce: DebounceCoordinator,
    inner: RwLock<Inner>,
}

impl CompositionSession {
    /// Open a session. A persisted draft for this account, if any, is
    /// loaded into the form immediately and replayed (composed) on the
    /// first call to [`replay_draft`] — exactly once.
    ///
    /// [`replay_draft`]: Self::replay_draft
    pub fn new(
        account: AccountView,
        composer: NetworkComposer,
        fee_info: FeeInfo,
        provider: Arc<dyn TransactionProvider>,
        drafts: Arc<dyn DraftStore>,
        rates: Arc<dyn FiatRateSource>,
    ) -> Self {
        let draft = drafts.get(&account.key);
        let draft_pending = draft.is_some();
        let snapshot = draft.map(|d| d.form).unwrap_or_default();
        if draft_pending {
            debug!(account = %account.key, "draft loaded into session");
        }
        Self {
            account,
            composer,
            fee_info,
            provider,
            drafts,
            rates,
            debounce: DebounceCoordinator::default(),
            inner: RwLock::new(Inner {
                snapshot,
                errors: FormErrors::new(),
                composed: ComposedLevels::default(),
                state: SessionState::Idle,
                draft_pending,
                last_txid: None,
            }),
        }
    }

    // -- Observers ----------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.inner.read().state
    }

    pub fn snapshot(&self) -> FormSnapshot {
        self.inner.read().snapshot.clone()
    }

    pub fn errors(&self) -> FormErrors {
        self.inner.read().errors.clone()
    }

    pub fn composed(&self) -> ComposedLevels {
        self.inner.read().composed.clone()
    }

    /// The result backing the currently selected fee level.
    pub fn selected_result(&self) -> Option<ComposeResult> {
        let inner = self.inner.read();
        if inner.composed.is_empty() {
            return None;
        }
        Some(resolve_level(&inner.composed, inner.snapshot.selected_fee).result)
    }

    pub fn last_txid(&self) -> Option<String> {
        self.inner.read().last_txid.clone()
    }

    // -- Draft replay -------------------------------------------------------

    /// Compose the loaded draft, once. Later calls (or calls when no
    /// draft existed) do nothing and return `false`. Replay skips the
    /// debounce window — the user didn't type anything, they reopened
    /// the form.
    pub async fn replay_draft(&self) -> Result<bool, SessionError> {
        let snapshot = {
            let mut inner = self.inner.write();
            if !inner.draft_pending {
                return Ok(false);
            }
            inner.draft_pending = false;
            inner.errors = validate(&inner.snapshot, self.composer.network(), &self.fee_info);
            if inner.errors.has_blocking_errors() {
                debug!("replayed draft has blocking validation errors, attempt halted");
                inner.state = SessionState::Idle;
                return Ok(true);
            }
            inner.state = SessionState::Composing;
            inner.snapshot.clone()
        };
        let levels = self
            .composer
            .compose(&snapshot, &self.account, &self.fee_info, self.provider.as_ref())
            .await;
        self.finish_attempt(levels)?;
        Ok(true)
    }

    // -- Edits --------------------------------------------------------------

    pub async fn set_address(&self, index: usize, address: &str) -> Result<(), SessionError> {
        let address = address.to_string();
        self.edit(move |form| form.set_address(index, address)).await
    }

    pub async fn set_amount(&self, index: usize, amount: &str) -> Result<(), SessionError> {
        let amount = amount.to_string();
        self.edit(move |form| {
            // Typing an amount releases the line from send-max.
            if form.is_max_target(index) {
                form.set_max_target(None);
            }
            form.set_amount(index, amount);
        })
        .await
    }

    pub async fn set_data_hex(&self, index: usize, data_hex: &str) -> Result<(), SessionError> {
        let data_hex = data_hex.to_string();
        self.edit(move |form| form.set_data_hex(index, data_hex)).await
    }

    pub async fn add_output(&self) -> Result<(), SessionError> {
        self.edit(|form| {
            form.add_output();
        })
        .await
    }

    pub async fn add_opreturn(&self) -> Result<(), SessionError> {
        self.edit(|form| {
            form.add_opreturn();
        })
        .await
    }

    pub async fn remove_output(&self, index: usize) -> Result<(), SessionError> {
        self.edit(move |form| form.remove_output(index)).await
    }

    pub async fn set_max_target(&self, index: Option<usize>) -> Result<(), SessionError> {
        self.edit(move |form| {
            form.set_max_target(index);
            if let Some(index) = index {
                // The derived amount will be written back on settle.
                form.set_amount(index, "");
            }
        })
        .await
    }

    /// Switch fee level. Switching to custom seeds the custom input
    /// from the currently selected level's price, once.
    pub async fn select_fee(&self, label: FeeLabel) -> Result<(), SessionError> {
        let previous = self.current_level();
        self.edit(move |form| form.select_fee(label, previous.as_ref())).await
    }

    pub async fn set_custom_fee(&self, fee_per_unit: &str) -> Result<(), SessionError> {
        let fee_per_unit = fee_per_unit.to_string();
        self.edit(move |form| form.set_custom_fee(fee_per_unit)).await
    }

    pub async fn set_fee_limit(&self, fee_limit: &str) -> Result<(), SessionError> {
        let fee_limit = fee_limit.to_string();
        self.edit(move |form| form.set_fee_limit(fee_limit)).await
    }

    pub async fn set_lock_time(&self, lock_time: &str) -> Result<(), SessionError> {
        let lock_time = lock_time.to_string();
        self.edit(move |form| form.set_lock_time(lock_time)).await
    }

    pub async fn set_destination_tag(&self, tag: &str) -> Result<(), SessionError> {
        let tag = tag.to_string();
        self.edit(move |form| form.set_destination_tag(tag)).await
    }

    pub async fn set_token_contract(&self, contract: Option<String>) -> Result<(), SessionError> {
        self.edit(move |form| form.set_token_contract(contract)).await
    }

    /// Apply one mutation, persist the draft, and schedule a debounced
    /// compose attempt. A mutation that leaves the form with blocking
    /// validation errors halts here: no draft save, no attempt, levels
    /// cleared, state back to `Idle`.
    async fn edit<F>(&self, mutate: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut FormSnapshot),
    {
        let snapshot = {
            let mut inner = self.inner.write();
            match inner.state {
                SessionState::Idle | SessionState::Composing | SessionState::Composed => {}
                state => {
                    return Err(SessionError::IllegalTransition {
                        action: "edit",
                        state,
                    })
                }
            }
            mutate(&mut inner.snapshot);
            inner.errors = validate(&inner.snapshot, self.composer.network(), &self.fee_info);
            if inner.errors.has_blocking_errors() {
                debug!("edit left blocking validation errors, attempt halted");
                // An older in-flight attempt must not resurrect the
                // fee display over an invalid form.
                self.debounce.invalidate();
                inner.composed = ComposedLevels::default();
                inner.state = SessionState::Idle;
                return Ok(());
            }
            inner.state = SessionState::Composing;
            inner.snapshot.clone()
        };

        self.drafts
            .save(&self.account.key, &Draft::new(snapshot.clone()))?;

        let outcome = self
            .debounce
            .submit(|| {
                self.composer.compose(
                    &snapshot,
                    &self.account,
                    &self.fee_info,
                    self.provider.as_ref(),
                )
            })
            .await;

        match outcome {
            Debounced::Superseded => Ok(()),
            Debounced::Settled { value, generation } => {
                // The form may have moved on while we waited for the
                // write lock; a stale result mutates nothing.
                if !self.debounce.is_current(generation) {
                    return Ok(());
                }
                self.finish_attempt(value)
            }
        }
    }

    // -- Applying results ---------------------------------------------------

    fn finish_attempt(
        &self,
        levels: Result<ComposedLevels, ProviderError>,
    ) -> Result<(), SessionError> {
        let mut inner = self.inner.write();
        let levels = match levels {
            Ok(levels) => levels,
            Err(err) => {
                warn!(%err, "compose attempt failed at the provider");
                inner.state = if inner.composed.is_empty() {
                    SessionState::Idle
                } else {
                    SessionState::Composed
                };
                return Err(err.into());
            }
        };

        inner.errors.clear_compose_errors();

        if levels.is_empty() {
            inner.composed = ComposedLevels::default();
            inner.state = SessionState::Idle;
            return Ok(());
        }

        let selection = resolve_level(&levels, inner.snapshot.selected_fee);
        if selection.switched {
            debug!(level = %selection.label, "fee level switched by fallback");
            inner.snapshot.selected_fee = Some(selection.label);
        }
        if let Some(seed) = &selection.custom_fee_seed {
            if inner.snapshot.fee_per_unit.is_empty() {
                inner.snapshot.fee_per_unit = seed.clone();
            }
        }

        match &selection.result {
            ComposeResult::Error { error } => {
                let index = Self::compose_error_index(&inner.snapshot);
                inner
                    .errors
                    .set_output_field(index, "amount", ErrorKind::Compose, error.code());
            }
            result => {
                // Send-max writeback: the derived amount lands in the
                // target's amount field, fiat mirror included.
                if let (Some(index), Some(max)) =
                    (inner.snapshot.set_max_output_id, result.max())
                {
                    let max = max.to_string();
                    let fiat = to_fiat(
                        &max,
                        self.rates
                            .rate(&self.composer.network().symbol)
                            .as_deref(),
                    );
                    inner.snapshot.set_amount(index, max);
                    inner.snapshot.set_fiat(index, fiat.unwrap_or_default());
                }
            }
        }

        inner.composed = levels;
        inner.state = SessionState::Composed;
        Ok(())
    }

    /// Which output a level-wide compose error is pinned to: the
    /// send-max target if there is one, otherwise the first payment
    /// line carrying an amount, otherwise the first line.
    fn compose_error_index(snapshot: &FormSnapshot) -> usize {
        if let Some(index) = snapshot.set_max_output_id {
            return index;
        }
        snapshot
            .outputs
            .iter()
            .position(|o| o.kind == OutputKind::Payment && o.has_amount())
            .unwrap_or(0)
    }

    fn current_level(&self) -> Option<FeeLevel> {
        let selected = self.inner.read().snapshot.selected_fee?;
        self.fee_info
            .levels
            .iter()
            .find(|l| l.label == selected)
            .cloned()
    }

    // -- Sign & push --------------------------------------------------------

    /// Sign the selected candidate and broadcast it. Legal only from
    /// `Composed` with a final candidate; a form with blocking
    /// validation errors never reaches `Composed` in the first place.
    /// On provider failure the session returns to `Composed` with its
    /// levels intact — the user retries without recomposing.
    pub async fn sign(&self) -> Result<String, SessionError> {
        let transaction = {
            let mut inner = self.inner.write();
            if inner.state != SessionState::Composed {
                return Err(SessionError::IllegalTransition {
                    action: "sign",
                    state: inner.state,
                });
            }
            let selection = resolve_level(&inner.composed, inner.snapshot.selected_fee);
            let transaction = match selection.result {
                ComposeResult::Final { transaction, .. } => transaction,
                _ => return Err(SessionError::NoFinalCandidate),
            };
            inner.state = SessionState::Signing;
            transaction
        };

        let txid = self.sign_and_push(&transaction).await;
        let mut inner = self.inner.write();
        match txid {
            Ok(txid) => {
                info!(account = %self.account.key, %txid, "transaction pushed");
                inner.state = SessionState::Pushed;
                inner.last_txid = Some(txid.clone());
                drop(inner);
                if let Err(err) = self.drafts.remove(&self.account.key) {
                    warn!(%err, "failed to remove draft after push");
                }
                Ok(txid)
            }
            Err(err) => {
                warn!(%err, "sign or broadcast failed, returning to composed");
                inner.state = SessionState::Composed;
                Err(err.into())
            }
        }
    }

    async fn sign_and_push(
        &self,
        transaction: &CandidateTransaction,
    ) -> Result<String, ProviderError> {
        let payload = self.provider.sign(&self.account, transaction).await?;
        self.provider.broadcast(&payload).await
    }

    // -- Reset & cancel -----------------------------------------------------

    /// Wipe the form and start over. The persisted draft goes with it.
    /// Legal from every state except `Cancelled`.
    pub fn reset(&self) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.write();
            if inner.state == SessionState::Cancelled {
                return Err(SessionError::IllegalTransition {
                    action: "reset",
                    state: inner.state,
                });
            }
            inner.snapshot = FormSnapshot::new();
            inner.errors = FormErrors::new();
            inner.composed = ComposedLevels::default();
            inner.state = SessionState::Idle;
            inner.draft_pending = false;
        }
        self.drafts.remove(&self.account.key)?;
        debug!(account = %self.account.key, "session reset");
        Ok(())
    }

    /// Abandon the session. Terminal: every later operation fails with
    /// an illegal-transition error. The draft survives — abandoning the
    /// window is not discarding the half-typed payment.
    pub fn cancel(&self) {
        let mut inner = self.inner.write();
        inner.state = SessionState::Cancelled;
        debug!(account = %self.account.key, "session cancelled");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
