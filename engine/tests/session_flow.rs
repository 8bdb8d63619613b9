//! End-to-end integration tests for the composition engine.
//!
//! These tests exercise the full send flow against deterministic
//! in-process providers: opening a session, typing a payment, watching
//! fee levels arrive, falling back when the selected level cannot
//! compose, signing, broadcasting, and replaying a persisted draft from
//! a real (temporary) sled store.
//!
//! Each test stands alone with its own session, provider and draft
//! store. No shared state, no test ordering dependencies.

use std::sync::Arc;

use async_trait::async_trait;

use payflow_engine::compose::utxo::ComposeOutputShape;
use payflow_engine::compose::{
    CandidateOutput, CandidateTransaction, ComposeError, ComposeResult,
};
use payflow_engine::draft::SledDraftStore;
use payflow_engine::provider::{NoRates, SignedPayload};
use payflow_engine::{
    AccountView, CompositionSession, FeeInfo, FeeLabel, FeeLevel, Network, NetworkComposer,
    NetworkKind, ProviderError, SessionState, TransactionProvider,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// A coin-selecting provider with honest arithmetic: fee is
/// `fee_per_unit × 200` (a fixed virtual size), and a level composes
/// only if the requested outputs plus that fee fit in the balance.
struct ArithmeticProvider {
    balance: u64,
}

impl ArithmeticProvider {
    const VSIZE: u64 = 200;

    fn compose_one(&self, level: &FeeLevel, shapes: &[ComposeOutputShape]) -> ComposeResult {
        let fee_per_unit: u64 = match level.fee_per_unit.parse() {
            Ok(v) => v,
            Err(_) => return ComposeResult::error(ComposeError::NotEnoughFunds),
        };
        let fee = fee_per_unit * Self::VSIZE;

        let mut requested: u64 = 0;
        let mut send_max = false;
        let mut addressed = true;
        let mut outputs = Vec::new();
        let mut data_hex = None;

        for shape in shapes {
            match shape {
                ComposeOutputShape::External { address, amount } => {
                    let amount: u64 = amount.parse().unwrap_or(0);
                    requested += amount;
                    outputs.push(CandidateOutput {
                        address: address.clone(),
                        amount: amount.to_string(),
                    });
                }
                ComposeOutputShape::NoAddress { amount } => {
                    requested += amount.parse().unwrap_or(0);
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

        if self.balance < requested + fee {
            return ComposeResult::error(ComposeError::NotEnoughFunds);
        }

        let max = self.balance - requested - fee;
        let (total_spent, max_field) = if send_max {
            // Send-max consumes everything above the fixed outputs.
            for output in &mut outputs {
                if output.amount == "0" {
                    output.amount = max.to_string();
                }
            }
            (
                self.balance.to_string(),
                Some(format!("0.{:08}", max).trim_end_matches('0').to_string()),
            )
        } else {
            ((requested + fee).to_string(), None)
        };

        if addressed {
            ComposeResult::Final {
                total_spent,
                fee: fee.to_string(),
                fee_per_unit: level.fee_per_unit.clone(),
                fee_limit: None,
                max: max_field,
                transaction: CandidateTransaction { outputs, data_hex },
            }
        } else {
            ComposeResult::Nonfinal {
                total_spent,
                fee: fee.to_string(),
                fee_per_unit: level.fee_per_unit.clone(),
                max: max_field,
            }
        }
    }
}

#[async_trait]
impl TransactionProvider for ArithmeticProvider {
    async fn compose_candidates(
        &self,
        _account: &AccountView,
        levels: &[FeeLevel],
        shapes: &[ComposeOutputShape],
    ) -> Result<Vec<ComposeResult>, ProviderError> {
        Ok(levels
            .iter()
            .map(|level| self.compose_one(level, shapes))
            .collect())
    }

    async fn sign(
        &self,
        _account: &AccountView,
        transaction: &CandidateTransaction,
    ) -> Result<SignedPayload, ProviderError> {
        Ok(SignedPayload {
            payload_hex: format!("signed:{}", transaction.outputs.len()),
        })
    }

    async fn broadcast(&self, payload: &SignedPayload) -> Result<String, ProviderError> {
        Ok(format!("txid:{}", payload.payload_hex))
    }
}

fn btc_network() -> Network {
    Network {
        symbol: "btc".to_string(),
        decimals: 8,
        kind: NetworkKind::Utxo,
        dust_limit: "546".to_string(),
        reserve: "0".to_string(),
    }
}

fn btc_account(balance: u64) -> AccountView {
    AccountView {
        key: "btc-acct-1".to_string(),
        descriptor: "xpub-test".to_string(),
        balance: balance.to_string(),
        available_balance: balance.to_string(),
        tokens: vec![],
        utxo_count: 4,
    }
}

fn btc_fee_info() -> FeeInfo {
    FeeInfo {
        block_height: 800_000,
        block_time: 600,
        min_fee: 1,
        max_fee: 2000,
        levels: vec![
            FeeLevel {
                label: FeeLabel::High,
                fee_per_unit: "40".to_string(),
                blocks: 1,
                fee_limit: None,
            },
            FeeLevel {
                label: FeeLabel::Normal,
                fee_per_unit: "10".to_string(),
                blocks: 3,
                fee_limit: None,
            },
            FeeLevel {
                label: FeeLabel::Economy,
                fee_per_unit: "2".to_string(),
                blocks: 24,
                fee_limit: None,
            },
        ],
    }
}

fn open_session(balance: u64, drafts: Arc<SledDraftStore>) -> CompositionSession {
    CompositionSession::new(
        btc_account(balance),
        NetworkComposer::new(btc_network()),
        btc_fee_info(),
        Arc::new(ArithmeticProvider { balance }),
        drafts,
        Arc::new(NoRates),
    )
}

fn temp_drafts() -> Arc<SledDraftStore> {
    Arc::new(SledDraftStore::open_temporary().expect("temp sled"))
}

// ---------------------------------------------------------------------------
// 1. Full Send Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn full_send_lifecycle() {
    let session = open_session(100_000_000, temp_drafts());
    assert_eq!(session.state(), SessionState::Idle);

    // Type a destination and an amount; the form composes.
    session.set_address(0, "bc1qdest").await.unwrap();
    session.set_amount(0, "0.5").await.unwrap();
    assert_eq!(session.state(), SessionState::Composed);

    // All three source levels composed; normal is selected by default.
    let composed = session.composed();
    assert_eq!(composed.len(), 3);
    let result = session.selected_result().unwrap();
    assert!(result.is_final());
    assert_eq!(result.fee(), Some("2000")); // 10 sat/B × 200 vB

    // Sign and push.
    let txid = session.sign().await.unwrap();
    assert_eq!(txid, "txid:signed:1");
    assert_eq!(session.state(), SessionState::Pushed);
    assert_eq!(session.last_txid().as_deref(), Some(txid.as_str()));
}

// ---------------------------------------------------------------------------
// 2. Fee-Level Fallback
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn fallback_moves_to_the_nearest_affordable_level() {
    // 1.000005 BTC: over a 1 BTC send, high (8000 sat fee) doesn't
    // fit, normal (2000) doesn't either, economy (400) does.
    let session = open_session(100_000_500, temp_drafts());

    session.set_address(0, "bc1qdest").await.unwrap();
    session.select_fee(FeeLabel::High).await.unwrap();
    session.set_amount(0, "1").await.unwrap();

    assert_eq!(session.state(), SessionState::Composed);
    let form = session.snapshot();
    assert_eq!(form.selected_fee, Some(FeeLabel::Economy));
    assert_eq!(session.selected_result().unwrap().fee(), Some("400"));

    // The levels that failed are still visible as errors.
    let composed = session.composed();
    assert!(composed.get(FeeLabel::High).unwrap().is_error());
    assert!(composed.get(FeeLabel::Normal).unwrap().is_error());
}

#[tokio::test(start_paused = true)]
async fn exhausted_levels_surface_as_a_compose_error() {
    let session = open_session(1_000, temp_drafts());

    session.set_address(0, "bc1qdest").await.unwrap();
    session.set_amount(0, "0.5").await.unwrap();

    assert_eq!(session.state(), SessionState::Composed);
    let errors = session.errors();
    assert_eq!(
        errors.as_value()["outputs"][0]["amount"]["message"],
        "LEVELS-EXHAUSTED"
    );
    assert!(matches!(
        session.sign().await,
        Err(payflow_engine::SessionError::NoFinalCandidate)
    ));
}

// ---------------------------------------------------------------------------
// 3. Edit Bursts
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn rapid_edits_keep_only_the_newest_result() {
    let session = Arc::new(open_session(100_000_000, temp_drafts()));
    session.set_address(0, "bc1qdest").await.unwrap();

    // Three amount edits in quick succession.
    let mut handles = Vec::new();
    for amount in ["0.1", "0.2", "0.3"] {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            session.set_amount(0, amount).await
        }));
        tokio::time::advance(std::time::Duration::from_millis(50)).await;
    }
    tokio::time::advance(std::time::Duration::from_millis(1000)).await;
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // The surviving result reflects the last edit only.
    assert_eq!(session.snapshot().outputs[0].amount, "0.3");
    let result = session.selected_result().unwrap();
    match result {
        ComposeResult::Final { total_spent, .. } => {
            assert_eq!(total_spent, "30002000"); // 0.3 BTC + 2000 sat
        }
        other => panic!("expected final, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// 4. Draft Persistence
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn draft_survives_session_teardown_and_replays_once() {
    let drafts = temp_drafts();
    {
        let session = open_session(100_000_000, drafts.clone());
        session.set_address(0, "bc1qdest").await.unwrap();
        session.set_amount(0, "0.25").await.unwrap();
        session.cancel();
    }

    let reopened = open_session(100_000_000, drafts.clone());
    let form = reopened.snapshot();
    assert_eq!(form.outputs[0].address, "bc1qdest");
    assert_eq!(form.outputs[0].amount, "0.25");

    assert!(reopened.replay_draft().await.unwrap());
    assert_eq!(reopened.state(), SessionState::Composed);
    assert!(reopened.selected_result().unwrap().is_final());
    assert!(!reopened.replay_draft().await.unwrap());

    // Pushing the replayed draft removes it for good.
    reopened.sign().await.unwrap();
    let fresh = open_session(100_000_000, drafts);
    assert_eq!(fresh.snapshot().outputs[0].amount, "");
}

// ---------------------------------------------------------------------------
// 5. Custom Fee Flow
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn custom_fee_is_seeded_then_composed() {
    let session = open_session(100_000_000, temp_drafts());
    session.set_address(0, "bc1qdest").await.unwrap();
    session.set_amount(0, "0.5").await.unwrap();
    session.select_fee(FeeLabel::Normal).await.unwrap();

    // First switch to custom seeds from normal.
    session.select_fee(FeeLabel::Custom).await.unwrap();
    assert_eq!(session.snapshot().fee_per_unit, "10");

    // Reprice and recompose.
    session.set_custom_fee("3").await.unwrap();
    let result = session.selected_result().unwrap();
    assert_eq!(result.fee(), Some("600"));
    assert_eq!(result.fee_per_unit(), Some("3"));
}
