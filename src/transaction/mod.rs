//! Transaction - single in-flight transaction lifecycle
//!
//! ```text
//!  Idle ──submit──▶ Submitting ──hash──▶ Pending ──receipt ok──▶ Confirmed
//!                       │                   │
//!                       └──── error ────────┴──── reverted ─────▶ Failed
//! ```
//!
//! `Confirmed` and `Failed` stay put until the next submission or `reset()`.
//! `busy` covers the whole `submit` call. `phase` tells "waiting for the
//! wallet" (Submitting) apart from "waiting for the chain" (Pending).

use serde::{Serialize, Serializer};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::core::networks::{explorer_url, DEFAULT_CHAIN_ID};
use crate::core::observed::Observed;
use crate::provider::{Provider, ProviderError, Receipt, TransactionRequest};
use crate::session::SessionReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxPhase {
    #[default]
    Idle,
    Submitting,
    Pending,
    Confirmed,
    Failed,
}

impl TxPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxPhase::Idle => "idle",
            TxPhase::Submitting => "submitting",
            TxPhase::Pending => "pending",
            TxPhase::Confirmed => "confirmed",
            TxPhase::Failed => "failed",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, TxPhase::Submitting | TxPhase::Pending)
    }
}

/// User-facing failure categories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxError {
    #[error("wallet not connected")]
    NotConnected,
    #[error("transaction rejected by user")]
    Rejected,
    #[error("internal error occurred")]
    Internal,
    /// Mined but reverted.
    #[error("transaction failed")]
    Reverted,
    #[error("{0}")]
    Provider(String),
}

impl From<ProviderError> for TxError {
    fn from(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            TxError::Rejected
        } else if err.is_internal() {
            TxError::Internal
        } else if err.message.trim().is_empty() {
            TxError::Reverted
        } else {
            TxError::Provider(err.message)
        }
    }
}

impl Serialize for TxError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Snapshot of the current transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxState {
    pub hash: Option<String>,
    pub phase: TxPhase,
    pub error: Option<TxError>,
    pub busy: bool,
}

impl TxState {
    /// Status line, or `None` when there is nothing to show.
    pub fn status_message(&self) -> Option<String> {
        if !self.busy && self.hash.is_none() && self.error.is_none() {
            return None;
        }
        if let Some(err) = &self.error {
            return Some(err.to_string());
        }
        Some(match self.phase {
            TxPhase::Pending => "Transaction pending...",
            TxPhase::Confirmed => "Transaction confirmed!",
            TxPhase::Failed => "Transaction failed",
            TxPhase::Idle | TxPhase::Submitting => "Processing transaction...",
        }.to_string())
    }
}

pub struct TransactionManager {
    provider: Rc<dyn Provider>,
    session: SessionReader,
    state: Observed<TxState>,
    default_chain_id: u64,
    /// Bumped by every submission and reset; stale completions are dropped.
    epoch: Cell<u64>,
}

impl TransactionManager {
    pub fn new(provider: Rc<dyn Provider>, session: SessionReader) -> Self {
        Self {
            provider,
            session,
            state: Observed::default(),
            default_chain_id: DEFAULT_CHAIN_ID,
            epoch: Cell::new(0),
        }
    }

    /// Chain used for explorer links while the session has none.
    pub fn with_default_chain(mut self, chain_id: u64) -> Self {
        self.default_chain_id = chain_id;
        self
    }

    pub fn snapshot(&self) -> TxState { self.state.get() }

    pub fn watch(&self) -> futures::channel::mpsc::UnboundedReceiver<TxState> {
        self.state.watch()
    }

    /// Submit through the connected account and wait for confirmation.
    ///
    /// Returns the receipt when the transaction is mined successfully, `None`
    /// on every other path. Outcome details are in `snapshot()`.
    pub async fn submit(&self, request: TransactionRequest) -> Option<Receipt> {
        // The in-flight transaction owns the state until it settles.
        if self.state.read(|s| s.busy || s.phase.is_in_flight()) {
            debug!("submit: transaction already in flight, ignoring");
            return None;
        }
        let Some(account) = self.session.account() else {
            warn!("submit: wallet not connected");
            self.state.update(|s| s.error = Some(TxError::NotConnected));
            return None;
        };

        let epoch = self.advance();
        self.state.update(|s| {
            s.hash = None;
            s.phase = TxPhase::Submitting;
            s.error = None;
            s.busy = true;
        });
        info!(from = %account, to = ?request.to, "submitting transaction");

        let receipt = self.drive(epoch, &account, request).await;
        self.apply(epoch, |s| s.busy = false);
        receipt
    }

    /// Clear observed state. Does not cancel anything provider-side.
    pub fn reset(&self) {
        self.advance();
        self.state.update(|s| *s = TxState::default());
    }

    /// Explorer link for the current hash on the session's chain.
    pub fn transaction_url(&self) -> Option<String> {
        let hash = self.state.read(|s| s.hash.clone())?;
        let chain_id = self.session.chain_id().unwrap_or(self.default_chain_id);
        Some(explorer_url(&hash, chain_id))
    }

    async fn drive(&self, epoch: u64, account: &str, request: TransactionRequest) -> Option<Receipt> {
        let signer = self.provider.signer(account);
        let request = if request.from.is_some() { request } else { request.with_from(signer.address()) };
        let pending = match signer.send_transaction(request).await {
            Ok(pending) => pending,
            Err(err) => {
                self.fail(epoch, err);
                return None;
            }
        };

        let hash = pending.hash().to_string();
        info!(hash = %hash, "transaction accepted, awaiting confirmation");
        self.apply(epoch, |s| {
            s.hash = Some(hash.clone());
            s.phase = TxPhase::Pending;
        });

        match pending.wait().await {
            Ok(receipt) if receipt.succeeded() => {
                info!(hash = %hash, block = ?receipt.block_number, "transaction confirmed");
                self.apply(epoch, |s| s.phase = TxPhase::Confirmed);
                Some(receipt)
            }
            Ok(receipt) => {
                warn!(hash = %hash, status = receipt.status, "transaction reverted");
                self.apply(epoch, |s| {
                    s.phase = TxPhase::Failed;
                    s.error = Some(TxError::Reverted);
                });
                None
            }
            Err(err) => {
                self.fail(epoch, err);
                None
            }
        }
    }

    fn fail(&self, epoch: u64, err: ProviderError) {
        warn!(code = ?err.code, error = %err, "transaction failed");
        let err = TxError::from(err);
        self.apply(epoch, |s| {
            s.phase = TxPhase::Failed;
            s.error = Some(err);
        });
    }

    fn advance(&self) -> u64 {
        let next = self.epoch.get() + 1;
        self.epoch.set(next);
        next
    }

    /// Update state only if no reset or newer submission happened since `epoch`.
    fn apply(&self, epoch: u64, f: impl FnOnce(&mut TxState)) {
        if self.epoch.get() == epoch {
            self.state.update(f);
        } else {
            debug!(epoch, current = self.epoch.get(), "dropping stale transaction update");
        }
    }
}
