//! WalletClient - the consumer-facing surface
//!
//! Owns both state machines. The transaction manager only sees a read-only
//! session handle, so the dependency runs one way.

use serde::Serialize;
use std::rc::Rc;
use tracing::info;

use crate::config::ClientConfig;
use crate::core::networks::explorer_url;
use crate::provider::{Provider, Receipt, TransactionRequest};
use crate::session::{ConnectionManager, Session};
use crate::transaction::{TransactionManager, TxState};

/// Both snapshots, for consumers that render everything at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSnapshot {
    pub session: Session,
    pub transaction: TxState,
}

pub struct WalletClient {
    config: ClientConfig,
    connection: ConnectionManager,
    transactions: TransactionManager,
}

impl WalletClient {
    /// Build both managers, restoring an authorized session when configured.
    pub async fn start(provider: Rc<dyn Provider>, config: ClientConfig) -> Self {
        info!(app = %config.app, restore = config.restore_session, "starting wallet client");
        let connection = if config.restore_session {
            ConnectionManager::init(provider.clone()).await
        } else {
            ConnectionManager::new(provider.clone())
        };
        let transactions = TransactionManager::new(provider, connection.reader())
            .with_default_chain(config.default_chain_id);
        Self { config, connection, transactions }
    }

    pub fn config(&self) -> &ClientConfig { &self.config }
    pub fn connection(&self) -> &ConnectionManager { &self.connection }
    pub fn transactions(&self) -> &TransactionManager { &self.transactions }

    pub fn session(&self) -> Session { self.connection.snapshot() }
    pub fn transaction(&self) -> TxState { self.transactions.snapshot() }

    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot { session: self.session(), transaction: self.transaction() }
    }

    pub async fn connect(&self) { self.connection.connect().await }
    pub fn disconnect(&self) { self.connection.disconnect() }

    pub async fn submit(&self, request: TransactionRequest) -> Option<Receipt> {
        self.transactions.submit(request).await
    }

    pub fn reset(&self) { self.transactions.reset() }

    pub fn explorer_url(&self, hash: &str, chain_id: Option<u64>) -> String {
        explorer_url(hash, chain_id.unwrap_or(self.config.default_chain_id))
    }

    /// Explorer link for the current transaction on the active chain.
    pub fn transaction_url(&self) -> Option<String> {
        self.transactions.transaction_url()
    }

    /// Drop provider subscriptions. The client stays readable afterwards.
    pub fn close(&self) {
        info!(app = %self.config.app, "closing wallet client");
        self.connection.teardown();
    }
}
