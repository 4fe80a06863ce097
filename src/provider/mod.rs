//! Provider - the injected wallet collaborator
//!
//! The managers never touch a host global. They receive an `Rc<dyn Provider>`
//! and talk to it through this contract:
//!
//! | Call | Prompts | Description |
//! |------|---------|-------------|
//! | `is_available` | no | Synchronous capability probe |
//! | `request_accounts` | yes | Ask the user for account access |
//! | `authorized_accounts` | no | Accounts already granted to this origin |
//! | `network` | no | Current chain id |
//! | `signer` | no | Signing handle bound to an account |
//! | `on` / `remove_listener` | no | `accountsChanged` / `chainChanged` events |
//!
//! Everything is single-threaded (`?Send`): the browser runs one event loop
//! and the provider handle is shared read-only between both managers.

mod memory;

pub use memory::{CallCounts, MemoryProvider, Release};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// EIP-1193 / JSON-RPC error codes the managers distinguish.
pub mod codes {
    /// User rejected the request in the wallet UI.
    pub const USER_REJECTED: i64 = 4001;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i64 = -32603;
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Error surfaced by the provider. `code` is absent when the failure did not
/// carry one (transport errors, malformed responses).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code: Some(code), message: message.into() }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }

    pub fn user_rejected() -> Self {
        Self::new(codes::USER_REJECTED, "User rejected the request.")
    }

    pub fn internal() -> Self {
        Self::new(codes::INTERNAL_ERROR, "Internal JSON-RPC error.")
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(codes::USER_REJECTED)
    }

    pub fn is_internal(&self) -> bool {
        self.code == Some(codes::INTERNAL_ERROR)
    }
}

/// Provider-pushed event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AccountsChanged,
    ChainChanged,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::AccountsChanged, EventKind::ChainChanged];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AccountsChanged => "accountsChanged",
            EventKind::ChainChanged => "chainChanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// New account list; empty means access was revoked or the wallet locked.
    AccountsChanged(Vec<String>),
    /// Hex-encoded chain id, e.g. `"0x89"`.
    ChainChanged(String),
}

impl ProviderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProviderEvent::AccountsChanged(_) => EventKind::AccountsChanged,
            ProviderEvent::ChainChanged(_) => EventKind::ChainChanged,
        }
    }
}

pub type Listener = Rc<dyn Fn(&ProviderEvent)>;

/// Handle returned by `Provider::on`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub chain_id: u64,
}

/// Transaction fields as sent to `eth_sendTransaction` (hex quantities).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl TransactionRequest {
    pub fn transfer(to: impl Into<String>, value_wei: u128) -> Self {
        Self {
            to: Some(to.into()),
            value: Some(format!("0x{:x}", value_wei)),
            ..Default::default()
        }
    }

    /// Sending account; filled from the connected account when absent.
    pub fn with_from(mut self, from: impl Into<String>) -> Self { self.from = Some(from.into()); self }
}

/// Mined transaction outcome. `status` is 1 for success, 0 for revert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: String,
    pub status: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

impl Receipt {
    pub fn succeeded(&self) -> bool { self.status == 1 }
}

#[async_trait(?Send)]
pub trait Provider {
    fn is_available(&self) -> bool;
    async fn request_accounts(&self) -> ProviderResult<Vec<String>>;
    async fn authorized_accounts(&self) -> ProviderResult<Vec<String>>;
    async fn network(&self) -> ProviderResult<NetworkInfo>;
    fn signer(&self, account: &str) -> Box<dyn Signer>;
    fn on(&self, kind: EventKind, listener: Listener) -> ListenerId;
    fn remove_listener(&self, kind: EventKind, id: ListenerId);
}

/// Signing capability bound to one account.
#[async_trait(?Send)]
pub trait Signer {
    fn address(&self) -> &str;
    /// Resolves once the provider acknowledges the submission with a hash.
    async fn send_transaction(&self, request: TransactionRequest) -> ProviderResult<Box<dyn PendingTransaction>>;
}

/// A submitted transaction awaiting confirmation.
#[async_trait(?Send)]
pub trait PendingTransaction {
    fn hash(&self) -> &str;
    async fn wait(&self) -> ProviderResult<Receipt>;
}
