//! Beeconnect: browser wallet session and transaction lifecycle.
//!
//! # Architecture
//!
//! ```text
//! WalletClient (entry point)
//!   │
//!   ├── ConnectionManager ──── Session { status, account, network, error }
//!   │     └── accountsChanged / chainChanged listeners
//!   │
//!   ├── TransactionManager ─── TxState { hash, phase, error, busy }
//!   │     └── reads the session through SessionReader
//!   │
//!   └── Rc<dyn Provider>
//!         ├── MemoryProvider  (tests, CLI demo)
//!         └── InjectedProvider (window.ethereum, wasm only)
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Description |
//! |-----------|--------|-------------|
//! | connect | `client.connect()` | Prompt for account access |
//! | disconnect | `client.disconnect()` | Forget the session locally |
//! | restore | `ConnectionManager::init` | Silent reconnect if already authorized |
//! | submit | `client.submit(request)` | Send and wait for confirmation |
//! | reset | `client.reset()` | Clear transaction state |
//! | explorer | `explorer_url(hash, chain)` | Block explorer link |
//!
//! # Features
//!
//! - `native` - CLI, tokio runtime, tracing-subscriber
//! - `wasm` - Browser bindings over `window.ethereum`
//!
//! # Usage
//!
//! ```ignore
//! use beeconnect::{ClientConfig, MemoryProvider, TransactionRequest, WalletClient};
//! use std::rc::Rc;
//!
//! let provider = MemoryProvider::new().with_accounts(["0xabc..."]);
//! let client = WalletClient::start(Rc::new(provider), ClientConfig::new("shop")).await;
//! client.connect().await;
//!
//! if let Some(receipt) = client.submit(TransactionRequest::transfer("0xdef...", 1_000)).await {
//!     println!("{}", client.explorer_url(&receipt.transaction_hash, None));
//! }
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod client;
pub mod config;
pub mod core;
pub mod provider;
pub mod session;
pub mod transaction;

// =============================================================================
// Native-only modules
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports
// =============================================================================
pub use client::{ClientSnapshot, WalletClient};
pub use config::ClientConfig;
pub use core::networks::{explorer_url, network_label};
pub use provider::{
    CallCounts, EventKind, Listener, ListenerId, MemoryProvider, NetworkInfo, PendingTransaction,
    Provider, ProviderError, ProviderEvent, ProviderResult, Receipt, Release, Signer,
    TransactionRequest,
};
pub use session::{ConnectionManager, Session, SessionError, SessionReader, SessionStatus};
pub use transaction::{TransactionManager, TxError, TxPhase, TxState};

#[cfg(feature = "wasm")]
pub use wasm::{BeeConnect, InjectedProvider};
