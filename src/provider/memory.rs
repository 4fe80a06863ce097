//! MemoryProvider - scriptable in-process wallet for tests and the CLI demo
//!
//! Behaves like an injected extension that answers immediately. Failures are
//! armed for the next call only. Holds suspend a call until the returned
//! `Release` fires (or is dropped), which is how tests observe the transient
//! Connecting / Submitting / Pending states.

use async_trait::async_trait;
use futures::channel::oneshot;
use std::cell::RefCell;
use std::rc::Rc;

use super::{
    EventKind, Listener, ListenerId, NetworkInfo, PendingTransaction, Provider, ProviderError,
    ProviderEvent, ProviderResult, Receipt, Signer, TransactionRequest,
};
use crate::core::networks::DEFAULT_CHAIN_ID;

/// Number of calls made against each provider entry point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub request_accounts: usize,
    pub authorized_accounts: usize,
    pub network: usize,
    pub send_transaction: usize,
    pub wait: usize,
}

/// Releases a held call. Dropping it releases too.
pub struct Release(oneshot::Sender<()>);

impl Release {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

struct MemoryState {
    available: bool,
    accounts: Vec<String>,
    authorized: bool,
    chain_id: u64,
    receipt_status: u8,
    request_error: Option<ProviderError>,
    authorized_error: Option<ProviderError>,
    network_error: Option<ProviderError>,
    send_error: Option<ProviderError>,
    wait_error: Option<ProviderError>,
    request_hold: Option<oneshot::Receiver<()>>,
    send_hold: Option<oneshot::Receiver<()>>,
    wait_hold: Option<oneshot::Receiver<()>>,
    listeners: Vec<(EventKind, ListenerId, Listener)>,
    next_listener: u64,
    nonce: u64,
    block: u64,
    calls: CallCounts,
    sent: Vec<TransactionRequest>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            available: true,
            accounts: Vec::new(),
            authorized: false,
            chain_id: DEFAULT_CHAIN_ID,
            receipt_status: 1,
            request_error: None,
            authorized_error: None,
            network_error: None,
            send_error: None,
            wait_error: None,
            request_hold: None,
            send_hold: None,
            wait_hold: None,
            listeners: Vec::new(),
            next_listener: 1,
            nonce: 0,
            block: 19_000_000,
            calls: CallCounts::default(),
            sent: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryProvider {
    inner: Rc<RefCell<MemoryState>>,
}

impl MemoryProvider {
    /// Installed wallet, no accounts, mainnet.
    pub fn new() -> Self { Self::default() }

    /// No wallet extension in the host environment.
    pub fn absent() -> Self {
        let provider = Self::new();
        provider.inner.borrow_mut().available = false;
        provider
    }

    pub fn with_accounts<S: Into<String>>(self, accounts: impl IntoIterator<Item = S>) -> Self {
        self.inner.borrow_mut().accounts = accounts.into_iter().map(Into::into).collect();
        self
    }

    /// Accounts are already granted to this origin (restorable without a prompt).
    pub fn authorized(self) -> Self {
        self.inner.borrow_mut().authorized = true;
        self
    }

    pub fn with_chain(self, chain_id: u64) -> Self {
        self.inner.borrow_mut().chain_id = chain_id;
        self
    }

    pub fn set_chain(&self, chain_id: u64) { self.inner.borrow_mut().chain_id = chain_id; }
    pub fn set_receipt_status(&self, status: u8) { self.inner.borrow_mut().receipt_status = status; }

    pub fn fail_next_request_accounts(&self, err: ProviderError) { self.inner.borrow_mut().request_error = Some(err); }
    pub fn fail_next_authorized_accounts(&self, err: ProviderError) { self.inner.borrow_mut().authorized_error = Some(err); }
    pub fn fail_next_network(&self, err: ProviderError) { self.inner.borrow_mut().network_error = Some(err); }
    pub fn fail_next_send(&self, err: ProviderError) { self.inner.borrow_mut().send_error = Some(err); }
    pub fn fail_next_wait(&self, err: ProviderError) { self.inner.borrow_mut().wait_error = Some(err); }

    /// Suspend the next `request_accounts` (user staring at the approval popup).
    pub fn hold_request_accounts(&self) -> Release {
        let (tx, rx) = oneshot::channel();
        self.inner.borrow_mut().request_hold = Some(rx);
        Release(tx)
    }

    /// Suspend the next `send_transaction` until released.
    pub fn hold_send(&self) -> Release {
        let (tx, rx) = oneshot::channel();
        self.inner.borrow_mut().send_hold = Some(rx);
        Release(tx)
    }

    /// Suspend the next confirmation wait until released.
    pub fn hold_wait(&self) -> Release {
        let (tx, rx) = oneshot::channel();
        self.inner.borrow_mut().wait_hold = Some(rx);
        Release(tx)
    }

    /// Dispatch an event to every listener registered for its kind.
    pub fn emit(&self, event: ProviderEvent) {
        let kind = event.kind();
        let listeners: Vec<Listener> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, _, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.borrow().listeners.iter().filter(|(k, _, _)| *k == kind).count()
    }

    pub fn calls(&self) -> CallCounts { self.inner.borrow().calls }

    /// Requests accepted by `send_transaction`, in order.
    pub fn sent(&self) -> Vec<TransactionRequest> { self.inner.borrow().sent.clone() }
}

#[async_trait(?Send)]
impl Provider for MemoryProvider {
    fn is_available(&self) -> bool {
        self.inner.borrow().available
    }

    async fn request_accounts(&self) -> ProviderResult<Vec<String>> {
        let hold = {
            let mut state = self.inner.borrow_mut();
            state.calls.request_accounts += 1;
            state.request_hold.take()
        };
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        let mut state = self.inner.borrow_mut();
        if let Some(err) = state.request_error.take() {
            return Err(err);
        }
        state.authorized = true;
        Ok(state.accounts.clone())
    }

    async fn authorized_accounts(&self) -> ProviderResult<Vec<String>> {
        let mut state = self.inner.borrow_mut();
        state.calls.authorized_accounts += 1;
        if let Some(err) = state.authorized_error.take() {
            return Err(err);
        }
        Ok(if state.authorized { state.accounts.clone() } else { Vec::new() })
    }

    async fn network(&self) -> ProviderResult<NetworkInfo> {
        let mut state = self.inner.borrow_mut();
        state.calls.network += 1;
        if let Some(err) = state.network_error.take() {
            return Err(err);
        }
        Ok(NetworkInfo { chain_id: state.chain_id })
    }

    fn signer(&self, account: &str) -> Box<dyn Signer> {
        Box::new(MemorySigner { provider: self.clone(), address: account.to_string() })
    }

    fn on(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let mut state = self.inner.borrow_mut();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push((kind, id, listener));
        id
    }

    fn remove_listener(&self, kind: EventKind, id: ListenerId) {
        self.inner
            .borrow_mut()
            .listeners
            .retain(|(k, i, _)| !(*k == kind && *i == id));
    }
}

struct MemorySigner {
    provider: MemoryProvider,
    address: String,
}

#[async_trait(?Send)]
impl Signer for MemorySigner {
    fn address(&self) -> &str { &self.address }

    async fn send_transaction(&self, request: TransactionRequest) -> ProviderResult<Box<dyn PendingTransaction>> {
        let hold = {
            let mut state = self.provider.inner.borrow_mut();
            state.calls.send_transaction += 1;
            state.send_hold.take()
        };
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        let mut state = self.provider.inner.borrow_mut();
        if let Some(err) = state.send_error.take() {
            return Err(err);
        }
        state.nonce += 1;
        let hash = transaction_hash(&self.address, state.nonce, &request);
        state.sent.push(request);
        Ok(Box::new(MemoryPending { provider: self.provider.clone(), hash }))
    }
}

struct MemoryPending {
    provider: MemoryProvider,
    hash: String,
}

#[async_trait(?Send)]
impl PendingTransaction for MemoryPending {
    fn hash(&self) -> &str { &self.hash }

    async fn wait(&self) -> ProviderResult<Receipt> {
        let hold = {
            let mut state = self.provider.inner.borrow_mut();
            state.calls.wait += 1;
            state.wait_hold.take()
        };
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        let mut state = self.provider.inner.borrow_mut();
        if let Some(err) = state.wait_error.take() {
            return Err(err);
        }
        state.block += 1;
        Ok(Receipt {
            transaction_hash: self.hash.clone(),
            status: state.receipt_status,
            block_number: Some(state.block),
        })
    }
}

fn transaction_hash(from: &str, nonce: u64, request: &TransactionRequest) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(from.as_bytes());
    hasher.update(&nonce.to_be_bytes());
    hasher.update(&serde_json::to_vec(request).unwrap_or_default());
    format!("0x{}", hex::encode(hasher.finalize().as_bytes()))
}
