//! Session - wallet connection state machine
//!
//! ```text
//!                 connect()                  accounts + chain
//!  Disconnected ─────────────▶ Connecting ─────────────────────▶ Connected
//!       ▲                          │                                 │
//!       │      rejected / failed   │                                 │
//!       ├──────────────────────────┘                                 │
//!       │       disconnect() / accountsChanged([])                   │
//!       └────────────────────────────────────────────────────────────┘
//! ```
//!
//! `account` is set exactly when the status is `Connected`. Disconnecting is
//! local only: the provider has no revoke primitive, so a later `connect()`
//! usually succeeds without a prompt.

use serde::{Serialize, Serializer};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::core::format::short_address;
use crate::core::networks::{network_label, parse_chain_id};
use crate::core::observed::Observed;
use crate::provider::{EventKind, ListenerId, Provider, ProviderEvent, ProviderResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Connected => "connected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("provider not found")]
    ProviderNotFound,
    #[error("connection failed")]
    ConnectionFailed,
}

impl Serialize for SessionError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Snapshot of the wallet session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub account: Option<String>,
    pub network: Option<String>,
    pub chain_id: Option<u64>,
    pub status: SessionStatus,
    pub error: Option<SessionError>,
    pub provider_available: bool,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.status == SessionStatus::Connecting
    }

    /// One-line status for the connect button area.
    pub fn status_message(&self) -> String {
        if !self.provider_available {
            return SessionError::ProviderNotFound.to_string();
        }
        if let Some(err) = &self.error {
            return err.to_string();
        }
        match (&self.account, self.is_connected()) {
            (Some(account), true) => format!("Connected to {}", short_address(account)),
            _ => "Disconnected".to_string(),
        }
    }

    pub fn network_message(&self) -> Option<String> {
        match (&self.network, self.is_connected()) {
            (Some(network), true) => Some(format!("Network: {}", network)),
            _ => None,
        }
    }

    fn set_connected(&mut self, account: String, chain_id: u64) {
        self.account = Some(account);
        self.network = Some(network_label(chain_id));
        self.chain_id = Some(chain_id);
        self.status = SessionStatus::Connected;
        self.error = None;
    }

    fn clear(&mut self) {
        self.account = None;
        self.network = None;
        self.chain_id = None;
        self.status = SessionStatus::Disconnected;
        self.error = None;
    }

    fn apply_event(&mut self, event: &ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    info!("accountsChanged: no accounts, disconnecting");
                    self.clear();
                }
                Some(account) if self.is_connected() => {
                    // Network is left as last observed until chainChanged arrives.
                    debug!(account = %account, "accountsChanged: switching account");
                    self.account = Some(account.clone());
                }
                Some(account) => {
                    debug!(account = %account, status = self.status.as_str(), "accountsChanged ignored while not connected");
                }
            },
            ProviderEvent::ChainChanged(raw) => match parse_chain_id(raw) {
                Some(chain_id) => {
                    debug!(chain_id, "chainChanged");
                    self.network = Some(network_label(chain_id));
                    self.chain_id = Some(chain_id);
                }
                None => warn!(payload = %raw, "chainChanged with unparseable chain id"),
            },
        }
    }
}

/// Read-only view of the session, handed to the transaction manager.
#[derive(Clone)]
pub struct SessionReader {
    state: Observed<Session>,
}

impl SessionReader {
    pub fn snapshot(&self) -> Session { self.state.get() }
    pub fn is_connected(&self) -> bool { self.state.read(Session::is_connected) }
    pub fn chain_id(&self) -> Option<u64> { self.state.read(|s| s.chain_id) }

    /// Active account, only while connected.
    pub fn account(&self) -> Option<String> {
        self.state.read(|s| if s.is_connected() { s.account.clone() } else { None })
    }
}

pub struct ConnectionManager {
    provider: Rc<dyn Provider>,
    state: Observed<Session>,
    subscriptions: RefCell<Vec<(EventKind, ListenerId)>>,
}

impl ConnectionManager {
    /// Probe the provider and subscribe to its account/chain events.
    pub fn new(provider: Rc<dyn Provider>) -> Self {
        let available = provider.is_available();
        let state = Observed::new(Session { provider_available: available, ..Default::default() });

        let mut subscriptions = Vec::new();
        if available {
            for kind in EventKind::ALL {
                let target = state.clone();
                let id = provider.on(kind, Rc::new(move |event: &ProviderEvent| {
                    target.update(|s| s.apply_event(event));
                }));
                subscriptions.push((kind, id));
            }
        } else {
            debug!("no wallet provider in host environment");
        }

        Self { provider, state, subscriptions: RefCell::new(subscriptions) }
    }

    /// `new` followed by a silent restore of an already-authorized session.
    pub async fn init(provider: Rc<dyn Provider>) -> Self {
        let manager = Self::new(provider);
        manager.restore_if_authorized().await;
        manager
    }

    pub fn snapshot(&self) -> Session { self.state.get() }

    pub fn reader(&self) -> SessionReader {
        SessionReader { state: self.state.clone() }
    }

    pub fn watch(&self) -> futures::channel::mpsc::UnboundedReceiver<Session> {
        self.state.watch()
    }

    pub fn provider_available(&self) -> bool {
        self.state.read(|s| s.provider_available)
    }

    /// Ask the wallet for account access. Failures land in `Session::error`.
    pub async fn connect(&self) {
        if !self.provider_available() {
            warn!("connect: provider not found");
            self.state.update(|s| s.error = Some(SessionError::ProviderNotFound));
            return;
        }
        match self.state.read(|s| s.status) {
            SessionStatus::Connecting => {
                debug!("connect: request already in flight");
                return;
            }
            SessionStatus::Connected => {
                debug!("connect: already connected");
                return;
            }
            SessionStatus::Disconnected => {}
        }

        self.state.update(|s| {
            s.status = SessionStatus::Connecting;
            s.error = None;
        });
        info!("connect: requesting account access");

        let outcome = match self.provider.request_accounts().await {
            Ok(accounts) => self.resolve(accounts).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(Some((account, chain_id))) => {
                info!(account = %account, chain_id, "connected");
                self.state.update(|s| s.set_connected(account, chain_id));
            }
            Ok(None) => {
                info!("connect: wallet returned no accounts");
                self.state.update(|s| {
                    s.account = None;
                    s.status = SessionStatus::Disconnected;
                });
            }
            Err(err) => {
                warn!(code = ?err.code, error = %err, "connect failed");
                self.state.update(|s| {
                    s.account = None;
                    s.status = SessionStatus::Disconnected;
                    s.error = Some(SessionError::ConnectionFailed);
                });
            }
        }
    }

    /// Forget the session locally. Provider-side permission is untouched.
    pub fn disconnect(&self) {
        info!("disconnect");
        self.state.update(Session::clear);
    }

    /// Adopt accounts the user already granted, without prompting.
    /// Errors are logged and otherwise ignored.
    pub async fn restore_if_authorized(&self) {
        if !self.provider_available() {
            return;
        }
        let outcome = match self.provider.authorized_accounts().await {
            Ok(accounts) => self.resolve(accounts).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(Some((account, chain_id))) => {
                info!(account = %account, chain_id, "restored authorized session");
                self.state.update(|s| s.set_connected(account, chain_id));
            }
            Ok(None) => debug!("restore: no authorized accounts"),
            Err(err) => debug!(code = ?err.code, error = %err, "restore: query failed"),
        }
    }

    /// Unregister provider listeners. Safe to call more than once.
    pub fn teardown(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        for (kind, id) in subscriptions {
            self.provider.remove_listener(kind, id);
        }
    }

    /// First account plus the current chain, or `None` when the list is empty.
    async fn resolve(&self, accounts: Vec<String>) -> ProviderResult<Option<(String, u64)>> {
        let Some(account) = accounts.into_iter().next() else {
            return Ok(None);
        };
        let network = self.provider.network().await?;
        Ok(Some((account, network.chain_id)))
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}
