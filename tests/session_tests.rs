//! Connection manager against the in-memory provider
//!
//! Covers: provider absent, connect happy path, rejection, duplicate connect
//! while Connecting, disconnect, silent restore, provider events, teardown.

use beeconnect::{
    ConnectionManager, EventKind, MemoryProvider, ProviderError, ProviderEvent, Session,
    SessionError, SessionStatus,
};
use futures::poll;
use std::rc::Rc;
use std::task::Poll;

const ALICE: &str = "0xABC0000000000000000000000000000000000123";
const BOB: &str = "0xB0B0000000000000000000000000000000000456";

fn manager(provider: &MemoryProvider) -> ConnectionManager {
    ConnectionManager::new(Rc::new(provider.clone()))
}

fn assert_invariant(session: &Session) {
    assert_eq!(
        session.account.is_some(),
        session.status == SessionStatus::Connected,
        "account must be set exactly when connected: {:?}",
        session
    );
}

fn cleared(provider_available: bool) -> Session {
    Session { provider_available, ..Default::default() }
}

#[tokio::test]
async fn connect_without_provider_sets_error_and_makes_no_calls() {
    let provider = MemoryProvider::absent();
    let manager = manager(&provider);

    manager.connect().await;

    let session = manager.snapshot();
    assert_eq!(session.status, SessionStatus::Disconnected);
    assert_eq!(session.error, Some(SessionError::ProviderNotFound));
    assert!(!session.provider_available);
    assert_eq!(provider.calls().request_accounts, 0);
    assert_eq!(provider.calls().network, 0);
    assert_eq!(provider.listener_count(EventKind::AccountsChanged), 0);
    assert_invariant(&session);
}

#[tokio::test]
async fn connect_adopts_first_account_and_network() {
    let provider = MemoryProvider::new().with_accounts([ALICE, BOB]).with_chain(1);
    let manager = manager(&provider);

    manager.connect().await;

    let session = manager.snapshot();
    assert_eq!(session.status, SessionStatus::Connected);
    assert_eq!(session.account.as_deref(), Some(ALICE));
    assert_eq!(session.network.as_deref(), Some("Ethereum Mainnet"));
    assert_eq!(session.chain_id, Some(1));
    assert_eq!(session.error, None);
    assert_invariant(&session);
}

#[tokio::test]
async fn connect_reports_unknown_chain_by_id() {
    let provider = MemoryProvider::new().with_accounts([ALICE]).with_chain(42161);
    let manager = manager(&provider);

    manager.connect().await;

    assert_eq!(manager.snapshot().network.as_deref(), Some("Chain ID: 42161"));
}

#[tokio::test]
async fn rejected_connect_returns_to_disconnected() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);
    provider.fail_next_request_accounts(ProviderError::user_rejected());
    let manager = manager(&provider);

    manager.connect().await;

    let session = manager.snapshot();
    assert_eq!(session.status, SessionStatus::Disconnected);
    assert_eq!(session.error, Some(SessionError::ConnectionFailed));
    assert_eq!(session.account, None);
    assert_invariant(&session);

    // The user retries and approves; the error clears.
    manager.connect().await;
    let session = manager.snapshot();
    assert_eq!(session.status, SessionStatus::Connected);
    assert_eq!(session.error, None);
}

#[tokio::test]
async fn network_failure_during_connect_is_a_connection_failure() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);
    provider.fail_next_network(ProviderError::other("network unreachable"));
    let manager = manager(&provider);

    manager.connect().await;

    let session = manager.snapshot();
    assert_eq!(session.status, SessionStatus::Disconnected);
    assert_eq!(session.error, Some(SessionError::ConnectionFailed));
    assert_invariant(&session);
}

#[tokio::test]
async fn empty_account_list_leaves_session_disconnected() {
    let provider = MemoryProvider::new();
    let manager = manager(&provider);

    manager.connect().await;

    let session = manager.snapshot();
    assert_eq!(session.status, SessionStatus::Disconnected);
    assert_eq!(session.error, None);
    assert_eq!(provider.calls().network, 0);
}

#[tokio::test]
async fn second_connect_while_connecting_makes_one_request() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);
    let manager = manager(&provider);
    let release = provider.hold_request_accounts();

    let mut first = Box::pin(manager.connect());
    assert_eq!(poll!(first.as_mut()), Poll::Pending);
    assert!(manager.snapshot().is_connecting());
    assert_invariant(&manager.snapshot());

    manager.connect().await;
    assert_eq!(manager.snapshot().status, SessionStatus::Connecting);

    release.release();
    first.await;

    assert_eq!(provider.calls().request_accounts, 1);
    assert_eq!(manager.snapshot().status, SessionStatus::Connected);
}

#[tokio::test]
async fn connect_when_connected_is_noop() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);
    let manager = manager(&provider);

    manager.connect().await;
    manager.connect().await;

    assert_eq!(provider.calls().request_accounts, 1);
    assert_eq!(manager.snapshot().status, SessionStatus::Connected);
}

#[tokio::test]
async fn disconnect_clears_everything_from_any_state() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);
    let manager = manager(&provider);

    // From Disconnected with an error
    provider.fail_next_request_accounts(ProviderError::user_rejected());
    manager.connect().await;
    manager.disconnect();
    assert_eq!(manager.snapshot(), cleared(true));

    // From Connected
    manager.connect().await;
    manager.disconnect();
    assert_eq!(manager.snapshot(), cleared(true));

    // From Connecting: the late completion still lands (last write wins)
    let release = provider.hold_request_accounts();
    let mut pending = Box::pin(manager.connect());
    assert_eq!(poll!(pending.as_mut()), Poll::Pending);
    manager.disconnect();
    assert_eq!(manager.snapshot(), cleared(true));
    release.release();
    pending.await;
    assert_eq!(manager.snapshot().status, SessionStatus::Connected);
    assert_invariant(&manager.snapshot());
}

#[tokio::test]
async fn restore_adopts_authorized_session_without_prompt() {
    let provider = MemoryProvider::new().with_accounts([ALICE]).authorized().with_chain(137);

    let manager = ConnectionManager::init(Rc::new(provider.clone())).await;

    let session = manager.snapshot();
    assert_eq!(session.status, SessionStatus::Connected);
    assert_eq!(session.account.as_deref(), Some(ALICE));
    assert_eq!(session.network.as_deref(), Some("Polygon Mainnet"));
    assert_eq!(provider.calls().request_accounts, 0);
    assert_eq!(provider.calls().authorized_accounts, 1);
}

#[tokio::test]
async fn restore_without_authorization_stays_disconnected() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);

    let manager = ConnectionManager::init(Rc::new(provider.clone())).await;

    assert_eq!(manager.snapshot(), cleared(true));
    assert_eq!(provider.calls().network, 0);
}

#[tokio::test]
async fn restore_failure_is_silent() {
    let provider = MemoryProvider::new().with_accounts([ALICE]).authorized();
    provider.fail_next_authorized_accounts(ProviderError::internal());

    let manager = ConnectionManager::init(Rc::new(provider.clone())).await;

    assert_eq!(manager.snapshot(), cleared(true));
}

#[tokio::test]
async fn restore_skipped_when_provider_absent() {
    let provider = MemoryProvider::absent();

    let manager = ConnectionManager::init(Rc::new(provider.clone())).await;

    assert_eq!(manager.snapshot(), cleared(false));
    assert_eq!(provider.calls().authorized_accounts, 0);
}

#[tokio::test]
async fn empty_accounts_changed_disconnects() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);
    let manager = manager(&provider);
    manager.connect().await;

    provider.emit(ProviderEvent::AccountsChanged(vec![]));

    assert_eq!(manager.snapshot(), cleared(true));
}

#[tokio::test]
async fn accounts_changed_switches_account_but_keeps_network() {
    let provider = MemoryProvider::new().with_accounts([ALICE]).with_chain(1);
    let manager = manager(&provider);
    manager.connect().await;

    // The new account may live on another chain; network stays as last observed.
    provider.set_chain(137);
    provider.emit(ProviderEvent::AccountsChanged(vec![BOB.into()]));

    let session = manager.snapshot();
    assert_eq!(session.account.as_deref(), Some(BOB));
    assert_eq!(session.status, SessionStatus::Connected);
    assert_eq!(session.network.as_deref(), Some("Ethereum Mainnet"));

    provider.emit(ProviderEvent::ChainChanged("0x89".into()));
    assert_eq!(manager.snapshot().network.as_deref(), Some("Polygon Mainnet"));
}

#[tokio::test]
async fn chain_changed_updates_network_only() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);
    let manager = manager(&provider);
    manager.connect().await;

    provider.emit(ProviderEvent::ChainChanged("0xaa36a7".into()));

    let session = manager.snapshot();
    assert_eq!(session.network.as_deref(), Some("Sepolia Testnet"));
    assert_eq!(session.chain_id, Some(11155111));
    assert_eq!(session.account.as_deref(), Some(ALICE));
    assert_eq!(session.status, SessionStatus::Connected);
}

#[tokio::test]
async fn watchers_see_each_transition() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);
    let manager = manager(&provider);
    let mut rx = manager.watch();

    manager.connect().await;
    manager.disconnect();

    let mut statuses = Vec::new();
    while let Ok(Some(session)) = rx.try_next() {
        assert_invariant(&session);
        statuses.push(session.status);
    }
    assert_eq!(
        statuses,
        vec![SessionStatus::Connecting, SessionStatus::Connected, SessionStatus::Disconnected]
    );
}

#[tokio::test]
async fn teardown_unregisters_listeners_once() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);
    let manager = manager(&provider);
    assert_eq!(provider.listener_count(EventKind::AccountsChanged), 1);
    assert_eq!(provider.listener_count(EventKind::ChainChanged), 1);

    manager.teardown();
    manager.teardown();
    assert_eq!(provider.listener_count(EventKind::AccountsChanged), 0);
    assert_eq!(provider.listener_count(EventKind::ChainChanged), 0);

    // Events after teardown no longer reach the session.
    manager.connect().await;
    provider.emit(ProviderEvent::AccountsChanged(vec![]));
    assert_eq!(manager.snapshot().status, SessionStatus::Connected);
}

#[tokio::test]
async fn dropping_manager_unregisters_listeners() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);
    {
        let _manager = manager(&provider);
        assert_eq!(provider.listener_count(EventKind::AccountsChanged), 1);
    }
    assert_eq!(provider.listener_count(EventKind::AccountsChanged), 0);
    assert_eq!(provider.listener_count(EventKind::ChainChanged), 0);
}
