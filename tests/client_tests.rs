//! WalletClient end to end: startup restore, connect, submit, links, close

use beeconnect::{
    ClientConfig, EventKind, MemoryProvider, ProviderEvent, SessionStatus, TransactionRequest,
    TxPhase, WalletClient,
};
use std::rc::Rc;

const ALICE: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

#[tokio::test]
async fn start_restores_authorized_session() {
    let provider = MemoryProvider::new().with_accounts([ALICE]).authorized().with_chain(5);

    let client = WalletClient::start(Rc::new(provider.clone()), ClientConfig::new("shop")).await;

    let session = client.session();
    assert_eq!(session.status, SessionStatus::Connected);
    assert_eq!(session.status_message(), "Connected to 0x5290...9EE7");
    assert_eq!(session.network_message().as_deref(), Some("Network: Goerli Testnet"));
    assert_eq!(provider.calls().request_accounts, 0);
}

#[tokio::test]
async fn start_without_restore_waits_for_connect() {
    let provider = MemoryProvider::new().with_accounts([ALICE]).authorized();

    let client =
        WalletClient::start(Rc::new(provider.clone()), ClientConfig::new("shop").without_restore()).await;

    assert_eq!(client.session().status, SessionStatus::Disconnected);
    assert_eq!(provider.calls().authorized_accounts, 0);

    client.connect().await;
    assert_eq!(client.session().status, SessionStatus::Connected);
}

#[tokio::test]
async fn connect_then_pay() {
    let provider = MemoryProvider::new().with_accounts([ALICE]).with_chain(137);
    let client = WalletClient::start(Rc::new(provider.clone()), ClientConfig::default()).await;

    client.connect().await;
    let receipt = client
        .submit(TransactionRequest::transfer(ALICE, 1_000_000_000_000_000))
        .await
        .expect("confirmed");

    let snapshot = client.snapshot();
    assert_eq!(snapshot.session.account.as_deref(), Some(ALICE));
    assert_eq!(snapshot.transaction.phase, TxPhase::Confirmed);
    assert_eq!(
        client.transaction_url(),
        Some(format!("https://polygonscan.com/tx/{}", receipt.transaction_hash))
    );

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["session"]["status"], "connected");
    assert_eq!(json["transaction"]["phase"], "confirmed");
    assert_eq!(json["transaction"]["error"], serde_json::Value::Null);

    client.reset();
    assert_eq!(client.transaction().phase, TxPhase::Idle);
    assert_eq!(client.transaction_url(), None);
}

#[tokio::test]
async fn explorer_url_uses_given_chain_or_default() {
    let provider = MemoryProvider::absent();
    let client = WalletClient::start(
        Rc::new(provider),
        ClientConfig::new("shop").with_default_chain(11155111),
    )
    .await;

    assert_eq!(client.explorer_url("0xdeadbeef", Some(137)), "https://polygonscan.com/tx/0xdeadbeef");
    assert_eq!(client.explorer_url("0xdeadbeef", Some(999999)), "https://etherscan.io/tx/0xdeadbeef");
    assert_eq!(
        client.explorer_url("0xdeadbeef", None),
        "https://sepolia.etherscan.io/tx/0xdeadbeef"
    );
    assert_eq!(client.config().default_chain_id, 11155111);
    assert_eq!(client.config().app, "shop");
    assert!(!client.connection().provider_available());
    assert_eq!(client.session().status_message(), "provider not found");
}

#[tokio::test]
async fn close_stops_event_delivery() {
    let provider = MemoryProvider::new().with_accounts([ALICE]);
    let client = WalletClient::start(Rc::new(provider.clone()), ClientConfig::default()).await;
    client.connect().await;

    client.close();

    assert_eq!(provider.listener_count(EventKind::AccountsChanged), 0);
    assert_eq!(provider.listener_count(EventKind::ChainChanged), 0);
    provider.emit(ProviderEvent::ChainChanged("0x89".into()));
    assert_eq!(client.session().chain_id, Some(1));
}
