//! InjectedProvider - `window.ethereum` (EIP-1193) behind the `Provider` trait
//!
//! | Provider call | JSON-RPC |
//! |---------------|----------|
//! | `request_accounts` | `eth_requestAccounts` |
//! | `authorized_accounts` | `eth_accounts` |
//! | `network` | `eth_chainId` |
//! | `send_transaction` | `eth_sendTransaction` |
//! | `wait` | `eth_getTransactionReceipt` (polled, no timeout) |

use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::log;
use crate::core::networks::parse_chain_id;
use crate::provider::{
    EventKind, Listener, ListenerId, NetworkInfo, PendingTransaction, Provider, ProviderError,
    ProviderEvent, ProviderResult, Receipt, Signer, TransactionRequest,
};

const RECEIPT_POLL_MS: i32 = 4000;

struct Subscription {
    kind: EventKind,
    callback: Closure<dyn FnMut(JsValue)>,
}

#[derive(Clone)]
pub struct InjectedProvider {
    ethereum: Option<JsValue>,
    subscriptions: Rc<RefCell<HashMap<ListenerId, Subscription>>>,
    next_id: Rc<Cell<u64>>,
}

impl InjectedProvider {
    /// Look up `window.ethereum`. Absent when no extension injected one.
    pub fn detect() -> Self {
        let ethereum = web_sys::window()
            .and_then(|window| Reflect::get(&window, &JsValue::from_str("ethereum")).ok())
            .filter(|value| !value.is_undefined() && !value.is_null());
        Self::with_handle(ethereum)
    }

    /// Wrap a specific provider object (e.g. one announced via EIP-6963).
    pub fn from_value(ethereum: JsValue) -> Self {
        Self::with_handle(Some(ethereum).filter(|v| !v.is_undefined() && !v.is_null()))
    }

    fn with_handle(ethereum: Option<JsValue>) -> Self {
        Self {
            ethereum,
            subscriptions: Rc::new(RefCell::new(HashMap::new())),
            next_id: Rc::new(Cell::new(1)),
        }
    }

    fn handle(&self) -> ProviderResult<&JsValue> {
        self.ethereum
            .as_ref()
            .ok_or_else(|| ProviderError::other("provider not found"))
    }
}

#[async_trait(?Send)]
impl Provider for InjectedProvider {
    fn is_available(&self) -> bool {
        self.ethereum.is_some()
    }

    async fn request_accounts(&self) -> ProviderResult<Vec<String>> {
        let value = rpc(self.handle()?, "eth_requestAccounts", json!([])).await?;
        from_js(value)
    }

    async fn authorized_accounts(&self) -> ProviderResult<Vec<String>> {
        let value = rpc(self.handle()?, "eth_accounts", json!([])).await?;
        from_js(value)
    }

    async fn network(&self) -> ProviderResult<NetworkInfo> {
        let value = rpc(self.handle()?, "eth_chainId", json!([])).await?;
        let raw = value
            .as_string()
            .ok_or_else(|| ProviderError::other("eth_chainId: expected a string"))?;
        let chain_id = parse_chain_id(&raw)
            .ok_or_else(|| ProviderError::other(format!("eth_chainId: bad chain id {raw}")))?;
        Ok(NetworkInfo { chain_id })
    }

    fn signer(&self, account: &str) -> Box<dyn Signer> {
        Box::new(InjectedSigner { ethereum: self.ethereum.clone(), address: account.to_string() })
    }

    fn on(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let Some(ethereum) = &self.ethereum else {
            return id;
        };

        let callback = Closure::wrap(Box::new(move |payload: JsValue| {
            match event_from_js(kind, payload) {
                Some(event) => listener(&event),
                None => log!("[InjectedProvider] ignoring malformed {} payload", kind.as_str()),
            }
        }) as Box<dyn FnMut(JsValue)>);

        let name = JsValue::from_str(kind.as_str());
        if let Err(err) = call_method(ethereum, "on", &[&name, callback.as_ref()]) {
            log!("[InjectedProvider] on({}) failed: {}", kind.as_str(), err);
        }
        self.subscriptions.borrow_mut().insert(id, Subscription { kind, callback });
        id
    }

    fn remove_listener(&self, kind: EventKind, id: ListenerId) {
        let Some(subscription) = self.subscriptions.borrow_mut().remove(&id) else {
            return;
        };
        if subscription.kind != kind {
            self.subscriptions.borrow_mut().insert(id, subscription);
            return;
        }
        if let Some(ethereum) = &self.ethereum {
            let name = JsValue::from_str(kind.as_str());
            if let Err(err) = call_method(ethereum, "removeListener", &[&name, subscription.callback.as_ref()]) {
                log!("[InjectedProvider] removeListener({}) failed: {}", kind.as_str(), err);
            }
        }
    }
}

struct InjectedSigner {
    ethereum: Option<JsValue>,
    address: String,
}

#[async_trait(?Send)]
impl Signer for InjectedSigner {
    fn address(&self) -> &str { &self.address }

    async fn send_transaction(&self, request: TransactionRequest) -> ProviderResult<Box<dyn PendingTransaction>> {
        let ethereum = self
            .ethereum
            .clone()
            .ok_or_else(|| ProviderError::other("provider not found"))?;
        let request = if request.from.is_some() { request } else { request.with_from(self.address()) };
        let params = serde_json::to_value(&request).map_err(|e| ProviderError::other(e.to_string()))?;
        let hash = rpc(&ethereum, "eth_sendTransaction", json!([params]))
            .await?
            .as_string()
            .ok_or_else(|| ProviderError::other("eth_sendTransaction: expected a hash"))?;
        Ok(Box::new(InjectedPending { ethereum, hash }))
    }
}

struct InjectedPending {
    ethereum: JsValue,
    hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    status: Option<String>,
    block_number: Option<String>,
}

#[async_trait(?Send)]
impl PendingTransaction for InjectedPending {
    fn hash(&self) -> &str { &self.hash }

    async fn wait(&self) -> ProviderResult<Receipt> {
        loop {
            let value = rpc(&self.ethereum, "eth_getTransactionReceipt", json!([self.hash])).await?;
            if !value.is_null() && !value.is_undefined() {
                let raw: RpcReceipt = from_js(value)?;
                // Pre-Byzantium receipts carry no status; treat as success.
                let status = raw.status.as_deref().and_then(hex_quantity).unwrap_or(1);
                return Ok(Receipt {
                    transaction_hash: self.hash.clone(),
                    status: if status == 1 { 1 } else { 0 },
                    block_number: raw.block_number.as_deref().and_then(hex_quantity),
                });
            }
            sleep(RECEIPT_POLL_MS).await?;
        }
    }
}

/// `ethereum.request({method, params})`
async fn rpc(ethereum: &JsValue, method: &str, params: Value) -> ProviderResult<JsValue> {
    let args: JsValue = Object::new().into();
    let params = params
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ProviderError::other(e.to_string()))?;
    Reflect::set(&args, &JsValue::from_str("method"), &JsValue::from_str(method)).map_err(js_error)?;
    Reflect::set(&args, &JsValue::from_str("params"), &params).map_err(js_error)?;

    let promise: Promise = call_method(ethereum, "request", &[&args])?
        .dyn_into()
        .map_err(js_error)?;
    JsFuture::from(promise).await.map_err(js_error)
}

fn call_method(target: &JsValue, name: &str, args: &[&JsValue]) -> ProviderResult<JsValue> {
    let method: Function = Reflect::get(target, &JsValue::from_str(name))
        .map_err(js_error)?
        .dyn_into()
        .map_err(js_error)?;
    let result = match args {
        [] => method.call0(target),
        [a] => method.call1(target, a),
        [a, b] => method.call2(target, a, b),
        _ => return Err(ProviderError::other(format!("{name}: too many arguments"))),
    };
    result.map_err(js_error)
}

/// EIP-1193 errors are objects with `code` and `message`.
fn js_error(err: JsValue) -> ProviderError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64())
        .map(|c| c as i64);
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_default();
    ProviderError { code, message }
}

fn from_js<T: for<'de> Deserialize<'de>>(value: JsValue) -> ProviderResult<T> {
    serde_wasm_bindgen::from_value(value).map_err(|e| ProviderError::other(e.to_string()))
}

fn event_from_js(kind: EventKind, payload: JsValue) -> Option<ProviderEvent> {
    match kind {
        EventKind::AccountsChanged => serde_wasm_bindgen::from_value::<Vec<String>>(payload)
            .ok()
            .map(ProviderEvent::AccountsChanged),
        EventKind::ChainChanged => payload.as_string().map(ProviderEvent::ChainChanged),
    }
}

fn hex_quantity(value: &str) -> Option<u64> {
    u64::from_str_radix(value.trim_start_matches("0x"), 16).ok()
}

async fn sleep(ms: i32) -> ProviderResult<()> {
    let promise = Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        }
    });
    JsFuture::from(promise).await.map(|_| ()).map_err(js_error)
}
