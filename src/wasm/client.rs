//! BeeConnect: JS-facing wallet session
//!
//! Snapshots cross the boundary as plain objects (`null` for empty fields).

use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use super::ethereum::InjectedProvider;
use super::log;
use crate::client::WalletClient;
use crate::config::ClientConfig;
use crate::core::networks::chain_id_from_number;
use crate::provider::TransactionRequest;

fn to_js<T: Serialize>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

#[wasm_bindgen]
pub struct BeeConnect {
    client: Rc<WalletClient>,
}

#[wasm_bindgen]
impl BeeConnect {
    /// Detect `window.ethereum` and restore an authorized session if any.
    #[wasm_bindgen(js_name = "create")]
    pub async fn create(app: Option<String>, restore: Option<bool>) -> Result<BeeConnect, JsValue> {
        let mut config = ClientConfig::new(app.unwrap_or_else(|| "beeconnect".into()));
        if restore == Some(false) {
            config = config.without_restore();
        }
        let provider = InjectedProvider::detect();
        let label = provider_label(&provider);
        let client = WalletClient::start(Rc::new(provider), config).await;
        log!("[BeeConnect] started {} (provider: {})", client.config().app, label);
        Ok(Self { client: Rc::new(client) })
    }

    #[wasm_bindgen(getter, js_name = "providerAvailable")]
    pub fn provider_available(&self) -> bool {
        self.client.connection().provider_available()
    }

    /// Current session snapshot
    #[wasm_bindgen]
    pub fn session(&self) -> JsValue {
        to_js(&self.client.session())
    }

    /// Current transaction snapshot
    #[wasm_bindgen]
    pub fn transaction(&self) -> JsValue {
        to_js(&self.client.transaction())
    }

    /// Connect; resolves to the resulting session snapshot.
    #[wasm_bindgen]
    pub async fn connect(&self) -> JsValue {
        let client = self.client.clone();
        client.connect().await;
        to_js(&client.session())
    }

    #[wasm_bindgen]
    pub fn disconnect(&self) -> JsValue {
        self.client.disconnect();
        to_js(&self.client.session())
    }

    /// Submit a transaction; resolves to the receipt, or `null` on failure.
    #[wasm_bindgen]
    pub async fn submit(&self, request: JsValue) -> Result<JsValue, JsValue> {
        let request: TransactionRequest = serde_wasm_bindgen::from_value(request)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let client = self.client.clone();
        Ok(match client.submit(request).await {
            Some(receipt) => to_js(&receipt),
            None => JsValue::NULL,
        })
    }

    #[wasm_bindgen]
    pub fn reset(&self) {
        self.client.reset();
    }

    /// Negative or fractional chain ids count as unknown (default chain).
    #[wasm_bindgen(js_name = "explorerUrl")]
    pub fn explorer_url(&self, hash: &str, chain_id: Option<f64>) -> String {
        self.client.explorer_url(hash, chain_id.and_then(chain_id_from_number))
    }

    #[wasm_bindgen(js_name = "transactionUrl")]
    pub fn transaction_url(&self) -> Option<String> {
        self.client.transaction_url()
    }

    /// Call `callback(kind, snapshot)` on every change; kind is "session" or "transaction".
    #[wasm_bindgen]
    pub fn watch(&self, callback: js_sys::Function) {
        use futures::StreamExt;

        let mut sessions = self.client.connection().watch();
        let session_cb = callback.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let kind = JsValue::from_str("session");
            while let Some(session) = sessions.next().await {
                let _ = session_cb.call2(&JsValue::NULL, &kind, &to_js(&session));
            }
        });

        let mut transactions = self.client.transactions().watch();
        wasm_bindgen_futures::spawn_local(async move {
            let kind = JsValue::from_str("transaction");
            while let Some(tx) = transactions.next().await {
                let _ = callback.call2(&JsValue::NULL, &kind, &to_js(&tx));
            }
        });
    }

    /// Unregister wallet event listeners.
    #[wasm_bindgen]
    pub fn close(&self) {
        self.client.close();
    }
}

fn provider_label(provider: &InjectedProvider) -> &'static str {
    use crate::provider::Provider;
    if provider.is_available() { "window.ethereum" } else { "none" }
}
