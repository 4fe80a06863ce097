//! WASM module: wallet session in the browser
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          BeeConnect (JS API)            │
//! │  connect, disconnect, submit, reset     │
//! │  session, transaction, watch            │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │   WalletClient (session + transaction)  │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │   InjectedProvider (window.ethereum)    │
//! │  request, on, removeListener            │
//! └─────────────────────────────────────────┘
//! ```

mod client;
mod ethereum;

pub use client::BeeConnect;
pub use ethereum::InjectedProvider;

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;
