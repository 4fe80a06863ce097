//! Client configuration - passed from the embedding app

use crate::core::networks::DEFAULT_CHAIN_ID;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app: String,
    /// Adopt an already-authorized session at startup (no prompt).
    pub restore_session: bool,
    /// Chain used for explorer links before the wallet reports one.
    pub default_chain_id: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { app: "beeconnect".into(), restore_session: true, default_chain_id: DEFAULT_CHAIN_ID }
    }
}

impl ClientConfig {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into(), ..Default::default() }
    }
    pub fn without_restore(mut self) -> Self { self.restore_session = false; self }
    pub fn with_default_chain(mut self, chain_id: u64) -> Self { self.default_chain_id = chain_id; self }
}
