//! Chain registry: numeric chain id → network label and block explorer.
//!
//! Static table. Unknown ids render as `Chain ID: <n>` and link to the
//! mainnet explorer.

/// Chain used when none is known (Ethereum mainnet).
pub const DEFAULT_CHAIN_ID: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain {
    pub id: u64,
    pub label: &'static str,
    pub explorer: &'static str,
}

pub const CHAINS: &[Chain] = &[
    Chain { id: 1, label: "Ethereum Mainnet", explorer: "https://etherscan.io" },
    Chain { id: 5, label: "Goerli Testnet", explorer: "https://goerli.etherscan.io" },
    Chain { id: 11155111, label: "Sepolia Testnet", explorer: "https://sepolia.etherscan.io" },
    Chain { id: 137, label: "Polygon Mainnet", explorer: "https://polygonscan.com" },
    Chain { id: 80001, label: "Mumbai Testnet", explorer: "https://mumbai.polygonscan.com" },
    Chain { id: 56, label: "BSC Mainnet", explorer: "https://bscscan.com" },
    Chain { id: 97, label: "BSC Testnet", explorer: "https://testnet.bscscan.com" },
];

pub fn lookup(chain_id: u64) -> Option<&'static Chain> {
    CHAINS.iter().find(|c| c.id == chain_id)
}

/// Human-readable network label for a chain id.
pub fn network_label(chain_id: u64) -> String {
    match lookup(chain_id) {
        Some(chain) => chain.label.to_string(),
        None => format!("Chain ID: {}", chain_id),
    }
}

/// Explorer base URL, falling back to the mainnet explorer.
pub fn explorer_base(chain_id: u64) -> &'static str {
    lookup(chain_id)
        .or_else(|| lookup(DEFAULT_CHAIN_ID))
        .map(|c| c.explorer)
        .unwrap_or("https://etherscan.io")
}

/// Explorer link for a transaction hash.
pub fn explorer_url(hash: &str, chain_id: u64) -> String {
    format!("{}/tx/{}", explorer_base(chain_id), hash)
}

/// Parse the hex chain id carried by `chainChanged` (`"0x89"` → 137).
pub fn parse_chain_id(value: &str) -> Option<u64> {
    let value = value.trim();
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Chain id from a JS number. `None` unless it is a non-negative integer that fits.
pub fn chain_id_from_number(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_chains_have_labels() {
        assert_eq!(network_label(1), "Ethereum Mainnet");
        assert_eq!(network_label(11155111), "Sepolia Testnet");
        assert_eq!(network_label(97), "BSC Testnet");
    }

    #[test]
    fn unknown_chain_label_shows_id() {
        assert_eq!(network_label(42161), "Chain ID: 42161");
    }

    #[test]
    fn explorer_url_uses_table_then_mainnet() {
        assert_eq!(explorer_url("0xdeadbeef", 137), "https://polygonscan.com/tx/0xdeadbeef");
        assert_eq!(explorer_url("0xdeadbeef", 80001), "https://mumbai.polygonscan.com/tx/0xdeadbeef");
        assert_eq!(explorer_url("0xdeadbeef", 999999), "https://etherscan.io/tx/0xdeadbeef");
    }

    #[test]
    fn chain_id_hex_parsing() {
        assert_eq!(parse_chain_id("0x1"), Some(1));
        assert_eq!(parse_chain_id("0x89"), Some(137));
        assert_eq!(parse_chain_id("0XAA36A7"), Some(11155111));
        assert_eq!(parse_chain_id("38"), Some(56));
        assert_eq!(parse_chain_id("0x"), None);
        assert_eq!(parse_chain_id(""), None);
        assert_eq!(parse_chain_id("0xzz"), None);
    }

    #[test]
    fn chain_id_from_js_number() {
        assert_eq!(chain_id_from_number(137.0), Some(137));
        assert_eq!(chain_id_from_number(0.0), Some(0));
        assert_eq!(chain_id_from_number(-1.0), None);
        assert_eq!(chain_id_from_number(1.5), None);
        assert_eq!(chain_id_from_number(f64::NAN), None);
        assert_eq!(chain_id_from_number(f64::INFINITY), None);
        assert_eq!(chain_id_from_number(1e20), None);
    }
}
