//! Abbreviations used in status lines.

fn abbreviate(value: &str, head: usize, tail: usize) -> String {
    if !value.is_ascii() || value.len() <= head + tail + 3 {
        return value.to_string();
    }
    format!("{}...{}", &value[..head], &value[value.len() - tail..])
}

/// `0x1234...abcd`
pub fn short_address(address: &str) -> String {
    abbreviate(address, 6, 4)
}

/// `0x12345678...9abcdef0`
pub fn short_hash(hash: &str) -> String {
    abbreviate(hash, 10, 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviates_long_values() {
        assert_eq!(
            short_address("0x52908400098527886E0F7030069857D2E4169EE7"),
            "0x5290...9EE7"
        );
        assert_eq!(
            short_hash("0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b"),
            "0x88df0164...a713944b"
        );
    }

    #[test]
    fn short_values_pass_through() {
        assert_eq!(short_address("0xabc"), "0xabc");
        assert_eq!(short_hash(""), "");
    }
}
