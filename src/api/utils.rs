//! Shared utility functions for API handlers

/// Validate Ethereum address format
pub fn is_valid_eth_address(address: &str) -> bool {
    address.len() == 42 && address.starts_with("0x") &&
    address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_eth_address("0xd8da6bf26964af9d7eed9e03e53415d37aa96045"));
        assert!(is_valid_eth_address("0xD8dA6BF26964aF9D7eEd9e03E53415D37aA96045"));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(!is_valid_eth_address("0xabc"));
        assert!(!is_valid_eth_address("d8da6bf26964af9d7eed9e03e53415d37aa9604500"));
        assert!(!is_valid_eth_address("0xz8da6bf26964af9d7eed9e03e53415d37aa96045"));
    }
}
