//! Account number validation.

/// Shortest accepted account number.
pub const MIN_ACCOUNT_LENGTH: usize = 3;
/// Longest accepted account number.
pub const MAX_ACCOUNT_LENGTH: usize = 12;

/// Accept an account number of 3-12 ASCII digits after trimming.
///
/// Account numbers are opaque identifiers: the trimmed text is returned
/// unchanged, leading zeros included.
pub fn validate_account(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let length_ok = (MIN_ACCOUNT_LENGTH..=MAX_ACCOUNT_LENGTH).contains(&trimmed.len());
    if length_ok && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_accounts() {
        assert_eq!(validate_account("123").as_deref(), Some("123"));
        assert_eq!(validate_account("123456789012").as_deref(), Some("123456789012"));
        assert_eq!(validate_account("000").as_deref(), Some("000"));
        assert_eq!(validate_account("001").as_deref(), Some("001"));
        assert_eq!(validate_account("  123  ").as_deref(), Some("123"));
    }

    #[test]
    fn test_invalid_accounts() {
        for value in [
            "", "12", "1234567890123", "12A", "12-34", "12.34", "ABC", "AB123", "1 23", "١٢٣",
        ] {
            assert_eq!(validate_account(value), None, "{value:?} should be rejected");
        }
    }
}
