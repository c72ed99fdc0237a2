//! Tests for the public normalization functions.

use journal_transform::normalization::{
    clean_description, detect_layout, normalize_amount, normalize_date, validate_account,
};

#[test]
fn date_examples() {
    assert_eq!(normalize_date("2024-01-01").as_deref(), Some("2024-01-01"));
    assert_eq!(normalize_date("12/31/2024").as_deref(), Some("2024-12-31"));
    assert_eq!(normalize_date("31-12-2024").as_deref(), Some("2024-12-31"));
    assert_eq!(normalize_date("2024-01-01T14:30:00").as_deref(), Some("2024-01-01"));
    assert_eq!(normalize_date("02/30/2024"), None);
    assert_eq!(normalize_date("29-02-2023"), None);
    assert_eq!(normalize_date("2024/01/01"), None);
}

#[test]
fn date_layout_priority_is_fixed() {
    // "01-02-2024" only fits the European layout: day 1, month 2
    assert_eq!(detect_layout("01-02-2024"), Some("european"));
    assert_eq!(normalize_date("01-02-2024").as_deref(), Some("2024-02-01"));
}

#[test]
fn amount_examples() {
    assert_eq!(normalize_amount("100").as_deref(), Some("100.00"));
    assert_eq!(normalize_amount("1,20").as_deref(), Some("1.20"));
    assert_eq!(normalize_amount("100.565").as_deref(), Some("100.57"));
    assert_eq!(normalize_amount("-0").as_deref(), Some("0.00"));
    assert_eq!(normalize_amount("-999.999").as_deref(), Some("-1000.00"));
    assert_eq!(normalize_amount("$100"), None);
    assert_eq!(normalize_amount("12.34.56"), None);
}

#[test]
fn amount_ties_are_not_bankers_rounding() {
    // Half-to-even would give 0.12 and 0.14 here
    assert_eq!(normalize_amount("0.125").as_deref(), Some("0.13"));
    assert_eq!(normalize_amount("0.135").as_deref(), Some("0.14"));
    assert_eq!(normalize_amount("2.675").as_deref(), Some("2.68"));
}

#[test]
fn account_examples() {
    assert_eq!(validate_account("001").as_deref(), Some("001"));
    assert_eq!(validate_account("12"), None);
    assert_eq!(validate_account("1234567890123"), None);
    assert_eq!(validate_account("AB123"), None);
}

#[test]
fn description_examples() {
    assert_eq!(clean_description(None, 255), "");
    assert_eq!(clean_description(Some("  Opening balance \n"), 255), "Opening balance");
    assert_eq!(clean_description(Some("123"), 255), "123");
}
