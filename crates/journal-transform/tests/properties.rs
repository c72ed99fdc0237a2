//! Property tests for the normalization functions.

use journal_transform::normalization::{
    clean_description, normalize_amount, normalize_date, validate_account,
};
use proptest::prelude::*;

fn render_date(layout: usize, year: i32, month: u32, day: u32) -> String {
    match layout {
        0 => format!("{year:04}-{month:02}-{day:02}"),
        1 => format!("{year:04}-{month:02}-{day:02}T10:15:30"),
        2 => format!("{year:04}-{month:02}-{day:02} 23:59:59"),
        3 => format!("{month:02}/{day:02}/{year:04}"),
        _ => format!("{day:02}-{month:02}-{year:04}"),
    }
}

/// Round thousandths to cents, half away from zero, using integers only.
fn expected_cents(negative: bool, whole: u64, thousandths: u64) -> String {
    let scaled = u128::from(whole) * 1000 + u128::from(thousandths);
    let cents = (scaled + 5) / 10;
    if cents == 0 {
        return "0.00".to_string();
    }
    let sign = if negative { "-" } else { "" };
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

proptest! {
    #[test]
    fn every_layout_normalizes_to_iso(
        layout in 0usize..5,
        year in 1i32..=9999,
        month in 1u32..=12,
        day in 1u32..=28,
    ) {
        let expected = format!("{year:04}-{month:02}-{day:02}");
        let raw = render_date(layout, year, month, day);
        prop_assert_eq!(normalize_date(&raw), Some(expected));
    }

    #[test]
    fn normalized_dates_are_fixed_points(text in "[0-9]{1,4}[-/][0-9]{1,2}[-/][0-9]{1,4}") {
        if let Some(date) = normalize_date(&text) {
            prop_assert_eq!(normalize_date(&date), Some(date.clone()));
        }
    }

    #[test]
    fn amounts_round_half_away_from_zero(
        negative in any::<bool>(),
        whole in 0u64..10_000_000_000,
        thousandths in 0u64..1000,
    ) {
        let sign = if negative { "-" } else { "" };
        let raw = format!("{sign}{whole}.{thousandths:03}");
        prop_assert_eq!(normalize_amount(&raw), Some(expected_cents(negative, whole, thousandths)));
    }

    #[test]
    fn normalized_amounts_are_fixed_points(text in "[+-]?[0-9]{0,12}([.,][0-9]{0,6})?") {
        if let Some(amount) = normalize_amount(&text) {
            prop_assert_eq!(normalize_amount(&amount), Some(amount.clone()));
        }
    }

    #[test]
    fn digit_accounts_are_returned_unchanged(account in "[0-9]{3,12}", pad in " {0,3}") {
        let padded = format!("{pad}{account}{pad}");
        prop_assert_eq!(validate_account(&padded), Some(account.clone()));
        prop_assert_eq!(validate_account(&account), Some(account.clone()));
    }

    #[test]
    fn accounts_with_a_non_digit_are_rejected(
        account in "[0-9]{0,6}[a-zA-Z./,_#-][0-9]{0,6}",
    ) {
        prop_assert_eq!(validate_account(&account), None);
    }

    #[test]
    fn accounts_outside_length_bounds_are_rejected(
        account in prop_oneof!["[0-9]{0,2}", "[0-9]{13,20}"],
    ) {
        prop_assert_eq!(validate_account(&account), None);
    }

    #[test]
    fn descriptions_are_trimmed_and_capped(
        text in "[ \t\n]{0,3}\\PC{0,300}[ \t\n]{0,3}",
        max in 1usize..300,
    ) {
        let cleaned = clean_description(Some(&text), max);
        prop_assert!(cleaned.chars().count() <= max);
        prop_assert_eq!(cleaned.trim(), cleaned.as_str());
        prop_assert_eq!(clean_description(Some(&cleaned), max), cleaned.clone());
    }
}
