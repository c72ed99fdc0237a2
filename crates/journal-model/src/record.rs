//! Raw and canonical journal entry records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// A journal entry row exactly as the source store returned it.
///
/// Every field is optional: `None` means the source value was NULL or the
/// column was missing. No format is implied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawRecord {
    pub date: Option<String>,
    pub account: Option<String>,
    pub amount: Option<String>,
    pub description: Option<String>,
}

impl RawRecord {
    pub fn new(
        date: impl Into<String>,
        account: impl Into<String>,
        amount: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date: Some(date.into()),
            account: Some(account.into()),
            amount: Some(amount.into()),
            description: Some(description.into()),
        }
    }

    pub fn date_str(&self) -> &str {
        self.date.as_deref().unwrap_or("")
    }

    pub fn account_str(&self) -> &str {
        self.account.as_deref().unwrap_or("")
    }

    pub fn amount_str(&self) -> &str {
        self.amount.as_deref().unwrap_or("")
    }
}

/// A validated journal entry in output form.
///
/// Fields are private and only set through [`CanonicalRecord::new`], which
/// rejects anything not already in canonical form. Downstream stages never
/// re-check them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CanonicalRecord {
    date: String,
    account: String,
    amount: String,
    description: String,
}

impl CanonicalRecord {
    /// Build a record from normalized field values.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when the date is not `YYYY-MM-DD` naming a real
    /// calendar day, the account is not 3-12 ASCII digits, or the amount is
    /// not `-?digits.dd` without redundant leading zeros or a negative zero.
    pub fn new(
        date: String,
        account: String,
        amount: String,
        description: String,
    ) -> Result<Self, RecordError> {
        if !is_canonical_date(&date) {
            return Err(RecordError::Date(date));
        }
        if !is_canonical_account(&account) {
            return Err(RecordError::Account(account));
        }
        if !is_canonical_amount(&amount) {
            return Err(RecordError::Amount(amount));
        }
        Ok(Self {
            date,
            account,
            amount,
            description,
        })
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Cleaned description, possibly empty.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

fn is_canonical_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(idx, b)| idx == 4 || idx == 7 || b.is_ascii_digit())
        && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn is_canonical_account(value: &str) -> bool {
    (3..=12).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}

fn is_canonical_amount(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let Some((whole, fraction)) = unsigned.split_once('.') else {
        return false;
    };
    let digits_only = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || !digits_only(fraction) || fraction.len() != 2 {
        return false;
    }
    if whole.len() > 1 && whole.starts_with('0') {
        return false;
    }
    // "-0.00" is never canonical
    !(value.starts_with('-') && whole == "0" && fraction == "00")
}
