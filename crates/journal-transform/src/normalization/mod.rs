//! Per-field normalization functions.
//!
//! Each function is pure and returns `None` (or, for descriptions, an empty
//! string) instead of an error: a value that does not normalize is an
//! expected outcome, not a failure.
//!
//! - **date**: five accepted layouts to `YYYY-MM-DD`
//! - **amount**: decimal text to two-digit fixed point, round half away from zero
//! - **account**: 3-12 ASCII digits, leading zeros kept
//! - **description**: trim and cap length

pub mod account;
pub mod amount;
pub mod date;
pub mod description;

pub use account::validate_account;
pub use amount::normalize_amount;
pub use date::{detect_layout, normalize_date};
pub use description::{clean_description, truncate_chars};
