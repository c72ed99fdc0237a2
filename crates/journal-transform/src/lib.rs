//! Journal entry transformation.
//!
//! - **normalization**: one pure function per field (date, amount, account,
//!   description) mapping raw text to canonical text or rejecting it
//! - **transformer**: applies the normalizers to each raw record, keeps the
//!   ones whose date, amount and account all normalize, and counts the rest

pub mod normalization;
pub mod transformer;

pub use normalization::{clean_description, normalize_amount, normalize_date, validate_account};
pub use transformer::{Transformer, transform};
