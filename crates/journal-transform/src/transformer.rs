//! Record transformation: normalize every field, keep only complete records.

use journal_model::{
    CanonicalRecord, ProcessingOptions, RawRecord, RecordError, RejectReason, TransformResult,
};
use tracing::{debug, trace};

use crate::normalization::{
    clean_description, normalize_amount, normalize_date, truncate_chars, validate_account,
};

/// Applies the field normalizers to raw records with fixed options.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    options: ProcessingOptions,
}

impl Transformer {
    pub fn new(options: ProcessingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Normalize one raw record.
    ///
    /// The record is accepted only when date, amount and account all
    /// normalize. The description never causes a rejection.
    ///
    /// # Errors
    ///
    /// Returns every reason the record was rejected, in field order.
    pub fn transform_record(&self, raw: &RawRecord) -> Result<CanonicalRecord, Vec<RejectReason>> {
        let date = normalize_date(raw.date_str());
        let amount = normalize_amount(raw.amount_str());
        let account = validate_account(raw.account_str());
        let max_length = self.options.max_description_length;
        let description = clean_description(
            raw.description
                .as_deref()
                .map(|text| truncate_chars(text, max_length)),
            max_length,
        );

        match (date, amount, account) {
            (Some(date), Some(amount), Some(account)) => {
                CanonicalRecord::new(date, account, amount, description).map_err(|error| {
                    let reason = match error {
                        RecordError::Date(_) => RejectReason::InvalidDate,
                        RecordError::Account(_) => RejectReason::InvalidAccount,
                        RecordError::Amount(_) => RejectReason::InvalidAmount,
                    };
                    vec![reason]
                })
            }
            (date, amount, account) => {
                let mut reasons = Vec::with_capacity(3);
                if date.is_none() {
                    reasons.push(RejectReason::InvalidDate);
                }
                if amount.is_none() {
                    reasons.push(RejectReason::InvalidAmount);
                }
                if account.is_none() {
                    reasons.push(RejectReason::InvalidAccount);
                }
                Err(reasons)
            }
        }
    }

    /// Transform a batch of raw records.
    ///
    /// Accepted records keep their input order. Rejected records are dropped
    /// and only counted; the reasons are logged at debug level.
    pub fn transform<I>(&self, records: I) -> TransformResult
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut result = TransformResult::default();
        let batch_size = self.options.batch_size;

        for (index, raw) in records.into_iter().enumerate() {
            match self.transform_record(&raw) {
                Ok(record) => {
                    result.records.push(record);
                    result.stats.record_valid();
                }
                Err(reasons) => {
                    result.stats.record_skipped();
                    debug!(index, reasons = ?reasons, "skipped invalid record");
                    trace!(index, record = ?raw, "skipped record values");
                }
            }
            if batch_size > 0 && (index + 1) % batch_size == 0 {
                debug!(
                    processed = index + 1,
                    valid = result.stats.valid,
                    skipped = result.stats.skipped,
                    "transform progress"
                );
            }
        }

        result
    }
}

/// Transform `records` with a one-off [`Transformer`].
pub fn transform<I>(records: I, options: ProcessingOptions) -> TransformResult
where
    I: IntoIterator<Item = RawRecord>,
{
    Transformer::new(options).transform(records)
}
