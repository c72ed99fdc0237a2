use std::fmt;

use serde::Serialize;

use crate::record::CanonicalRecord;

/// Why a raw record was dropped. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    InvalidDate,
    InvalidAmount,
    InvalidAccount,
}

impl RejectReason {
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidDate => "Date",
            Self::InvalidAmount => "Amount",
            Self::InvalidAccount => "Account",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}", self.field())
    }
}

/// Record counters for one transform run.
///
/// `total == valid + skipped` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub total: usize,
    pub valid: usize,
    pub skipped: usize,
}

impl TransformStats {
    pub fn record_valid(&mut self) {
        self.total += 1;
        self.valid += 1;
    }

    pub fn record_skipped(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    /// Share of valid records in percent, `0.0` for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.valid as f64 / self.total as f64 * 100.0
        }
    }
}

/// Output of the transform stage: accepted records in input order plus counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformResult {
    pub records: Vec<CanonicalRecord>,
    pub stats: TransformStats,
}

impl TransformResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
