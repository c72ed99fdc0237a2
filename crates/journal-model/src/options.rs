//! Options controlling record transformation.

use serde::{Deserialize, Serialize};

/// Default cap on cleaned description length, in characters.
pub const DEFAULT_MAX_DESCRIPTION_LENGTH: usize = 255;

/// Default number of records between transform progress messages.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Options passed to the transformer at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    /// Descriptions longer than this (after trimming) are cut to this many characters.
    pub max_description_length: usize,

    /// Progress is logged every `batch_size` records. Zero disables progress logging.
    pub batch_size: usize,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            max_description_length: DEFAULT_MAX_DESCRIPTION_LENGTH,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ProcessingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_description_length(mut self, max: usize) -> Self {
        self.max_description_length = max;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}
