//! Journal entry data model.
//!
//! Types shared by every stage of the journal pipeline:
//!
//! - **record**: raw rows as extracted and canonical rows as emitted
//! - **processing**: transform results, run statistics, rejection reasons
//! - **options**: processing options handed to the transformer
//! - **config**: the JSON configuration file

pub mod config;
pub mod error;
pub mod options;
pub mod processing;
pub mod record;

pub use config::{
    ConfigSource, DEFAULT_CONFIG_FILE, JournalConfig, LogStyle, LoggingSection, OutputSection,
    PathsSection, ProcessingSection, ResolvedPaths,
};
pub use error::{ConfigError, RecordError};
pub use options::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_DESCRIPTION_LENGTH, ProcessingOptions};
pub use processing::{RejectReason, TransformResult, TransformStats};
pub use record::{CanonicalRecord, RawRecord};
