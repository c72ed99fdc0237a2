//! CLI library components for the journal ETL.

pub mod logging;
pub mod pipeline;
pub mod summary;
