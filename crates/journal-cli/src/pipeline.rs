//! Extract, transform and load stages for one journal run.
//!
//! Each stage runs inside its own `info_span!` and is timed separately so the
//! summary can report where the time went.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info, info_span, warn};

use journal_ingest::JournalSource;
use journal_model::{CanonicalRecord, ProcessingOptions, RawRecord, TransformStats};
use journal_output::{XmlOptions, XmlSchema, write_journal_file};
use journal_transform::transformer::Transformer;

/// Fully resolved inputs for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub database: PathBuf,
    /// Source table; `journal_entries` when `None`.
    pub table: Option<String>,
    pub schema: PathBuf,
    pub output: PathBuf,
    /// Check the document against `schema` before writing it.
    pub validate: bool,
    pub pretty_print: bool,
    pub options: ProcessingOptions,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub stats: TransformStats,
    pub extract: Duration,
    pub transform: Duration,
    pub load: Duration,
    pub output_path: PathBuf,
    /// Whether the written document was checked against the schema.
    pub validated: bool,
}

impl PipelineReport {
    pub fn total(&self) -> Duration {
        self.extract + self.transform + self.load
    }

    /// Source records handled per second over the whole run.
    pub fn throughput(&self) -> f64 {
        let seconds = self.total().as_secs_f64();
        if seconds > 0.0 {
            self.stats.total as f64 / seconds
        } else {
            0.0
        }
    }
}

/// Run extraction, transformation and loading in sequence.
///
/// # Errors
///
/// Fails when the database is missing or unreadable, the schema cannot be
/// loaded, the document does not match the schema, or the output cannot be
/// written. Nothing is written on failure.
pub fn run_pipeline(settings: &PipelineSettings) -> Result<PipelineReport> {
    let pipeline_span = info_span!("pipeline", database = %settings.database.display());
    let _pipeline_guard = pipeline_span.enter();
    info!(
        database = %settings.database.display(),
        output = %settings.output.display(),
        "starting journal pipeline"
    );

    let (raw_records, extract) = info_span!("extract").in_scope(|| -> Result<_> {
        let start = Instant::now();
        let records = extract(settings)?;
        let elapsed = start.elapsed();
        info!(
            records = records.len(),
            duration_ms = elapsed.as_millis(),
            "extraction complete"
        );
        Ok((records, elapsed))
    })?;

    let (result, transform) = info_span!("transform").in_scope(|| {
        let start = Instant::now();
        let result = Transformer::new(settings.options).transform(raw_records);
        let elapsed = start.elapsed();
        info!(
            total = result.stats.total,
            valid = result.stats.valid,
            skipped = result.stats.skipped,
            duration_ms = elapsed.as_millis(),
            "transformation complete"
        );
        (result, elapsed)
    });

    let (validated, load) = info_span!("load").in_scope(|| -> Result<_> {
        let start = Instant::now();
        let validated = load(settings, &result.records)?;
        let elapsed = start.elapsed();
        info!(
            path = %settings.output.display(),
            validated,
            duration_ms = elapsed.as_millis(),
            "load complete"
        );
        Ok((validated, elapsed))
    })?;

    Ok(PipelineReport {
        stats: result.stats,
        extract,
        transform,
        load,
        output_path: settings.output.clone(),
        validated,
    })
}

fn extract(settings: &PipelineSettings) -> Result<Vec<RawRecord>> {
    let mut source = JournalSource::open(&settings.database)
        .with_context(|| format!("open {}", settings.database.display()))?;
    if let Some(table) = &settings.table {
        source = source.with_table(table)?;
    }
    let rows = source
        .count()
        .with_context(|| format!("count rows in {}", source.table()))?;
    debug!(table = source.table(), rows, "reading journal table");
    source
        .read_all()
        .with_context(|| format!("read table {}", source.table()))
}

/// Write the document, validating first when enabled. Returns whether it was validated.
fn load(settings: &PipelineSettings, records: &[CanonicalRecord]) -> Result<bool> {
    let schema_present = settings.schema.is_file();
    let schema = match (settings.validate, schema_present) {
        (true, true) => Some(
            XmlSchema::from_path(&settings.schema)
                .with_context(|| format!("load schema {}", settings.schema.display()))?,
        ),
        (true, false) => {
            warn!(
                path = %settings.schema.display(),
                "schema not found, writing without validation"
            );
            None
        }
        (false, _) => {
            debug!("schema validation disabled");
            None
        }
    };

    let options = XmlOptions {
        pretty_print: settings.pretty_print,
        schema_location: schema_present
            .then(|| schema_location(&settings.schema))
            .flatten(),
    };
    write_journal_file(&settings.output, records, &options, schema.as_ref())
        .with_context(|| format!("write {}", settings.output.display()))?;
    Ok(schema.is_some())
}

fn schema_location(schema: &Path) -> Option<String> {
    schema
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(total: usize, millis: u64) -> PipelineReport {
        PipelineReport {
            stats: TransformStats {
                total,
                valid: total,
                skipped: 0,
            },
            extract: Duration::from_millis(millis),
            transform: Duration::ZERO,
            load: Duration::ZERO,
            output_path: PathBuf::from("out.xml"),
            validated: false,
        }
    }

    #[test]
    fn test_throughput() {
        let report = report(500, 250);
        assert_eq!(report.total(), Duration::from_millis(250));
        assert!((report.throughput() - 2000.0).abs() < 1e-6);
    }

    #[test]
    fn test_throughput_without_elapsed_time() {
        assert_eq!(report(10, 0).throughput(), 0.0);
    }

    #[test]
    fn test_schema_location_is_file_name() {
        assert_eq!(
            schema_location(Path::new("sources/schema.xsd")).as_deref(),
            Some("schema.xsd")
        );
    }
}
