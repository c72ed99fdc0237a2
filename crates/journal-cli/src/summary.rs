use std::time::Duration;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use tracing::info;

use crate::pipeline::PipelineReport;

pub fn print_summary(report: &PipelineReport) {
    println!("Output: {}", report.output_path.display());
    println!("{}", summary_table(report));
    info!(
        total = report.stats.total,
        valid = report.stats.valid,
        skipped = report.stats.skipped,
        success_rate = format!("{:.1}", report.stats.success_rate()),
        validated = report.validated,
        total_ms = report.total().as_millis(),
        records_per_second = format!("{:.0}", report.throughput()),
        "pipeline finished"
    );
}

/// Two-column table of counters and timings for `report`.
pub fn summary_table(report: &PipelineReport) -> Table {
    let stats = &report.stats;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    table.add_row(vec![Cell::new("Records read"), Cell::new(stats.total)]);
    table.add_row(vec![
        Cell::new("Valid"),
        count_cell(stats.valid, Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Skipped"),
        count_cell(stats.skipped, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Success rate"),
        Cell::new(format!("{:.1}%", stats.success_rate())),
    ]);
    table.add_row(vec![
        Cell::new("Schema validation"),
        if report.validated {
            Cell::new("passed").fg(Color::Green)
        } else {
            dim_cell("skipped")
        },
    ]);
    table.add_row(vec![
        dim_cell("Extract"),
        dim_cell(format_duration(report.extract)),
    ]);
    table.add_row(vec![
        dim_cell("Transform"),
        dim_cell(format_duration(report.transform)),
    ]);
    table.add_row(vec![
        dim_cell("Load"),
        dim_cell(format_duration(report.load)),
    ]);
    table.add_row(vec![
        Cell::new("Total time").add_attribute(Attribute::Bold),
        Cell::new(format_duration(report.total())).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Throughput"),
        Cell::new(format!("{:.0} records/s", report.throughput())),
    ]);
    table
}

fn format_duration(duration: Duration) -> String {
    let millis = duration.as_secs_f64() * 1000.0;
    if millis >= 1000.0 {
        format!("{:.2} s", millis / 1000.0)
    } else {
        format!("{millis:.1} ms")
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        dim_cell(count)
    } else {
        Cell::new(count).fg(color)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use journal_model::TransformStats;

    use super::*;

    fn report() -> PipelineReport {
        PipelineReport {
            stats: TransformStats {
                total: 8,
                valid: 4,
                skipped: 4,
            },
            extract: Duration::from_millis(12),
            transform: Duration::from_millis(3),
            load: Duration::from_millis(1485),
            output_path: PathBuf::from("sources/output.xml"),
            validated: true,
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.5 ms");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.50 s");
        assert_eq!(format_duration(Duration::ZERO), "0.0 ms");
    }

    #[test]
    fn test_summary_rows() {
        let rendered = summary_table(&report()).to_string();
        assert!(rendered.contains("Records read"));
        assert!(rendered.contains("50.0%"));
        assert!(rendered.contains("passed"));
        assert!(rendered.contains("1.50 s"));
        assert!(rendered.contains("records/s"));
    }

    #[test]
    fn test_row_count() {
        assert_eq!(summary_table(&report()).row_count(), 10);
    }
}
