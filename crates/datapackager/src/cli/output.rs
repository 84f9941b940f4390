//! Output formatting for CLI commands

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use datapackager_inference::{ColumnStats, InferredSchema};
use datapackager_schema::Resource;
use serde::Serialize;

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a statistic with up to four decimals, trimming trailing zeros.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let formatted = format!("{:.4}", value);
    formatted.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn stat_cells(stats: Option<&ColumnStats>) -> Vec<Cell> {
    match stats {
        Some(s) => vec![
            Cell::new(s.count),
            Cell::new(format_number(s.mean)),
            Cell::new(s.std.map(format_number).unwrap_or_else(|| "-".to_string())),
            Cell::new(format_number(s.min)),
            Cell::new(format_number(s.p50)),
            Cell::new(format_number(s.max)),
        ],
        None => (0..6).map(|_| Cell::new("")).collect(),
    }
}

/// Table of inferred columns: position, name, type and any statistics.
pub fn schema_table(schema: &InferredSchema) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "#", "NAME", "TYPE", "COUNT", "MEAN", "STD", "MIN", "MEDIAN", "MAX", "EXTENT",
        ]);

    for field in &schema.fields {
        let type_color = if field.field_type.is_numeric() {
            Color::Cyan
        } else if field.field_type.is_temporal() {
            Color::Magenta
        } else {
            Color::Reset
        };

        let mut row = vec![
            Cell::new(field.index),
            Cell::new(&field.name),
            Cell::new(field.field_type.as_str()).fg(type_color),
        ];
        row.extend(stat_cells(field.stats.as_ref()));
        row.push(Cell::new(field.temporal_extent.as_deref().unwrap_or("")));
        table.add_row(row);
    }
    table
}

pub fn resource_table(resources: &[Resource]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "DATASET", "NAME", "URL", "UPLOAD", "SCHEMA"]);

    for resource in resources {
        table.add_row(vec![
            Cell::new(&resource.id),
            Cell::new(&resource.package_id),
            Cell::new(resource.name.as_deref().unwrap_or("-")),
            Cell::new(&resource.url),
            Cell::new(if resource.is_upload() { "yes" } else { "no" }),
            Cell::new(if resource.schema.is_some() { "yes" } else { "no" }),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use datapackager_inference::{infer_schema_from_bytes, InferenceOptions};

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(1.414213562), "1.4142");
        assert_eq!(format_number(-0.25), "-0.25");
    }

    #[test]
    fn test_schema_table_lists_columns() {
        let schema =
            infer_schema_from_bytes(b"a,b\n1,x\n3,y\n", &InferenceOptions::default()).unwrap();
        let rendered = schema_table(&schema).to_string();
        assert!(rendered.contains("integer"));
        assert!(rendered.contains("string"));
        assert!(rendered.contains("NAME"));
    }

    #[test]
    fn test_resource_table() {
        let resources = vec![
            Resource::new("r1", "pkg", "http://x/a.csv").with_name("a.csv"),
            Resource::new("r2", "pkg", "http://x/b.csv").uploaded(),
        ];
        let rendered = resource_table(&resources).to_string();
        assert!(rendered.contains("a.csv"));
        assert!(rendered.contains("r2"));
    }
}
