/// Rendering of statement results using comfy-table

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use dxdb_core::{IndexDescription, QueryResult, ResultSet, Value};

/// Output format for query results
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    Table,
    /// Pretty JSON
    Json,
}

pub fn render(result: &QueryResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&result.to_json())?),
        OutputFormat::Table => Ok(render_table(result)),
    }
}

fn render_table(result: &QueryResult) -> String {
    match result {
        QueryResult::Done => "OK".to_string(),
        QueryResult::Rows(rows) => format_result_set(rows),
        QueryResult::Inserted(inserted) => format!(
            "{} row{} inserted",
            inserted.n_inserted,
            plural(inserted.n_inserted)
        ),
        QueryResult::Affected(n) => format!("{} row{} affected", n, plural(*n)),
        QueryResult::Description(description) => description.to_string().trim_end().to_string(),
        QueryResult::Names(names) if names.is_empty() => "(none)".to_string(),
        QueryResult::Names(names) => names.join("\n"),
        QueryResult::Indices(indices) => format_indices(indices),
        QueryResult::Value(value) => value.to_string(),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format a result set as a table, one row per result row
pub fn format_result_set(rows: &ResultSet) -> String {
    if rows.is_empty() {
        return "No rows found".to_string();
    }

    let mut table = new_table();
    table.set_header(rows.columns.iter().map(Cell::new).collect::<Vec<_>>());
    for row in &rows.rows {
        table.add_row(row.iter().map(|v| Cell::new(v.to_string())).collect::<Vec<_>>());
    }
    table.to_string()
}

fn format_indices(indices: &[IndexDescription]) -> String {
    if indices.is_empty() {
        return "No indices found".to_string();
    }

    let mut table = new_table();
    table.set_header(vec!["table", "index", "column", "type"]);
    for index in indices {
        table.add_row(vec![
            index.table.clone(),
            index.name.clone(),
            index.column.clone(),
            index.index_type.to_string(),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cars() -> ResultSet {
        ResultSet {
            columns: vec!["brand".into(), "sedan".into()],
            rows: vec![
                vec![Value::String("Mazda".into()), Value::Boolean(true)],
                vec![Value::String("Ford".into()), Value::Null],
            ],
        }
    }

    #[test]
    fn test_format_empty_result() {
        assert_eq!(format_result_set(&ResultSet::default()), "No rows found");
    }

    #[test]
    fn test_format_rows() {
        let output = format_result_set(&cars());
        assert!(output.contains("brand"));
        assert!(output.contains("Mazda"));
        assert!(output.contains("Ford"));
        assert!(output.contains("null"));
    }

    #[test]
    fn test_render_counts() {
        let output = render(&QueryResult::Affected(1), OutputFormat::Table).unwrap();
        assert_eq!(output, "1 row affected");
        let output = render(&QueryResult::Affected(3), OutputFormat::Table).unwrap();
        assert_eq!(output, "3 rows affected");
    }

    #[test]
    fn test_render_json() {
        let output = render(&QueryResult::Rows(cars()), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["brand"], "Mazda");
        assert_eq!(parsed[1]["sedan"], serde_json::Value::Null);
    }
}
