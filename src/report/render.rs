//! Plain text and JSON renderings of a report.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ReportOutput, RowKind, COLUMN_NAMES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn render(output: &ReportOutput, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_text(output),
        OutputFormat::Json => render_json(output),
    }
}

/// One header line, then one `|`-separated line per row.
pub fn render_text(output: &ReportOutput) -> String {
    let mut lines = Vec::with_capacity(output.rows.len() + 1);

    let mut header = vec!["row"];
    header.extend(COLUMN_NAMES);
    lines.push(header.join(" | "));

    for row in &output.rows {
        let mut cells = vec![row.kind.label()];
        cells.extend(row.columns.values().iter().map(cell));
        lines.push(cells.join(" | "));
    }

    lines.join("\n")
}

/// `{"rows": [{"kind": ..., "level": ..., <columns>}, ...]}`, pretty printed.
pub fn render_json(output: &ReportOutput) -> String {
    let rows: Vec<Value> = output
        .rows
        .iter()
        .map(|row| {
            let mut record = row.record();
            let (kind, level) = match row.kind {
                RowKind::Detail => ("detail", Value::Null),
                RowKind::Summary(level) => ("summary", json!(level)),
            };
            record.insert("kind".to_string(), json!(kind));
            record.insert("level".to_string(), level);
            Value::Object(record)
        })
        .collect();

    // Serializing a Value tree cannot fail.
    serde_json::to_string_pretty(&json!({ "rows": rows })).unwrap_or_default()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::String(s) => escape(s),
        other => other.to_string(),
    }
}

/// Keeps a name on one line and out of the column separators.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '|' => escaped.push_str("\\|"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}
