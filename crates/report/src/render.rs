//! Plain-text table rendering for report output.

use std::fmt::Write;

use serde::Serialize;
use serde_json::Value;

/// Rows and columns of a serialized table, counting every field.
pub fn shape(rows: &[Value]) -> (usize, usize) {
    let columns = rows
        .first()
        .and_then(Value::as_object)
        .map_or(0, |obj| obj.len());
    (rows.len(), columns)
}

/// Serialize each row to a JSON object.
pub fn to_rows<T: Serialize>(items: &[T]) -> serde_json::Result<Vec<Value>> {
    items.iter().map(serde_json::to_value).collect()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{f:.3}"),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

/// Render the first `limit` rows of `rows`, showing only `columns`.
pub fn render_table(title: &str, rows: &[Value], columns: &[&str], limit: usize) -> String {
    let shown: Vec<Vec<String>> = rows
        .iter()
        .take(limit)
        .map(|row| columns.iter().map(|c| cell(row.get(*c))).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            shown
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "\n=== {title} ===");
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{c:<w$}"))
        .collect();
    let _ = writeln!(out, "{}", header.join("  ").trim_end());
    for row in &shown {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{v:<w$}"))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    if rows.is_empty() {
        let _ = writeln!(out, "(no rows)");
    }
    let (r, c) = shape(rows);
    let _ = writeln!(out, "shape: ({r}, {c})");
    out
}
