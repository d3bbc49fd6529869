use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::{Number, Value};
use tracing::{debug, info};

use super::types::{ColumnKind, Record};
use crate::error::{ConsoleError, Result};

/// Read a headed CSV file into records, inferring one type per column.
pub fn read_dataset(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path).map_err(|e| {
        ConsoleError::FilterCompute(format!("failed to open {}: {}", path.display(), e))
    })?;
    let records = read_dataset_from(file)?;
    info!(path = %path.display(), rows = records.len(), "dataset loaded");
    Ok(records)
}

/// Same as [`read_dataset`] over any reader.
pub fn read_dataset_from<R: Read>(input: R) -> Result<Vec<Record>> {
    let mut rdr = csv::Reader::from_reader(input);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| ConsoleError::FilterCompute(format!("failed to read CSV headers: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    // First pass: collect raw cells and widen column kinds.
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut kinds: Vec<Option<ColumnKind>> = vec![None; headers.len()];
    for (idx, result) in rdr.records().enumerate() {
        let row = result
            .map_err(|e| ConsoleError::FilterCompute(format!("row {} unreadable: {}", idx + 1, e)))?;
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        for (col, cell) in cells.iter().enumerate().take(headers.len()) {
            if cell.is_empty() {
                continue;
            }
            let kind = ColumnKind::of(cell);
            kinds[col] = Some(kinds[col].map_or(kind, |k| k.merge(kind)));
        }
        rows.push(cells);
    }
    debug!(columns = headers.len(), rows = rows.len(), ?kinds, "inferred column types");

    let records = rows
        .into_iter()
        .map(|cells| {
            let mut record = Record::new();
            for (col, header) in headers.iter().enumerate() {
                let value = match cells.get(col) {
                    Some(cell) if !cell.is_empty() => {
                        typed_value(cell, kinds[col].unwrap_or(ColumnKind::Text))
                    }
                    _ => Value::Null,
                };
                record.insert(header.clone(), value);
            }
            record
        })
        .collect();

    Ok(records)
}

fn typed_value(cell: &str, kind: ColumnKind) -> Value {
    match kind {
        ColumnKind::Integer => cell
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or_else(|_| Value::String(cell.to_string())),
        ColumnKind::Float => cell
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        ColumnKind::Boolean => Value::Bool(cell.eq_ignore_ascii_case("true")),
        ColumnKind::Text => Value::String(cell.to_string()),
    }
}
