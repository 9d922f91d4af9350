use crate::error::{Result, SyncError};
use dialdesk_core::domain::Company;
use dialdesk_core::RawRow;
use serde_json::{Map, Value};

/// Sheet rows decoded from a JSON upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRows {
    pub rows: Vec<RawRow>,
    pub warnings: Vec<String>,
    pub skipped: usize,
}

/// Accepts `[{...}, ...]` or `{"rows": [{...}, ...]}`. Cells may be
/// strings, numbers or booleans; `null` cells count as absent.
pub fn parse_rows_json(data: &str) -> Result<ParsedRows> {
    let value: Value = serde_json::from_str(data)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("rows") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(SyncError::Parse(
                    "expected a `rows` array in the upload object".to_string(),
                ))
            }
        },
        _ => {
            return Err(SyncError::Parse(
                "expected an array of rows or an object with a `rows` array".to_string(),
            ))
        }
    };

    let mut parsed = ParsedRows::default();
    for (index, item) in items.into_iter().enumerate() {
        let line = index + 1;
        match item {
            Value::Object(cells) => parsed.rows.push(row_from_cells(line, cells, &mut parsed.warnings)),
            other => {
                parsed.skipped += 1;
                parsed
                    .warnings
                    .push(format!("row {line}: expected an object, got {}", value_kind(&other)));
            }
        }
    }
    Ok(parsed)
}

fn row_from_cells(line: usize, cells: Map<String, Value>, warnings: &mut Vec<String>) -> RawRow {
    let mut row = RawRow::new();
    for (key, cell) in cells {
        let text = match cell {
            Value::Null => continue,
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Array(_) | Value::Object(_) => {
                warnings.push(format!("row {line}: ignoring nested value in column {key}"));
                continue;
            }
        };
        row.insert(key, text);
    }
    row
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn export_companies_json(companies: &[Company]) -> Result<String> {
    let mut data = serde_json::to_string_pretty(companies)?;
    data.push('\n');
    Ok(data)
}
