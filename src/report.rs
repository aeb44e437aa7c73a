//! Reports
//!
//! Renders collections for people and for other tools:
//! - `table`: fixed-width listing for the terminal
//! - `json`: pretty JSON array in the persisted shape
//! - `csv`: one row per record, extension fields as extra columns

use crate::storage::{Record, StorageError, StorageResult};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Output format for listings and exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(ExportFormat::Table),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(StorageError::Config(format!(
                "unknown format '{}', use table, json or csv",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Table => write!(f, "table"),
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Render records in the given format
pub fn export(records: &[Record], format: ExportFormat) -> StorageResult<String> {
    match format {
        ExportFormat::Table => Ok(render_table(records)),
        ExportFormat::Json => to_json(records),
        ExportFormat::Csv => to_csv(records),
    }
}

pub fn to_json(records: &[Record]) -> StorageResult<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// CSV with `id,status,date` followed by every extension field name, sorted
pub fn to_csv(records: &[Record]) -> StorageResult<String> {
    let columns = extension_columns(records);

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["id", "status", "date"];
    header.extend(columns.iter().map(String::as_str));
    writer.write_record(&header).map_err(csv_error)?;

    for record in records {
        let mut row = vec![
            record.id.to_string(),
            record.status.clone(),
            record.date.clone(),
        ];
        row.extend(
            columns
                .iter()
                .map(|c| record.get(c).map(cell_text).unwrap_or_default()),
        );
        writer.write_record(&row).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| StorageError::Serialization(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Fixed-width listing: id, date, status, type, then remaining fields
pub fn render_table(records: &[Record]) -> String {
    if records.is_empty() {
        return "No records.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<5} {:<12} {:<13} {:<18} {}\n",
        "ID", "Date", "Status", "Type", "Details"
    ));
    out.push_str(&"-".repeat(72));
    out.push('\n');

    for record in records {
        let details: Vec<String> = record
            .fields()
            .iter()
            .filter(|(k, _)| k.as_str() != "type")
            .map(|(k, v)| format!("{}={}", k, cell_text(v)))
            .collect();

        out.push_str(&format!(
            "{:<5} {:<12} {:<13} {:<18} {}\n",
            record.id,
            record.date,
            record.status,
            record.text("type").unwrap_or("-"),
            details.join(", ")
        ));
    }

    out
}

fn extension_columns(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.fields().keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn csv_error(err: csv::Error) -> StorageError {
    StorageError::Serialization(format!("CSV write failed: {}", err))
}
