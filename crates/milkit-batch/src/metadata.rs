// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metadata join — load a CSV or spreadsheet into a stem → credit lookup and
// resolve the watermark text for each file.
//
// Only the schema's key and value columns are read. Keys are trimmed and
// case-folded on both sides of the join. When a key repeats, the last row
// wins.

use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use milkit_core::config::MetadataSchema;
use milkit_core::error::{MilkitError, Result};
use tracing::{debug, info, instrument, warn};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Read-only lookup from normalized stem to watermark text.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    records: HashMap<String, String>,
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

fn load_error(path: &Path, reason: impl Into<String>) -> MilkitError {
    MilkitError::MetadataLoad {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

impl MetadataIndex {
    /// Load `path`, dispatching on its extension.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path, schema: &MetadataSchema) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let (headers, rows) = if ext == "csv" {
            read_csv(path)?
        } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            read_spreadsheet(path)?
        } else {
            return Err(load_error(
                path,
                format!("unsupported metadata file type `.{ext}` (expected .csv, .xlsx, .xls, .xlsm, .xlsb or .ods)"),
            ));
        };

        let index = Self::from_rows(&headers, rows, schema).map_err(|reason| load_error(path, reason))?;
        info!(
            records = index.len(),
            key_column = %schema.key_column,
            value_column = %schema.value_column,
            "Metadata loaded"
        );
        Ok(index)
    }

    /// Build an index from a header row and data rows.
    ///
    /// Errors with a message listing the available columns when either
    /// schema column is missing.
    pub fn from_rows<I>(headers: &[String], rows: I, schema: &MetadataSchema) -> std::result::Result<Self, String>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let headers: Vec<&str> = headers.iter().map(|h| h.trim()).collect();
        let position = |name: &str| headers.iter().position(|h| *h == name.trim());

        let missing: Vec<&str> = [schema.key_column.as_str(), schema.value_column.as_str()]
            .into_iter()
            .filter(|name| position(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(format!(
                "column(s) {:?} not found in metadata file; available columns: {:?}",
                missing, headers
            ));
        }
        let (Some(key_at), Some(value_at)) = (position(&schema.key_column), position(&schema.value_column)) else {
            return Err("metadata columns could not be located".into());
        };

        let mut records = HashMap::new();
        let mut dropped = 0usize;
        for row in rows {
            let key = row.get(key_at).map(|c| c.trim()).unwrap_or_default();
            let value = row.get(value_at).map(|c| c.trim()).unwrap_or_default();
            if key.is_empty() || value.is_empty() {
                dropped += 1;
                continue;
            }
            if let Some(previous) = records.insert(normalize_key(key), schema.format_text(value)) {
                debug!(key, previous = %previous, "Duplicate metadata key; keeping the later row");
            }
        }
        if dropped > 0 {
            debug!(dropped, "Dropped metadata rows with an empty key or value");
        }
        Ok(Self { records })
    }

    /// Watermark text for a file stem, if a row matched.
    pub fn lookup(&self, stem: &str) -> Option<&str> {
        self.records.get(&normalize_key(stem)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|err| load_error(path, format!("failed to open CSV: {err}")))?;

    let headers = reader
        .headers()
        .map_err(|err| load_error(path, format!("failed to read CSV header: {err}")))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_owned())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| load_error(path, format!("malformed CSV row: {err}")))?;
        rows.push(record.iter().map(str::to_owned).collect());
    }
    Ok((headers, rows))
}

fn read_spreadsheet(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| load_error(path, format!("failed to open workbook: {err}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| load_error(path, "workbook has no sheets"))?
        .map_err(|err| load_error(path, format!("failed to read first sheet: {err}")))?;

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().ok_or_else(|| load_error(path, "first sheet is empty"))?;
    Ok((headers, rows.collect()))
}

/// Render a spreadsheet cell as the text a user would see. Integral numbers
/// lose their `.0` so `2314` matches the file stem `2314`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => {
            warn!(error = ?e, "Spreadsheet cell holds an error value");
            String::new()
        }
        other => other.to_string(),
    }
}

/// Resolves the watermark text for a file: metadata match, then the static
/// fallback, then nothing.
#[derive(Debug, Clone, Default)]
pub struct WatermarkSource {
    index: Option<MetadataIndex>,
    fallback: Option<String>,
}

impl WatermarkSource {
    pub fn new(index: Option<MetadataIndex>, fallback: Option<String>) -> Self {
        let fallback = fallback
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        Self { index, fallback }
    }

    /// Load the configured metadata file, if any. A configured file that
    /// cannot be loaded is an error.
    pub fn load(meta_file: Option<&Path>, schema: &MetadataSchema, fallback: Option<String>) -> Result<Self> {
        let index = meta_file.map(|path| MetadataIndex::load(path, schema)).transpose()?;
        Ok(Self::new(index, fallback))
    }

    pub fn index(&self) -> Option<&MetadataIndex> {
        self.index.as_ref()
    }

    pub fn resolve(&self, stem: &str) -> Option<String> {
        self.index
            .as_ref()
            .and_then(|index| index.lookup(stem))
            .map(str::to_owned)
            .or_else(|| self.fallback.clone())
    }
}
