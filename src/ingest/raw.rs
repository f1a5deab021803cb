//! Header-aware CSV reading with dynamic field typing.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Column name used for values beyond the header width.
pub const EXTRA_FIELDS_KEY: &str = "__parsed_extra";

static NUMBER_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-?(\d+\.?|\.\d+|\d+\.\d+)([eE][-+]?\d+)?\s*$").expect("valid number regex")
});

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed CSV: {0}")]
    Malformed(#[from] csv::Error),
}

/// A single untyped cell, typed the way a spreadsheet would guess it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl RawValue {
    /// Guess the type of a raw field.
    ///
    /// Only plain decimal literals become numbers; `NaN`, `inf` and localized
    /// literals such as `1.000,50` stay text.
    pub fn infer(field: &str) -> Self {
        if field.is_empty() {
            return RawValue::Missing;
        }
        if NUMBER_LITERAL.is_match(field) {
            if let Ok(value) = field.trim().parse::<f64>() {
                if value.is_finite() {
                    return RawValue::Number(value);
                }
            }
        }
        RawValue::Text(field.to_string())
    }

    /// Finite numeric payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }
}

/// Largest integer every f64 represents exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawValue::Number(value) if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*value as i64)
            }
            RawValue::Number(value) if value.is_finite() => serializer.serialize_f64(*value),
            RawValue::Number(_) | RawValue::Missing => serializer.serialize_none(),
            RawValue::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// One data line keyed by the header it was read under.
#[derive(Debug, Clone)]
pub struct RawRow {
    headers: Arc<[String]>,
    values: Vec<RawValue>,
    extra: Vec<String>,
}

impl RawRow {
    pub fn new(headers: Arc<[String]>, values: Vec<RawValue>) -> Self {
        Self {
            headers,
            values,
            extra: Vec::new(),
        }
    }

    /// Value in the given column position; absent columns read as missing.
    pub fn get(&self, column: usize) -> &RawValue {
        self.values.get(column).unwrap_or(&RawValue::Missing)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Fields beyond the header width.
    pub fn extra(&self) -> &[String] {
        &self.extra
    }

    /// Compact JSON object view of the row, in header order.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.extra.is_empty());
        let mut map = serializer.serialize_map(Some(self.headers.len() + extra))?;
        for (column, header) in self.headers.iter().enumerate() {
            map.serialize_entry(header, self.get(column))?;
        }
        if !self.extra.is_empty() {
            map.serialize_entry(EXTRA_FIELDS_KEY, &self.extra)?;
        }
        map.end()
    }
}

/// Shape problems the reader recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    TooFewFields { expected: usize, found: usize },
    TooManyFields { expected: usize, found: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// 0-based data row index.
    pub row: usize,
    pub kind: DiagnosticKind,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::TooFewFields { expected, found } => write!(
                f,
                "row {}: too few fields (expected {expected}, found {found})",
                self.row
            ),
            DiagnosticKind::TooManyFields { expected, found } => write!(
                f,
                "row {}: too many fields (expected {expected}, found {found})",
                self.row
            ),
        }
    }
}

/// Result of reading one CSV document.
#[derive(Debug, Clone)]
pub struct ParsedCsv {
    pub headers: Arc<[String]>,
    pub rows: Vec<RawRow>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Read CSV text with a header row, skipping blank lines.
pub fn parse_csv(text: &str) -> Result<ParsedCsv, CsvError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Arc<[String]> = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into();
    let width = headers.len();

    let mut rows = Vec::new();
    let mut diagnostics = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = rows.len();
        let found = record.len();
        if found < width {
            diagnostics.push(ParseDiagnostic {
                row,
                kind: DiagnosticKind::TooFewFields {
                    expected: width,
                    found,
                },
            });
        } else if found > width {
            diagnostics.push(ParseDiagnostic {
                row,
                kind: DiagnosticKind::TooManyFields {
                    expected: width,
                    found,
                },
            });
        }
        let values = record.iter().take(width).map(RawValue::infer).collect();
        let mut raw = RawRow::new(Arc::clone(&headers), values);
        raw.extra = record.iter().skip(width).map(str::to_string).collect();
        rows.push(raw);
    }

    Ok(ParsedCsv {
        headers,
        rows,
        diagnostics,
    })
}

/// Read a UTF-8 CSV file from disk.
pub fn read_csv_file(path: &Path) -> Result<ParsedCsv, CsvError> {
    let text = std::fs::read_to_string(path).map_err(|source| CsvError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(&text)
}
