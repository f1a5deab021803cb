//! Per-row validation into typed training records.

use std::fmt;

use serde::Serialize;

use super::fields::{CanonicalField, FieldMapping};
use super::raw::{RawRow, RawValue};

/// Listing features in original units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Features {
    pub size: f64,
    pub bathrooms: f64,
    pub bedrooms: f64,
}

impl Features {
    pub fn new(size: f64, bathrooms: f64, bedrooms: f64) -> Self {
        Self {
            size,
            bathrooms,
            bedrooms,
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.size, self.bathrooms, self.bedrooms]
    }
}

/// A row that passed validation. All four values are finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidatedRecord {
    features: Features,
    price: f64,
}

impl ValidatedRecord {
    pub fn features(&self) -> Features {
        self.features
    }

    pub fn price(&self) -> f64 {
        self.price
    }
}

/// Why a canonical field could not be read from a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "problem", content = "value", rename_all = "snake_case")]
pub enum FieldProblem {
    /// No header matched the field.
    Unmapped,
    /// The cell was empty or absent.
    Missing,
    /// The cell held text that is not a number.
    NotNumeric(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field: CanonicalField,
    pub problem: FieldProblem,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            FieldProblem::Unmapped => write!(f, "{}: no matching column", self.field),
            FieldProblem::Missing => write!(f, "{}: empty", self.field),
            FieldProblem::NotNumeric(text) => write!(f, "{}: not a number ({text:?})", self.field),
        }
    }
}

/// Diagnostic for a row excluded from training.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectionEntry {
    index: usize,
    issues: Vec<FieldIssue>,
    raw: String,
}

impl RejectionEntry {
    /// 0-based position among the file's data rows.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Line in the source file, counting the header as line 1.
    pub fn line_number(&self) -> usize {
        self.index + 2
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// The row as a JSON object, for display.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for RejectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {} skipped: {}", self.line_number(), self.raw)
    }
}

/// Exactly one outcome per row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Valid(ValidatedRecord),
    Rejected(RejectionEntry),
}

/// Decide whether a row is usable for training.
pub fn validate_row(row: &RawRow, mapping: &FieldMapping, index: usize) -> RowOutcome {
    let mut values = [0.0f64; 4];
    let mut issues = Vec::new();
    for (slot, field) in CanonicalField::ALL.into_iter().enumerate() {
        match read_field(row, mapping, field) {
            Ok(value) => values[slot] = value,
            Err(problem) => issues.push(FieldIssue { field, problem }),
        }
    }

    if !issues.is_empty() {
        return RowOutcome::Rejected(RejectionEntry {
            index,
            issues,
            raw: row.to_json(),
        });
    }

    let [size, bathrooms, bedrooms, price] = values;
    RowOutcome::Valid(ValidatedRecord {
        features: Features::new(size, bathrooms, bedrooms),
        price,
    })
}

fn read_field(
    row: &RawRow,
    mapping: &FieldMapping,
    field: CanonicalField,
) -> Result<f64, FieldProblem> {
    let column = mapping.column(field).ok_or(FieldProblem::Unmapped)?;
    match row.get(column.index) {
        RawValue::Number(value) if value.is_finite() => Ok(*value),
        RawValue::Number(value) => Err(FieldProblem::NotNumeric(value.to_string())),
        RawValue::Text(text) => Err(FieldProblem::NotNumeric(text.clone())),
        RawValue::Missing => Err(FieldProblem::Missing),
    }
}

#[cfg(test)]
pub(crate) fn record(size: f64, bathrooms: f64, bedrooms: f64, price: f64) -> ValidatedRecord {
    ValidatedRecord {
        features: Features::new(size, bathrooms, bedrooms),
        price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fields::{FieldPatterns, resolve_fields};
    use crate::ingest::raw::parse_csv;

    fn outcomes(text: &str) -> Vec<RowOutcome> {
        let parsed = parse_csv(text).unwrap();
        let mapping = resolve_fields(&parsed.headers, &FieldPatterns::default());
        parsed
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| validate_row(row, &mapping, index))
            .collect()
    }

    #[test]
    fn numeric_row_keeps_original_scale() {
        let result = outcomes("quartos,tamanho,preco,banheiros\n3,120.5,750000,2\n");
        let RowOutcome::Valid(record) = &result[0] else {
            panic!("expected valid row, got {result:?}");
        };
        assert_eq!(record.features(), Features::new(120.5, 2.0, 3.0));
        assert_eq!(record.price(), 750_000.0);
    }

    #[test]
    fn any_bad_field_rejects_with_line_number() {
        let text = "tamanho,banheiros,quartos,preco\n\
                    100,2,2,500000\n\
                    100,,2,500000\n\
                    100,2,two,500000\n\
                    100,2,2\n";
        let result = outcomes(text);
        assert!(matches!(result[0], RowOutcome::Valid(_)));
        for (index, outcome) in result.iter().enumerate().skip(1) {
            let RowOutcome::Rejected(entry) = outcome else {
                panic!("row {index} should be rejected");
            };
            assert_eq!(entry.index(), index);
            assert_eq!(entry.line_number(), index + 2);
        }
        let RowOutcome::Rejected(entry) = &result[2] else {
            unreachable!()
        };
        assert_eq!(
            entry.issues(),
            [FieldIssue {
                field: CanonicalField::Bedrooms,
                problem: FieldProblem::NotNumeric("two".into()),
            }]
        );
        assert_eq!(
            entry.to_string(),
            r#"Line 4 skipped: {"tamanho":100,"banheiros":2,"quartos":"two","preco":500000}"#
        );
    }

    #[test]
    fn unmapped_field_rejects_every_row() {
        let result = outcomes("tamanho,banheiros,quartos,valor\n100,2,2,500000\n80,1,1,300000\n");
        for outcome in result {
            let RowOutcome::Rejected(entry) = outcome else {
                panic!("row should be rejected");
            };
            assert_eq!(
                entry.issues(),
                [FieldIssue {
                    field: CanonicalField::Price,
                    problem: FieldProblem::Unmapped,
                }]
            );
        }
    }
}
