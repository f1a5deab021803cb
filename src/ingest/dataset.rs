use serde::Serialize;

use super::fields::FieldMapping;
use super::raw::RawRow;
use super::validate::{RejectionEntry, RowOutcome, ValidatedRecord, validate_row};

/// Valid and rejected row counts for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub valid: usize,
    pub rejected: usize,
}

impl DatasetSummary {
    /// Rows examined; every row lands in exactly one bucket.
    pub fn total(&self) -> usize {
        self.valid + self.rejected
    }
}

/// Training records and rejection log built from one file.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<ValidatedRecord>,
    rejections: Vec<RejectionEntry>,
}

impl Dataset {
    pub fn records(&self) -> &[ValidatedRecord] {
        &self.records
    }

    pub fn rejections(&self) -> &[RejectionEntry] {
        &self.rejections
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            valid: self.records.len(),
            rejected: self.rejections.len(),
        }
    }
}

/// Validate every row in file order, keeping both partitions in order.
pub fn build_dataset(rows: &[RawRow], mapping: &FieldMapping) -> Dataset {
    let mut dataset = Dataset::default();
    for (index, row) in rows.iter().enumerate() {
        match validate_row(row, mapping, index) {
            RowOutcome::Valid(record) => dataset.records.push(record),
            RowOutcome::Rejected(entry) => dataset.rejections.push(entry),
        }
    }
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fields::{FieldPatterns, resolve_fields};
    use crate::ingest::raw::parse_csv;
    use crate::ingest::validate::Features;

    fn build(text: &str) -> Dataset {
        let parsed = parse_csv(text).unwrap();
        let mapping = resolve_fields(&parsed.headers, &FieldPatterns::default());
        build_dataset(&parsed.rows, &mapping)
    }

    #[test]
    fn mixed_file_yields_one_record_and_one_rejection() {
        let dataset = build("Tamanho(m2),Banheiros,Quartos,Preco\n100,2,2,500000\nabc,2,2,500000\n");
        assert_eq!(
            dataset.summary(),
            DatasetSummary {
                valid: 1,
                rejected: 1
            }
        );
        let record = dataset.records()[0];
        assert_eq!(record.features(), Features::new(100.0, 2.0, 2.0));
        assert_eq!(record.price(), 500_000.0);
        assert_eq!(dataset.rejections()[0].line_number(), 3);
    }

    #[test]
    fn partition_covers_every_data_row_in_order() {
        let mut text = String::from("preco,quartos,banheiros,tamanho,bairro\n");
        let mut expected_valid = Vec::new();
        let mut expected_rejected = Vec::new();
        for idx in 0..40usize {
            match idx % 4 {
                0 => {
                    text.push_str(&format!("x{idx},2,1,80,centro\n"));
                    expected_rejected.push(idx);
                }
                1 => {
                    text.push_str(&format!("{},2,1,,centro\n", 100_000 + idx));
                    expected_rejected.push(idx);
                }
                _ => {
                    text.push_str(&format!("{},3,2,{},centro\n", 200_000 + idx, 50 + idx));
                    expected_valid.push(idx);
                }
            }
        }
        let dataset = build(&text);
        assert_eq!(dataset.summary().total(), 40);
        let prices: Vec<f64> = dataset.records().iter().map(|r| r.price()).collect();
        let expected_prices: Vec<f64> = expected_valid
            .iter()
            .map(|idx| (200_000 + idx) as f64)
            .collect();
        assert_eq!(prices, expected_prices);
        let rejected: Vec<usize> = dataset.rejections().iter().map(|r| r.index()).collect();
        assert_eq!(rejected, expected_rejected);
    }

    #[test]
    fn header_only_file_is_empty() {
        let dataset = build("tamanho,banheiros,quartos,preco\n");
        assert!(dataset.is_empty());
        assert_eq!(dataset.summary().total(), 0);
    }
}
