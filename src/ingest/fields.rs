//! Resolve loosely named CSV headers to the canonical listing fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four columns the pipeline extracts regardless of header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Size,
    Bathrooms,
    Bedrooms,
    Price,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::Size,
        CanonicalField::Bathrooms,
        CanonicalField::Bedrooms,
        CanonicalField::Price,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::Size => "size",
            CanonicalField::Bathrooms => "bathrooms",
            CanonicalField::Bedrooms => "bedrooms",
            CanonicalField::Price => "price",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Header substrings that identify each canonical field.
///
/// Config keys (TOML `[fields]`): `size`, `bathrooms`, `bedrooms`, `price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPatterns {
    #[serde(default = "default_size_patterns")]
    pub size: Vec<String>,
    #[serde(default = "default_bathroom_patterns")]
    pub bathrooms: Vec<String>,
    #[serde(default = "default_bedroom_patterns")]
    pub bedrooms: Vec<String>,
    #[serde(default = "default_price_patterns")]
    pub price: Vec<String>,
}

impl Default for FieldPatterns {
    fn default() -> Self {
        Self {
            size: default_size_patterns(),
            bathrooms: default_bathroom_patterns(),
            bedrooms: default_bedroom_patterns(),
            price: default_price_patterns(),
        }
    }
}

impl FieldPatterns {
    pub fn for_field(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::Size => &self.size,
            CanonicalField::Bathrooms => &self.bathrooms,
            CanonicalField::Bedrooms => &self.bedrooms,
            CanonicalField::Price => &self.price,
        }
    }

    /// Lower-case and trim every pattern, dropping blanks.
    pub fn normalized(mut self) -> Self {
        for patterns in [
            &mut self.size,
            &mut self.bathrooms,
            &mut self.bedrooms,
            &mut self.price,
        ] {
            *patterns = patterns
                .iter()
                .map(|pattern| pattern.trim().to_lowercase())
                .filter(|pattern| !pattern.is_empty())
                .collect();
        }
        self
    }
}

fn default_size_patterns() -> Vec<String> {
    vec!["tamanho".to_string()]
}

fn default_bathroom_patterns() -> Vec<String> {
    vec!["banheiro".to_string()]
}

fn default_bedroom_patterns() -> Vec<String> {
    vec!["quarto".to_string()]
}

fn default_price_patterns() -> Vec<String> {
    vec!["preco".to_string()]
}

/// Header column a canonical field was resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub index: usize,
    pub header: String,
}

/// Column assignment for one file, computed once from its header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    size: Option<ResolvedColumn>,
    bathrooms: Option<ResolvedColumn>,
    bedrooms: Option<ResolvedColumn>,
    price: Option<ResolvedColumn>,
}

impl FieldMapping {
    pub fn column(&self, field: CanonicalField) -> Option<&ResolvedColumn> {
        match field {
            CanonicalField::Size => self.size.as_ref(),
            CanonicalField::Bathrooms => self.bathrooms.as_ref(),
            CanonicalField::Bedrooms => self.bedrooms.as_ref(),
            CanonicalField::Price => self.price.as_ref(),
        }
    }

    fn slot(&mut self, field: CanonicalField) -> &mut Option<ResolvedColumn> {
        match field {
            CanonicalField::Size => &mut self.size,
            CanonicalField::Bathrooms => &mut self.bathrooms,
            CanonicalField::Bedrooms => &mut self.bedrooms,
            CanonicalField::Price => &mut self.price,
        }
    }

    /// Fields no header matched; every row will be rejected for these.
    pub fn missing(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|field| self.column(*field).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Map headers to canonical fields by case- and whitespace-insensitive substring match.
///
/// The first header containing any pattern of a field wins. Unmatched fields
/// stay absent; this never fails.
pub fn resolve_fields(headers: &[String], patterns: &FieldPatterns) -> FieldMapping {
    let folded: Vec<String> = headers
        .iter()
        .map(|header| header.trim().to_lowercase())
        .collect();
    let mut mapping = FieldMapping::default();
    for field in CanonicalField::ALL {
        let wanted: Vec<String> = patterns
            .for_field(field)
            .iter()
            .map(|pattern| pattern.trim().to_lowercase())
            .filter(|pattern| !pattern.is_empty())
            .collect();
        let found = folded
            .iter()
            .position(|header| wanted.iter().any(|pattern| header.contains(pattern.as_str())));
        *mapping.slot(field) = found.map(|index| ResolvedColumn {
            index,
            header: headers[index].clone(),
        });
    }
    mapping
}
