//! Locale-aware money formatting for predictions and reports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported display locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CurrencyLocale {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
}

impl CurrencyLocale {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pt-br" => Some(CurrencyLocale::PtBr),
            "en-us" => Some(CurrencyLocale::EnUs),
            _ => None,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CurrencyLocale::PtBr => "R$ ",
            CurrencyLocale::EnUs => "$",
        }
    }

    fn separators(self) -> (char, char) {
        match self {
            CurrencyLocale::PtBr => ('.', ','),
            CurrencyLocale::EnUs => (',', '.'),
        }
    }
}

impl fmt::Display for CurrencyLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrencyLocale::PtBr => f.write_str("pt-BR"),
            CurrencyLocale::EnUs => f.write_str("en-US"),
        }
    }
}

/// Config keys (TOML `[currency]`): `locale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CurrencyFormat {
    #[serde(default)]
    pub locale: CurrencyLocale,
}

impl CurrencyFormat {
    pub fn new(locale: CurrencyLocale) -> Self {
        Self { locale }
    }

    /// Format with two decimals, grouped thousands and the locale's symbol.
    pub fn format(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return "n/a".to_string();
        }
        let (group, decimal) = self.locale.separators();
        let cents = (amount.abs() * 100.0).round() as u128;
        let whole = (cents / 100).to_string();
        let fraction = cents % 100;

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (idx, digit) in whole.chars().enumerate() {
            if idx > 0 && (whole.len() - idx) % 3 == 0 {
                grouped.push(group);
            }
            grouped.push(digit);
        }

        let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
        format!(
            "{sign}{}{grouped}{decimal}{fraction:02}",
            self.locale.symbol()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_brazilian_real() {
        let fmt = CurrencyFormat::new(CurrencyLocale::PtBr);
        assert_eq!(fmt.format(500_000.0), "R$ 500.000,00");
        assert_eq!(fmt.format(1_234_567.891), "R$ 1.234.567,89");
        assert_eq!(fmt.format(999.999), "R$ 1.000,00");
        assert_eq!(fmt.format(-42.5), "-R$ 42,50");
        assert_eq!(fmt.format(0.0), "R$ 0,00");
    }

    #[test]
    fn formats_us_dollar() {
        let fmt = CurrencyFormat::new(CurrencyLocale::EnUs);
        assert_eq!(fmt.format(1_234_567.891), "$1,234,567.89");
        assert_eq!(fmt.format(12.0), "$12.00");
        assert_eq!(fmt.format(-0.001), "$0.00");
        assert_eq!(fmt.format(f64::NAN), "n/a");
    }

    #[test]
    fn parses_locale_tags() {
        assert_eq!(CurrencyLocale::parse("pt_BR"), Some(CurrencyLocale::PtBr));
        assert_eq!(CurrencyLocale::parse(" EN-us "), Some(CurrencyLocale::EnUs));
        assert_eq!(CurrencyLocale::parse("fr-FR"), None);
    }
}
