//! Synthetic listings with a known linear price rule, for demos and benchmarks.

use std::io::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ml::normalization::NormalizationPolicy;

pub const SIZE_RANGE: (u32, u32) = (30, 250);
pub const BATHROOM_RANGE: (u32, u32) = (1, 5);
pub const BEDROOM_RANGE: (u32, u32) = (1, 6);
pub const NOISE: i64 = 50_000;
pub const HEADER: [&str; 4] = ["tamanho", "banheiros", "quartos", "preco"];

/// Generator settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthOptions {
    pub rows: usize,
    pub seed: u64,
    /// Write every column scaled into roughly `0..=1` instead of raw units.
    pub normalized: bool,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            rows: 100_000,
            seed: 42,
            normalized: false,
        }
    }
}

/// One generated listing in raw units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listing {
    pub size: u32,
    pub bathrooms: u32,
    pub bedrooms: u32,
    pub price: i64,
}

impl Listing {
    pub fn random(rng: &mut impl Rng) -> Self {
        let size = rng.random_range(SIZE_RANGE.0..=SIZE_RANGE.1);
        let bathrooms = rng.random_range(BATHROOM_RANGE.0..=BATHROOM_RANGE.1);
        let bedrooms = rng.random_range(BEDROOM_RANGE.0..=BEDROOM_RANGE.1);
        let price = base_price(size, bathrooms, bedrooms) + rng.random_range(-NOISE..=NOISE);
        Self {
            size,
            bathrooms,
            bedrooms,
            price,
        }
    }

    fn record(&self, normalized: bool, policy: &NormalizationPolicy) -> [String; 4] {
        if !normalized {
            return [
                self.size.to_string(),
                self.bathrooms.to_string(),
                self.bedrooms.to_string(),
                self.price.to_string(),
            ];
        }
        [
            format!("{:.4}", self.size as f64 / policy.size_max),
            format!("{:.4}", self.bathrooms as f64 / BATHROOM_RANGE.1 as f64),
            format!("{:.4}", self.bedrooms as f64 / BEDROOM_RANGE.1 as f64),
            format!("{:.6}", policy.normalize_price(self.price as f64)),
        ]
    }
}

/// Noise-free price for a listing.
pub fn base_price(size: u32, bathrooms: u32, bedrooms: u32) -> i64 {
    size as i64 * 4_000 + bathrooms as i64 * 10_000 + bedrooms as i64 * 15_000
}

/// Write a header row and `options.rows` listings as CSV.
pub fn write_listings<W: Write>(writer: W, options: &SynthOptions) -> Result<(), csv::Error> {
    let policy = NormalizationPolicy::default();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)?;
    for _ in 0..options.rows {
        out.write_record(Listing::random(&mut rng).record(options.normalized, &policy))?;
    }
    out.flush()?;
    Ok(())
}
