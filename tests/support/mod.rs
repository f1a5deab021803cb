#![allow(dead_code)]

pub mod pricefit_env;

use std::path::{Path, PathBuf};

use pricefit::synthetic::{SynthOptions, write_listings};

/// Write `rows` synthetic listings to `dir/name` and return the path.
pub fn write_listings_csv(dir: &Path, name: &str, rows: usize) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    write_listings(
        file,
        &SynthOptions {
            rows,
            seed: 11,
            normalized: false,
        },
    )
    .unwrap();
    path
}
