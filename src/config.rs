//! TOML settings stored in the `.pricefit` app directory.

mod io;
mod types;

pub use io::{CONFIG_FILE_NAME, config_path, load_from, load_or_default, save_to_path};
pub use types::{AppSettings, ConfigError};
