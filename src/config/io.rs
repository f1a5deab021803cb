use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{AppSettings, ConfigError};
use crate::app_dirs;

/// Default filename used to store the app configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load `config.toml` from the app directory, returning defaults if missing.
pub fn load_or_default() -> Result<AppSettings, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(AppSettings::default());
    }
    load_from(&path)
}

/// Load an explicit config file. A missing file is an error.
pub fn load_from(path: &Path) -> Result<AppSettings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: AppSettings = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = settings.normalized();
    settings
        .validate()
        .map_err(|message| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        })?;
    debug!("Loaded config from {}", path.display());
    Ok(settings)
}

/// Save settings to `path`, creating parent directories as needed.
pub fn save_to_path(settings: &AppSettings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, data.as_bytes())
}

/// Write through a sibling temp file so a crash never leaves a partial config.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let file_name = path.file_name().ok_or_else(|| ConfigError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other("config path has no file name"),
    })?;
    let suffix: u32 = rand::random();
    let tmp_path = path.with_file_name(format!(
        "{}.tmp-{suffix:08x}",
        file_name.to_string_lossy()
    ));
    let write = || -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp_path, path)
    };
    write().map_err(|source| {
        let _ = std::fs::remove_file(&tmp_path);
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyLocale;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[training]\nepochs = 5\nbatch_size = 0\n\n[fields]\nsize = [\" Area \", \"tamanho\"]\n\n[currency]\nlocale = \"en-US\"\n",
        )
        .unwrap();
        let settings = load_from(&path).unwrap();
        assert_eq!(settings.training.epochs, 5);
        assert_eq!(settings.training.batch_size, 1);
        assert_eq!(settings.training.learning_rate, 0.1);
        assert_eq!(settings.fields.size, ["area", "tamanho"]);
        assert_eq!(settings.fields.price, ["preco"]);
        assert_eq!(settings.normalization.price_max, 2_000_000.0);
        assert_eq!(settings.currency.locale, CurrencyLocale::EnUs);
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut settings = AppSettings::default();
        settings.normalization.size_max = 500.0;
        settings.training.seed = 7;
        settings.charts.width = 1024;
        save_to_path(&settings, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), settings);
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[normalization]\nsize_max = 0.0\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Invalid { .. })));
        std::fs::write(&path, "[fields]\nprice = [\"  \"]\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Invalid { .. })));
        std::fs::write(&path, "[training\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::ParseToml { .. })));
        assert!(matches!(
            load_from(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
