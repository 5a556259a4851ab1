use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "bursar.toml";

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Database file used when none is given on the command line.
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Grade range used when generating synthetic history.
    #[serde(default = "default_min_grade")]
    pub min_grade: f64,
    #[serde(default = "default_max_grade")]
    pub max_grade: f64,
}

fn default_database() -> PathBuf {
    PathBuf::from("students.txt")
}

fn default_min_grade() -> f64 {
    5.0
}

fn default_max_grade() -> f64 {
    10.0
}

impl Default for StoreConfig {
    fn default() -> StoreConfig {
        StoreConfig {
            database: default_database(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> HistoryConfig {
        HistoryConfig {
            min_grade: default_min_grade(),
            max_grade: default_max_grade(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("cannot load configuration file {}", path.display()))?;
        toml::from_str(&text)
            .wrap_err_with(|| format!("cannot parse configuration file {}", path.display()))
    }

    /// An explicit path must exist; the default file is optional.
    pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => Config::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Config::load(default)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }
}
