// Runtime settings, read once from the environment.
//
// Every value has a default so the binary runs with no configuration at all;
// values that fail to parse fall back to the default as well.
use crate::util::{parse_i32_safe, parse_usize_safe};
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_DATA_PATH: &str = "data/processed/folha-pagamento-2025.csv";
pub const DEFAULT_REFERENCE_YEAR: i32 = 2025;
pub const DEFAULT_TOP_N: usize = 10;

pub static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    pub reference_year: i32,
    pub top_n: usize,
    pub log_level: Level,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            output_dir: PathBuf::from("."),
            reference_year: DEFAULT_REFERENCE_YEAR,
            top_n: DEFAULT_TOP_N,
            log_level: Level::INFO,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; `from_env` passes `std::env`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        Self {
            data_path: lookup("FOLHA_DATA_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            output_dir: lookup("FOLHA_OUTPUT_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            reference_year: parse_i32_safe(lookup("FOLHA_REFERENCE_YEAR").as_deref())
                .unwrap_or(defaults.reference_year),
            top_n: parse_usize_safe(lookup("FOLHA_TOP_N").as_deref())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.top_n),
            log_level: lookup("FOLHA_LOG_LEVEL")
                .and_then(|s| s.trim().parse::<Level>().ok())
                .unwrap_or(defaults.log_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_overrides_and_fallbacks() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("FOLHA_DATA_PATH", "/tmp/folha.csv"),
            ("FOLHA_REFERENCE_YEAR", "2024"),
            ("FOLHA_TOP_N", "zero"),
            ("FOLHA_LOG_LEVEL", "debug"),
        ]);
        let settings = Settings::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(settings.data_path, PathBuf::from("/tmp/folha.csv"));
        assert_eq!(settings.reference_year, 2024);
        assert_eq!(settings.top_n, DEFAULT_TOP_N);
        assert_eq!(settings.log_level, Level::DEBUG);
        assert_eq!(settings.output_dir, PathBuf::from("."));
    }
}
