// ============================================================================
// Module : config
// ============================================================================
// Configuration lue depuis l'environnement (et un éventuel fichier .env
// chargé par le binaire avant l'appel).
//
//   LAZYFLIP_API_URL              URL du backend     (http://localhost:8080)
//   LAZYFLIP_POLL_SECS            intervalle polling (30)
//   LAZYFLIP_TIMEOUT_SECS         timeout HTTP       (10)
//   LAZYFLIP_NAME_CACHE_CAPACITY  taille du cache    (10000, 0 = non borné)
//   LAZYFLIP_LOG_DIR              répertoire des logs
//
// Une valeur invalide n'est jamais fatale : on log un warning et on garde
// la valeur par défaut.
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_POLL_SECS: u64 = 30;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_NAME_CACHE_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// None = cache non borné
    pub name_cache_capacity: Option<usize>,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            name_cache_capacity: Some(DEFAULT_NAME_CACHE_CAPACITY),
            log_dir: default_log_dir(),
        }
    }
}

/// Répertoire de logs par défaut : ~/.local/share/lazyflip/logs, sinon ./logs
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("lazyflip").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Lecture d'une variable : None si absente ou vide
fn lookup_str<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Entier strictement positif, sinon la valeur par défaut
fn lookup_secs<F>(lookup: &F, name: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup_str(lookup, name) else {
        return default;
    };
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => value,
        _ => {
            warn!(variable = name, value = %raw, default, "Invalid duration, using default");
            default
        }
    }
}

impl Config {
    /// Configuration depuis les variables d'environnement du processus
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Configuration depuis une source quelconque de variables
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup_str(&lookup, "LAZYFLIP_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let poll_interval = Duration::from_secs(lookup_secs(&lookup, "LAZYFLIP_POLL_SECS", DEFAULT_POLL_SECS));
        let request_timeout =
            Duration::from_secs(lookup_secs(&lookup, "LAZYFLIP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS));

        let name_cache_capacity = match lookup_str(&lookup, "LAZYFLIP_NAME_CACHE_CAPACITY") {
            None => defaults.name_cache_capacity,
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => None,
                Ok(capacity) => Some(capacity),
                Err(_) => {
                    warn!(value = %raw, "Invalid name cache capacity, using default");
                    defaults.name_cache_capacity
                }
            },
        };

        let log_dir = lookup_str(&lookup, "LAZYFLIP_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.log_dir);

        Self {
            api_base_url,
            poll_interval,
            request_timeout,
            name_cache_capacity,
            log_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.name_cache_capacity, Some(10_000));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("LAZYFLIP_API_URL", " http://flips.local:9000/ "),
            ("LAZYFLIP_POLL_SECS", "5"),
            ("LAZYFLIP_NAME_CACHE_CAPACITY", "0"),
            ("LAZYFLIP_LOG_DIR", "/tmp/lazyflip"),
        ]);
        assert_eq!(config.api_base_url, "http://flips.local:9000");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.name_cache_capacity, None);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/lazyflip"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("LAZYFLIP_POLL_SECS", "0"),
            ("LAZYFLIP_TIMEOUT_SECS", "abc"),
            ("LAZYFLIP_NAME_CACHE_CAPACITY", "-1"),
            ("LAZYFLIP_API_URL", "   "),
        ]);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.name_cache_capacity, Some(10_000));
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
    }
}
