use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;
/// One year.
pub const MAX_RESULT_TTL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Optional overrides read from the YAML config file. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub upload_dir: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: Option<usize>,
    pub max_dimensions: Option<[u32; 2]>,
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub result_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub max_dimensions: (u32, u32),
    pub model: String,
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub session_secret: Option<String>,
    pub request_timeout_secs: u64,
    pub result_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            upload_dir: env::temp_dir().join("deepfake-uploads"),
            static_dir: PathBuf::from("static"),
            max_upload_bytes: MAX_CONTENT_LENGTH,
            max_dimensions: (1024, 1024),
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            api_key: None,
            session_secret: None,
            request_timeout_secs: 60,
            result_ttl_secs: 3600,
        }
    }
}

impl AppConfig {
    /// Defaults, then the YAML file at `CONFIG_PATH` (if present), then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::default();
        if Path::new(&config_path).exists() {
            log::info!("Loading configuration from {}", config_path);
            config.apply_file(Self::read_file(&config_path)?);
        }
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn read_file(path: &str) -> Result<FileConfig, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&config_str)?)
    }

    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(dir) = file.upload_dir {
            self.upload_dir = dir;
        }
        if let Some(dir) = file.static_dir {
            self.static_dir = dir;
        }
        if let Some(bytes) = file.max_upload_bytes {
            self.max_upload_bytes = bytes;
        }
        if let Some([width, height]) = file.max_dimensions {
            self.max_dimensions = (width, height);
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(base) = file.api_base_url {
            self.api_base_url = base;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = file.result_ttl_secs {
            self.result_ttl_secs = secs;
        }
    }

    /// `lookup` is `env::var` in production; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = non_empty("PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(dir) = non_empty("UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty("STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        if let Some(model) = non_empty("GEMINI_MODEL") {
            self.model = model;
        }
        if let Some(base) = non_empty("GEMINI_API_BASE") {
            self.api_base_url = base;
        }
        if let Some(ttl) = non_empty("RESULT_TTL_SECS") {
            self.result_ttl_secs = ttl.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RESULT_TTL_SECS",
                value: ttl.clone(),
            })?;
        }
        // Also catches an out-of-range value that came from the YAML file.
        if self.result_ttl_secs > MAX_RESULT_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                key: "RESULT_TTL_SECS",
                value: self.result_ttl_secs.to_string(),
            });
        }

        // GEMINI_API_KEY wins over GOOGLE_API_KEY.
        self.api_key = non_empty("GEMINI_API_KEY").or_else(|| non_empty("GOOGLE_API_KEY"));
        self.session_secret = non_empty("SESSION_SECRET");
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// Shows the first and last four characters of a key.
pub fn redact_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn gemini_key_takes_precedence_over_google_key() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup_from(&[
                ("GEMINI_API_KEY", "gemini-key"),
                ("GOOGLE_API_KEY", "google-key"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("gemini-key"));
    }

    #[test]
    fn google_key_used_when_gemini_key_blank() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup_from(&[("GEMINI_API_KEY", "  "), ("GOOGLE_API_KEY", "google-key")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("google-key"));
        assert!(config.session_secret.is_none());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
    }

    #[test]
    fn result_ttl_must_fit_a_year() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup_from(&[("RESULT_TTL_SECS", "86400")]))
            .unwrap();
        assert_eq!(config.result_ttl_secs, 86400);

        for value in ["18446744073709551615", "9223372036854775808", "31536001"] {
            let mut config = AppConfig::default();
            let err = config
                .apply_env(lookup_from(&[("RESULT_TTL_SECS", value)]))
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { key: "RESULT_TTL_SECS", .. }),
                "{} should be rejected",
                value
            );
        }

        let mut config = AppConfig::default();
        config.apply_file(serde_yaml::from_str("result_ttl_secs: 99999999999").unwrap());
        assert!(config.apply_env(lookup_from(&[])).is_err());
    }

    #[test]
    fn yaml_overrides_only_listed_keys() {
        let file: FileConfig =
            serde_yaml::from_str("model: gemini-2.0-flash\nmax_dimensions: [512, 768]\n").unwrap();
        let mut config = AppConfig::default();
        config.apply_file(file);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_dimensions, (512, 768));
        assert_eq!(config.port, 8081);
        assert_eq!(config.max_upload_bytes, MAX_CONTENT_LENGTH);
    }

    #[test]
    fn redacts_middle_of_key() {
        assert_eq!(redact_key("AIzaSyExampleKey1234"), "AIza...1234");
        assert_eq!(redact_key("short"), "*****");
    }
}
