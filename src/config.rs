use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub ollama_base_url: Option<String>,
    pub ollama_model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub max_chunk_size: usize,
    pub min_text_length: usize,
    pub max_upload_mb: usize,
    pub public_rps: u32,
    pub probe_timeout: Duration,
    pub local_timeout: Duration,
    pub cloud_timeout: Duration,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let ollama_base_url = get("OLLAMA_BASE_URL")
            .map(|raw| validate_url("OLLAMA_BASE_URL", &raw))
            .transpose()?;
        let gemini_base_url = validate_url(
            "GEMINI_BASE_URL",
            &get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        )?;

        Ok(Self {
            server_address: get("SERVER_ADDRESS").unwrap_or_else(|| "0.0.0.0:5000".to_string()),
            ollama_base_url,
            ollama_model: get("OLLAMA_MODEL"),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url,
            max_chunk_size: parse_or("MAX_CHUNK_SIZE", get("MAX_CHUNK_SIZE"), 4000)?,
            min_text_length: parse_or("MIN_TEXT_LENGTH", get("MIN_TEXT_LENGTH"), 100)?,
            max_upload_mb: parse_or("MAX_UPLOAD_MB", get("MAX_UPLOAD_MB"), 10)?,
            public_rps: parse_or("PUBLIC_RPS", get("PUBLIC_RPS"), 20)?,
            probe_timeout: Duration::from_millis(parse_or(
                "PROBE_TIMEOUT_MS",
                get("PROBE_TIMEOUT_MS"),
                2000,
            )?),
            local_timeout: Duration::from_secs(parse_or(
                "LOCAL_TIMEOUT_SECS",
                get("LOCAL_TIMEOUT_SECS"),
                120,
            )?),
            cloud_timeout: Duration::from_secs(parse_or(
                "CLOUD_TIMEOUT_SECS",
                get("CLOUD_TIMEOUT_SECS"),
                120,
            )?),
        })
    }

    /// Local backend settings, present only when both URL and model are set.
    pub fn local_backend(&self) -> Option<(&str, &str)> {
        match (&self.ollama_base_url, &self.ollama_model) {
            (Some(url), Some(model)) => Some((url.as_str(), model.as_str())),
            _ => None,
        }
    }

    pub fn has_cloud_credentials(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

fn validate_url(name: &str, raw: &str) -> Result<String> {
    url::Url::parse(raw)
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))?;
    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Option<&'static Config> {
    CONFIG.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_address, "0.0.0.0:5000");
        assert_eq!(config.max_chunk_size, 4000);
        assert_eq!(config.min_text_length, 100);
        assert_eq!(config.probe_timeout, Duration::from_secs(2));
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert!(config.local_backend().is_none());
        assert!(!config.has_cloud_credentials());
    }

    #[test]
    fn local_backend_needs_both_url_and_model() {
        let only_url = config_from(&[("OLLAMA_BASE_URL", "http://localhost:11434")]).unwrap();
        assert!(only_url.local_backend().is_none());

        let both = config_from(&[
            ("OLLAMA_BASE_URL", "http://localhost:11434/"),
            ("OLLAMA_MODEL", "llama3.2"),
        ])
        .unwrap();
        assert_eq!(
            both.local_backend(),
            Some(("http://localhost:11434", "llama3.2"))
        );
    }

    #[test]
    fn blank_api_key_is_not_a_credential() {
        let config = config_from(&[("GEMINI_API_KEY", "   ")]).unwrap();
        assert!(!config.has_cloud_credentials());
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(
            config_from(&[("MAX_CHUNK_SIZE", "lots")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config_from(&[("OLLAMA_BASE_URL", "not a url")]),
            Err(Error::Config(_))
        ));
    }
}
