//! Client configuration.

/// Hosted backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "https://questlog-backend-apoy.onrender.com/api";

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "QUESTLOG_API_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            Some(api_url) => Self { api_url },
            None => Self::default(),
        }
    }
}
