use std::env;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Connection settings for the client core.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    /// Read settings from the environment, falling back to a local server.
    pub fn from_env() -> Self {
        let base_url = env::var("DATACHAT_SERVER_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { base_url }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}
