use anyhow::Result;
use std::env;

/// Runtime configuration, environment-driven like the rest of the stack.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub api_base_url: String,          // http://localhost:8000
    pub poll_interval_seconds: u64,    // 3
    pub request_timeout_seconds: u64,  // 30
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            api_base_url: env::var("CREW_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            poll_interval_seconds: env::var("CREW_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            request_timeout_seconds: env::var("CREW_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
        };

        if config.poll_interval_seconds == 0 {
            anyhow::bail!("CREW_POLL_INTERVAL_SECS must be at least 1");
        }
        if config.api_base_url.trim().is_empty() {
            anyhow::bail!("CREW_API_URL must not be empty");
        }

        Ok(config)
    }
}
