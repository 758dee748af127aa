use std::any::Any;
use std::time::Duration;

use examscan_states::{State, state_assign_impl};
use serde::Deserialize;
use ustr::Ustr;

const PROD_BASE_URL: &str = "https://ai-evaluator.srv1240507.hstgr.cloud";
const TEST_BASE_URL: &str = "https://ai-evaluator-test.srv1240507.hstgr.cloud";
const NIGHTLY_BASE_URL: &str = "https://ai-evaluator-nightly.srv1240507.hstgr.cloud";

/// Backend calls give up after this long unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Prefix of every environment variable read by [`BusinessConfig::from_env`].
pub const ENV_PREFIX: &str = "EXAMSCAN_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid examscan environment configuration: {0}")]
    Env(#[from] serde_env::Error),
    #[error("EXAMSCAN_REQUEST_TIMEOUT_SECS must be greater than zero")]
    ZeroTimeout,
}

#[derive(Debug, Clone)]
pub struct BusinessConfig {
    pub api_base_url: String,
    /// Upper bound for backend API calls. Object-store transfers are not bounded.
    pub request_timeout: Duration,
}

// Environment variables with the `EXAMSCAN_` prefix stripped and lowercased.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl BusinessConfig {
    pub fn new(base_url: String) -> Self {
        Self {
            api_base_url: base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Build from `EXAMSCAN_API_BASE_URL` / `EXAMSCAN_REQUEST_TIMEOUT_SECS`,
    /// falling back to the build-time defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, ConfigError> {
        let scoped: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|rest| (rest.to_owned(), value))
            })
            .collect();
        let raw: RawConfig = serde_env::from_iter(scoped)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = raw.api_base_url.filter(|url| !url.trim().is_empty()) {
            log::info!("Using API base URL from environment: {url}");
            config.api_base_url = url.trim_end_matches('/').to_owned();
        }
        match raw.request_timeout_secs {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => config.request_timeout = Duration::from_secs(secs),
            None => {}
        }
        Ok(config)
    }

    pub fn api_url(&self) -> Ustr {
        Ustr::from(&format!("{}/api", self.api_base_url))
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            api_base_url: if cfg!(feature = "env_test") {
                TEST_BASE_URL.to_owned()
            } else if cfg!(feature = "env_nightly") {
                NIGHTLY_BASE_URL.to_owned()
            } else {
                PROD_BASE_URL.to_owned()
            },
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl State for BusinessConfig {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}
