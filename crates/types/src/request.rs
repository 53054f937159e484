use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Credential values for an API, owned by the caller's auth storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSecret {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl AuthSecret {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            api_key: None,
        }
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            token: None,
            api_key: Some(key.into()),
        }
    }
}

/// The request parts produced for one submission: endpoint with path and
/// query resolved, JSON body object and header map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAssembly {
    pub final_endpoint: String,
    #[serde(default)]
    pub body: Map<String, Value>,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

impl RequestAssembly {
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}

/// Environment variable toggling the CORS relay.
pub const USE_PROXY_ENV: &str = "RESTBENCH_USE_PROXY";
/// Environment variable overriding the relay endpoint.
pub const PROXY_URL_ENV: &str = "RESTBENCH_PROXY_URL";
/// Environment variable overriding the request timeout in milliseconds.
pub const TIMEOUT_MS_ENV: &str = "RESTBENCH_TIMEOUT_MS";

pub const DEFAULT_ACCEPT: &str = "*/*";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_PROXY_URL: &str = "http://localhost:8080/api/proxy";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport options for dispatching a [`RequestAssembly`].
///
/// Defaults:
/// - `use_proxy`: `true` (requests go through the CORS relay at `proxy_url`)
/// - `proxy_url`: [`DEFAULT_PROXY_URL`]
/// - `accept`: `*/*`
/// - `content_type`: `application/json`, sent only with a non-empty body
/// - `timeout`: 30 seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub use_proxy: bool,
    pub proxy_url: String,
    pub accept: String,
    pub content_type: String,
    pub timeout: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            use_proxy: true,
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RequestConfig {
    /// Defaults overridden by `RESTBENCH_*` environment variables. Values that
    /// fail to parse keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(USE_PROXY_ENV) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "no" | "off" => config.use_proxy = false,
                "1" | "true" | "yes" | "on" => config.use_proxy = true,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var(PROXY_URL_ENV)
            && !url.trim().is_empty()
        {
            config.proxy_url = url.trim().to_string();
        }
        if let Ok(raw) = std::env::var(TIMEOUT_MS_ENV)
            && let Ok(millis) = raw.trim().parse::<u64>()
        {
            config.timeout = Duration::from_millis(millis);
        }
        config
    }

    pub fn with_proxy(mut self, use_proxy: bool) -> Self {
        self.use_proxy = use_proxy;
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_route_through_proxy_and_accept_anything() {
        let config = RequestConfig::default();
        assert!(config.use_proxy);
        assert_eq!(config.accept, "*/*");
        assert_eq!(config.content_type, "application/json");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn from_env_applies_overrides() {
        temp_env::with_vars(
            [
                (USE_PROXY_ENV, Some("false")),
                (PROXY_URL_ENV, Some("http://relay.local/api/proxy")),
                (TIMEOUT_MS_ENV, Some("1500")),
            ],
            || {
                let config = RequestConfig::from_env();
                assert!(!config.use_proxy);
                assert_eq!(config.proxy_url, "http://relay.local/api/proxy");
                assert_eq!(config.timeout, Duration::from_millis(1500));
            },
        );
    }

    #[test]
    fn from_env_ignores_unparseable_values() {
        temp_env::with_vars([(USE_PROXY_ENV, Some("maybe")), (TIMEOUT_MS_ENV, Some("soon"))], || {
            let config = RequestConfig::from_env();
            assert!(config.use_proxy);
            assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        });
    }
}
