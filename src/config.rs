use crate::error::{Result, StudioError};
use std::env;
use std::time::Duration;

pub const DEFAULT_API_KEY_VAR: &str = "API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Where the API key comes from. Resolved on every call, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Env(String),
    Static(Option<String>),
}

impl Default for Credential {
    fn default() -> Self {
        Credential::Env(DEFAULT_API_KEY_VAR.to_string())
    }
}

impl Credential {
    pub fn resolve(&self) -> Result<String> {
        let key = match self {
            Credential::Env(var) => env::var(var).ok(),
            Credential::Static(key) => key.clone(),
        };

        match key {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(StudioError::Config(match self {
                Credential::Env(var) => format!("environment variable {} is not set", var),
                Credential::Static(_) => "no API key was provided".to_string(),
            })),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub credential: Credential,
    pub base_url: String,
    pub image_model: String,
    pub text_model: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            credential: Credential::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let credential = env::var("PRODSHOT_API_KEY_VAR")
            .ok()
            .filter(|var| !var.is_empty())
            .map(Credential::Env)
            .unwrap_or(defaults.credential);
        let base_url = env::var("PRODSHOT_BASE_URL").unwrap_or(defaults.base_url);
        let image_model = env::var("PRODSHOT_IMAGE_MODEL").unwrap_or(defaults.image_model);
        let text_model = env::var("PRODSHOT_TEXT_MODEL").unwrap_or(defaults.text_model);
        let timeout = env::var("PRODSHOT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let max_retries = env::var("PRODSHOT_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_retries);

        GeminiConfig {
            credential,
            base_url,
            image_model,
            text_model,
            timeout,
            max_retries,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.credential = Credential::Static(Some(api_key.into()));
        self
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models(
        mut self,
        image_model: impl Into<String>,
        text_model: impl Into<String>,
    ) -> Self {
        self.image_model = image_model.into();
        self.text_model = text_model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Controls where remote source images may be fetched from.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub allowed_hosts: Vec<String>,
    pub relay_url: Option<String>,
    pub max_bytes: u64,
    pub timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        FetchPolicy {
            allowed_hosts: Vec::new(),
            relay_url: None,
            max_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
            timeout: Duration::from_secs(30),
        }
    }
}

impl FetchPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let allowed_hosts = env::var("PRODSHOT_ALLOWED_HOSTS")
            .map(|hosts| parse_host_list(&hosts))
            .unwrap_or_default();
        let relay_url = env::var("PRODSHOT_FETCH_RELAY")
            .ok()
            .filter(|s| !s.is_empty());

        FetchPolicy {
            allowed_hosts,
            relay_url,
            ..Default::default()
        }
    }

    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.push(host.into().to_ascii_lowercase());
        self
    }

    pub fn with_relay(mut self, relay_url: impl Into<String>) -> Self {
        self.relay_url = Some(relay_url.into());
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Exact match, or a subdomain of an allow-listed host.
    pub fn is_allowed(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.allowed_hosts
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
    }
}

fn parse_host_list(hosts: &str) -> Vec<String> {
    hosts
        .split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub fetch: FetchPolicy,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            gemini: GeminiConfig::from_env(),
            fetch: FetchPolicy::from_env(),
        }
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.fetch = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_credential() {
        assert_eq!(
            Credential::Static(Some("k".into())).resolve().unwrap(),
            "k"
        );
        assert!(matches!(
            Credential::Static(None).resolve(),
            Err(StudioError::Config(_))
        ));
        assert!(matches!(
            Credential::Static(Some("  ".into())).resolve(),
            Err(StudioError::Config(_))
        ));
    }

    #[test]
    fn test_env_credential_missing() {
        let cred = Credential::Env("PRODSHOT_TEST_SURELY_UNSET_KEY".into());
        let err = cred.resolve().unwrap_err();
        assert!(err.to_string().contains("PRODSHOT_TEST_SURELY_UNSET_KEY"));
    }

    #[test]
    fn test_gemini_defaults() {
        let config = GeminiConfig::new();
        assert_eq!(config.image_model, "gemini-2.5-flash-image");
        assert_eq!(config.text_model, "gemini-2.5-flash");
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.credential, Credential::Env("API_KEY".into()));
    }

    #[test]
    fn test_fetch_policy_hosts() {
        let policy = FetchPolicy::new().allow_host("Images.Example.com");
        assert!(policy.is_allowed("images.example.com"));
        assert!(policy.is_allowed("cdn.images.example.com"));
        assert!(!policy.is_allowed("evilimages.example.com.attacker.net"));
        assert!(!policy.is_allowed("example.com"));
        assert!(!FetchPolicy::new().is_allowed("anything.com"));
    }

    #[test]
    fn test_parse_host_list() {
        assert_eq!(
            parse_host_list(" a.com, ,B.org "),
            vec!["a.com".to_string(), "b.org".to_string()]
        );
    }
}
