//! Client configuration and provider factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use prephub_core::traits::QuestionProvider;

use crate::auth::{AuthContext, CredentialStore};
use crate::bank::BankProvider;
use crate::http::ApiClient;

/// Top-level prephub configuration.
///
/// Note: Custom Debug impl masks the token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct PrepHubConfig {
    /// Base URL of the exam-prep API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Where login credentials are stored. Defaults to
    /// `~/.config/prephub/credentials.json`.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    /// Bearer token used instead of stored credentials.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    /// Output directory for attempt reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl std::fmt::Debug for PrepHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrepHubConfig")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("credentials_path", &self.credentials_path)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./prephub-results")
}

impl Default for PrepHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_timeout(),
            credentials_path: None,
            token: None,
            output_dir: default_output_dir(),
        }
    }
}

impl PrepHubConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolved credentials file location.
    pub fn credentials_file(&self) -> PathBuf {
        match &self.credentials_path {
            Some(path) => expand_home(path),
            None => config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("credentials.json"),
        }
    }

    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(self.credentials_file())
    }

    /// Auth state for API calls: `token` wins over stored credentials.
    pub fn auth_context(&self) -> AuthContext {
        match &self.token {
            Some(token) if !token.is_empty() => AuthContext::with_token(token),
            _ => AuthContext::init(&self.credential_store()),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var("HOME")) {
        (Ok(rest), Ok(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `prephub.toml` in the current directory
/// 2. `~/.config/prephub/config.toml`
///
/// Environment variable overrides: `PREPHUB_API_URL`, `PREPHUB_TOKEN`.
pub fn load_config() -> Result<PrepHubConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PrepHubConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("prephub.toml");
        if local.exists() {
            Some(local)
        } else {
            config_dir()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<PrepHubConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => PrepHubConfig::default(),
    };

    // Apply env var overrides
    if let Ok(url) = std::env::var("PREPHUB_API_URL") {
        config.api_base_url = url;
    }
    if let Ok(token) = std::env::var("PREPHUB_TOKEN") {
        config.token = Some(token);
    }

    config.api_base_url = resolve_env_vars(&config.api_base_url)
        .trim_end_matches('/')
        .to_string();
    config.token = config
        .token
        .map(|t| resolve_env_vars(&t))
        .filter(|t| !t.is_empty());
    config.credentials_path = config
        .credentials_path
        .map(|p| PathBuf::from(resolve_env_vars(&p.to_string_lossy())));

    Ok(config)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("prephub"))
}

/// Create a question provider: a local bank when `bank` is given, else the API.
pub fn create_provider(
    config: &PrepHubConfig,
    bank: Option<&Path>,
) -> Result<Arc<dyn QuestionProvider>> {
    match bank {
        Some(path) => Ok(Arc::new(BankProvider::from_file(path)?)),
        None => {
            let client = ApiClient::new(&config.api_base_url, config.request_timeout())?
                .with_auth(config.auth_context());
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_PREPHUB_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_PREPHUB_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_PREPHUB_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("no_close_${brace"), "no_close_${brace");
        std::env::remove_var("_PREPHUB_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = PrepHubConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.output_dir, PathBuf::from("./prephub-results"));
        assert!(config.token.is_none());
    }

    #[test]
    fn parse_config_file() {
        let toml_str = r#"
api_base_url = "https://prep.example.com"
request_timeout_secs = 5
credentials_path = "/tmp/prephub-creds.json"
output_dir = "results"
"#;
        let config: PrepHubConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_base_url, "https://prep.example.com");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.credentials_file(),
            PathBuf::from("/tmp/prephub-creds.json")
        );
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prephub.toml");
        std::fs::write(&path, "api_base_url = \"http://127.0.0.1:9000/\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        // Trailing slash is trimmed so endpoint paths join cleanly.
        if std::env::var("PREPHUB_API_URL").is_err() {
            assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        }
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/prephub.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn debug_masks_token() {
        let config = PrepHubConfig {
            token: Some("secret-token".into()),
            ..PrepHubConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn explicit_token_wins_over_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = PrepHubConfig {
            token: Some("env-token".into()),
            credentials_path: Some(dir.path().join("none.json")),
            ..PrepHubConfig::default()
        };
        assert_eq!(config.auth_context().bearer_token(), Some("env-token"));
    }
}
