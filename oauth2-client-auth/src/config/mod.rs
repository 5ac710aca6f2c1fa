//! Client credentials configuration

use crate::error::{AuthError, MissingField};
use confique::Config as _;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub mod tls;

pub use tls::TlsClientSettings;

/// How the client id and secret are presented to the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStyle {
    /// Try HTTP Basic first and fall back to form parameters.
    #[default]
    Auto,
    /// HTTP Basic authorization header.
    Header,
    /// `client_id` and `client_secret` form parameters.
    Params,
}

/// OAuth2 client credentials configuration
#[derive(confique::Config, Clone, Default)]
pub struct Config {
    /// Client identifier issued by the authorization server
    #[config(env = "OAUTH2_CLIENT_ID", default = "")]
    pub client_id: String,

    /// Client secret issued by the authorization server
    #[config(env = "OAUTH2_CLIENT_SECRET", default = "")]
    pub client_secret: String,

    /// Absolute URL of the token endpoint
    #[config(env = "OAUTH2_CLIENT_TOKEN_URL", default = "")]
    pub token_url: String,

    /// Scopes requested with every token (comma-separated in the environment)
    #[config(
        env = "OAUTH2_CLIENT_SCOPES",
        parse_env = confique::env::parse::list_by_comma,
        default = []
    )]
    pub scopes: Vec<String>,

    /// Additional `key=value` form parameters sent to the token endpoint
    #[config(
        env = "OAUTH2_CLIENT_ENDPOINT_PARAMS",
        parse_env = confique::env::parse::list_by_comma,
        default = []
    )]
    pub endpoint_params: Vec<String>,

    /// Client authentication style: auto, header or params (default: auto)
    #[config(env = "OAUTH2_CLIENT_AUTH_STYLE", default = "auto")]
    pub auth_style: AuthStyle,

    /// Token endpoint request timeout in seconds, 0 disables it (default: 0)
    #[config(env = "OAUTH2_CLIENT_TIMEOUT", default = 0)]
    pub timeout: u64,

    /// TLS settings for the token endpoint connection
    #[config(nested)]
    pub tls: TlsClientSettings,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .field("endpoint_params", &self.endpoint_params)
            .field("auth_style", &self.auth_style)
            .field("timeout", &self.timeout)
            .field("tls", &self.tls)
            .finish()
    }
}

impl Config {
    /// Creates a new Config instance from environment variables
    pub fn from_env() -> Result<Self, confique::Error> {
        Self::builder().env().load()
    }

    /// Loads a TOML file, with environment variables taking precedence
    pub fn load(path: impl AsRef<Path>) -> Result<Self, confique::Error> {
        Self::builder().env().file(path.as_ref()).load()
    }

    /// Checks that the client id, client secret and token URL are all present
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.client_id.is_empty() {
            return Err(AuthError::MissingField(MissingField::ClientId));
        }
        if self.client_secret.is_empty() {
            return Err(AuthError::MissingField(MissingField::ClientSecret));
        }
        if self.token_url.is_empty() {
            return Err(AuthError::MissingField(MissingField::TokenUrl));
        }
        Ok(())
    }

    /// Get the token endpoint timeout, if one is configured
    pub fn timeout_duration(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    /// Get endpoint params as key/value pairs
    ///
    /// Entries without `=` are sent with an empty value.
    pub fn endpoint_param_pairs(&self) -> Vec<(String, String)> {
        self.endpoint_params
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
                None => (entry.to_string(), String::new()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> Config {
        Config {
            client_id: "id1".to_string(),
            client_secret: "sec1".to_string(),
            token_url: "https://auth.example/token".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_client_id() {
        let config = Config {
            client_id: "".to_string(),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(AuthError::MissingField(MissingField::ClientId))
        ));
    }

    #[test]
    fn test_validate_missing_client_secret() {
        let config = Config {
            client_secret: "".to_string(),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(AuthError::MissingField(MissingField::ClientSecret))
        ));
    }

    #[test]
    fn test_validate_missing_token_url() {
        let config = Config {
            token_url: "".to_string(),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(AuthError::MissingField(MissingField::TokenUrl))
        ));
    }

    #[test]
    fn test_validate_reports_client_id_first() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(AuthError::MissingField(MissingField::ClientId))
        ));
    }

    #[test]
    fn test_timeout_duration() {
        let mut config = valid_config();
        assert_eq!(config.timeout_duration(), None);
        config.timeout = 5;
        assert_eq!(config.timeout_duration(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_endpoint_param_pairs() {
        let config = Config {
            endpoint_params: vec![
                "audience=https://api.example".to_string(),
                " resource = orders ".to_string(),
                "flag".to_string(),
                "".to_string(),
            ],
            ..valid_config()
        };
        assert_eq!(
            config.endpoint_param_pairs(),
            vec![
                ("audience".to_string(), "https://api.example".to_string()),
                ("resource".to_string(), "orders".to_string()),
                ("flag".to_string(), "".to_string()),
            ]
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", valid_config());
        assert!(rendered.contains("id1"));
        assert!(!rendered.contains("sec1"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("Failed to create temp file");
        writeln!(
            file,
            r#"
client_id = "file-client"
client_secret = "file-secret"
token_url = "https://auth.example/token"
scopes = ["read", "write"]
auth_style = "params"
timeout = 5

[tls]
insecure_skip_verify = true
"#
        )
        .expect("Failed to write config");

        let config = Config::load(file.path()).expect("Failed to load config");
        assert_eq!(config.client_id, "file-client");
        assert_eq!(config.client_secret, "file-secret");
        assert_eq!(config.scopes, vec!["read", "write"]);
        assert_eq!(config.auth_style, AuthStyle::Params);
        assert_eq!(config.timeout_duration(), Some(Duration::from_secs(5)));
        assert!(config.tls.insecure_skip_verify);
        assert!(config.validate().is_ok());
    }
}
