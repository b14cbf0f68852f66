//! API keys for generative providers.
//!
//! A key is resolved once, when the provider is built, and held in a
//! `secrecy::SecretString`. `Debug` and `Display` never print it; the raw
//! value is only reachable through [`ApiCredential::expose`].

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Config,
    Env,
}

impl Origin {
    fn as_str(&self) -> &'static str {
        match self {
            Origin::Config => "config",
            Origin::Env => "env",
        }
    }
}

/// An API key that stays out of logs and reports.
pub struct ApiCredential {
    secret: SecretString,
    label: &'static str,
    origin: Origin,
}

impl ApiCredential {
    /// Read `config[key]`, then the `env_var` environment variable.
    ///
    /// A key in the configuration wins over the environment.
    pub fn from_config_or_env(
        config: &JsonValue,
        key: &str,
        env_var: &str,
        label: &'static str,
    ) -> Result<Self, ProviderError> {
        let (value, origin) = match config[key].as_str() {
            Some(value) => (value.to_string(), Origin::Config),
            None => match std::env::var(env_var) {
                Ok(value) => (value, Origin::Env),
                Err(_) => {
                    return Err(ProviderError::NotConfigured(format!(
                        "{label} required: set '{key}' in config or the {env_var} environment variable"
                    )))
                }
            },
        };

        Ok(Self {
            secret: SecretString::from(value),
            label,
            origin,
        })
    }

    /// Whether [`from_config_or_env`](Self::from_config_or_env) would find a key.
    pub fn is_available(config: &JsonValue, key: &str, env_var: &str) -> bool {
        config[key].is_string() || std::env::var_os(env_var).is_some()
    }

    /// The raw key, for building the request header only.
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("label", &self.label)
            .field("origin", &self.origin.as_str())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [REDACTED]", self.label, self.origin.as_str())
    }
}
