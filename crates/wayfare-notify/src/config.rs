use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// What to do when a pushed notification has an id the store already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Replace the known entry in place; the badge is left alone.
    #[default]
    Upsert,
    /// Always append a new row and bump the badge.
    Append,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upsert" => Ok(Self::Upsert),
            "append" => Ok(Self::Append),
            _ => Err(ConfigError::InvalidPolicy {
                key: "WAYFARE_DUPLICATE_POLICY",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// REST base, e.g. `http://localhost:8000`. No trailing slash.
    pub api_base: String,
    /// WebSocket base, e.g. `ws://localhost:8000`. No trailing slash.
    pub ws_base: String,
    /// Bearer token to start with, if any.
    pub access_token: Option<String>,
    pub request_timeout: Duration,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            ws_base: "ws://localhost:8000".to_string(),
            access_token: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl Config {
    /// Read `WAYFARE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base = var("WAYFARE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into());
        let api_base = api_base.trim().trim_end_matches('/').to_string();
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(ConfigError::InvalidBase {
                key: "WAYFARE_API_BASE",
                value: api_base,
            });
        }

        let ws_base = match var("WAYFARE_WS_BASE") {
            Some(v) => {
                let v = v.trim().trim_end_matches('/').to_string();
                if !(v.starts_with("ws://") || v.starts_with("wss://")) {
                    return Err(ConfigError::InvalidBase {
                        key: "WAYFARE_WS_BASE",
                        value: v,
                    });
                }
                v
            }
            None => ws_base_for(&api_base),
        };

        let request_timeout = match var("WAYFARE_REQUEST_TIMEOUT_SECS") {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        key: "WAYFARE_REQUEST_TIMEOUT_SECS",
                        value: v,
                    });
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let duplicate_policy = match var("WAYFARE_DUPLICATE_POLICY") {
            Some(v) => v.parse()?,
            None => DuplicatePolicy::default(),
        };

        Ok(Self {
            api_base,
            ws_base,
            access_token: var("WAYFARE_ACCESS_TOKEN").map(|t| t.trim().to_string()),
            request_timeout,
            duplicate_policy,
        })
    }
}

/// `http://host` -> `ws://host`, `https://host` -> `wss://host`.
pub fn ws_base_for(api_base: &str) -> String {
    if let Some(rest) = api_base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_base.to_string()
    }
}
