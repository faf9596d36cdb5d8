use std::{net::SocketAddr, str::FromStr, time::Duration};

use url::Url;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_INSTAGRAM_BASE_URL: &str = "https://www.instagram.com";
const DEFAULT_INSTAGRAM_DOC_ID: &str = "8845758582119845";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "https://allvideodownloader.tech",
    "https://videodow01.netlify.app",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            key,
            reason: reason.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub instagram: InstagramConfig,
    pub session: SessionConfig,
    pub proxy: ProxyConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub allowed_origins: Vec<String>,
    pub error_detail: ErrorDetailMode,
}

#[derive(Clone, Debug)]
pub struct InstagramConfig {
    pub base_url: Url,
    pub doc_id: String,
    pub connection_policy: ConnectionPolicy,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

/// Credentials and transport settings for the process-wide Instagram session.
///
/// The password is only used when a username is present and no session file
/// could be found.
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub session_file: Option<String>,
    pub proxy: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ProxyConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

/// What to do when Instagram refuses the connection or throttles us.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionPolicy {
    /// Report 429 to the caller straight away.
    #[default]
    Surface,
    /// Try once more with a fresh anonymous session, then give up with 500.
    RetryAnonymous,
}

impl FromStr for ConnectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "surface" => Ok(Self::Surface),
            "retry_anonymous" | "retry" => Ok(Self::RetryAnonymous),
            other => Err(format!("unknown connection policy '{}'", other)),
        }
    }
}

/// How much of an unexpected upstream failure is shown to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorDetailMode {
    #[default]
    Hardened,
    Permissive,
}

impl FromStr for ErrorDetailMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hardened" => Ok(Self::Hardened),
            "permissive" => Ok(Self::Permissive),
            other => Err(format!("unknown error detail mode '{}'", other)),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        build_config(|key| std::env::var(key).ok())
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self, ConfigError> {
        let map: std::collections::HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        build_config(|key| map.get(key).cloned())
    }
}

fn parse_or<T>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match value {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::invalid(key, e)),
        None => Ok(default),
    }
}

pub fn build_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    info!("Building AppConfig...");

    // Blank variables behave as if they were not set at all.
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = parse_or::<u16>(get("PORT"), "PORT", DEFAULT_PORT)?;
    let addr = format!("{}:{}", host, port)
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::invalid("HOST", e))?;

    let allowed_origins = match get("ALLOWED_ORIGINS") {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        None => DEFAULT_ALLOWED_ORIGINS.iter().map(ToString::to_string).collect(),
    };

    let error_detail = parse_or(get("ERROR_DETAIL_MODE"), "ERROR_DETAIL_MODE", ErrorDetailMode::default())?;

    let base_url = get("INSTAGRAM_BASE_URL").unwrap_or_else(|| DEFAULT_INSTAGRAM_BASE_URL.to_string());
    let base_url = Url::parse(&base_url).map_err(|e| ConfigError::invalid("INSTAGRAM_BASE_URL", e))?;

    let timeout_secs = parse_or::<u64>(
        get("UPSTREAM_TIMEOUT_SECS"),
        "UPSTREAM_TIMEOUT_SECS",
        DEFAULT_UPSTREAM_TIMEOUT_SECS,
    )?;
    let connect_timeout_secs = parse_or::<u64>(
        get("UPSTREAM_CONNECT_TIMEOUT_SECS"),
        "UPSTREAM_CONNECT_TIMEOUT_SECS",
        DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS,
    )?;

    let config = AppConfig {
        server: ServerConfig {
            addr,
            allowed_origins,
            error_detail,
        },
        instagram: InstagramConfig {
            base_url,
            doc_id: get("INSTAGRAM_DOC_ID").unwrap_or_else(|| DEFAULT_INSTAGRAM_DOC_ID.to_string()),
            connection_policy: parse_or(
                get("IG_CONNECTION_POLICY"),
                "IG_CONNECTION_POLICY",
                ConnectionPolicy::default(),
            )?,
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        },
        session: SessionConfig {
            username: get("IG_USERNAME"),
            password: get("IG_PASSWORD"),
            session_file: get("IG_SESSION_FILE"),
            proxy: get("IG_PROXY"),
        },
        proxy: ProxyConfig {
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            read_timeout: Duration::from_secs(timeout_secs),
        },
    };
    info!("AppConfig built");

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_pairs(&[]).unwrap();

        assert_eq!(config.server.addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.server.allowed_origins.len(), 4);
        assert_eq!(config.server.error_detail, ErrorDetailMode::Hardened);
        assert_eq!(config.instagram.connection_policy, ConnectionPolicy::Surface);
        assert_eq!(config.instagram.base_url.as_str(), "https://www.instagram.com/");
        assert_eq!(config.instagram.doc_id, DEFAULT_INSTAGRAM_DOC_ID);
        assert!(config.session.username.is_none());
        assert!(config.session.proxy.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_pairs(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9100"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("IG_CONNECTION_POLICY", "retry_anonymous"),
            ("ERROR_DETAIL_MODE", "Permissive"),
            ("IG_USERNAME", "someone"),
            ("IG_SESSION_FILE", "/tmp/session-someone"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
        ])
        .unwrap();

        assert_eq!(config.server.addr, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(
            config.server.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.instagram.connection_policy, ConnectionPolicy::RetryAnonymous);
        assert_eq!(config.server.error_detail, ErrorDetailMode::Permissive);
        assert_eq!(config.session.username.as_deref(), Some("someone"));
        assert_eq!(config.session.session_file.as_deref(), Some("/tmp/session-someone"));
        assert_eq!(config.instagram.timeout, Duration::from_secs(5));
        assert_eq!(config.proxy.read_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = AppConfig::from_pairs(&[("IG_USERNAME", "  "), ("IG_PROXY", "")]).unwrap();

        assert!(config.session.username.is_none());
        assert!(config.session.proxy.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(AppConfig::from_pairs(&[("PORT", "eighty")]).is_err());
        assert!(AppConfig::from_pairs(&[("IG_CONNECTION_POLICY", "sometimes")]).is_err());
        assert!(AppConfig::from_pairs(&[("INSTAGRAM_BASE_URL", "not a url")]).is_err());
    }
}
