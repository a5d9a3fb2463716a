use crate::models::{StatusList, StatusListError};
use std::{env, fmt};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATUSES: &str = "practice,round,caddy";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub remote_url: String,
    pub statuses: StatusList,
    pub multi_select: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingRemoteUrl,
    InvalidRemoteUrl(String),
    InvalidPort(String),
    InvalidFlag(String),
    Statuses(StatusListError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRemoteUrl => write!(f, "TRACKER_REMOTE_URL must be set"),
            Self::InvalidRemoteUrl(url) => write!(f, "TRACKER_REMOTE_URL {url:?} is not an http(s) URL"),
            Self::InvalidPort(port) => write!(f, "PORT {port:?} is not a valid port"),
            Self::InvalidFlag(flag) => write!(f, "TRACKER_MULTI_SELECT {flag:?} is not true or false"),
            Self::Statuses(err) => write!(f, "TRACKER_STATUSES: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let remote_url = lookup("TRACKER_REMOTE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingRemoteUrl)?;
        if !(remote_url.starts_with("http://") || remote_url.starts_with("https://")) {
            return Err(ConfigError::InvalidRemoteUrl(remote_url));
        }

        let statuses_raw = lookup("TRACKER_STATUSES").unwrap_or_else(|| DEFAULT_STATUSES.to_string());
        let statuses = StatusList::new(
            statuses_raw
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty()),
        )
        .map_err(ConfigError::Statuses)?;

        let multi_select = match lookup("TRACKER_MULTI_SELECT") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::InvalidFlag(raw)),
            },
            None => true,
        };

        Ok(Self {
            port,
            remote_url,
            statuses,
            multi_select,
        })
    }
}
