use crate::application_impl::{DEFAULT_EXPIRY_MARGIN_SECS, DEFAULT_REQUEST_TIMEOUT, EndpointProfile};
use crate::gate::{DEFAULT_LOGIN_PATH, DEFAULT_POLL_INTERVAL};
use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub log: Log,
    pub session: Session,
    pub store: Store,
    pub api: Api,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

/// One front-end's view of the shared identity broker.
#[derive(Debug, Deserialize)]
pub struct Session {
    pub auth_base_url: String,
    /// Appended to every storage key, "" for system 1 and "2" for system 2.
    #[serde(default)]
    pub key_suffix: String,
    #[serde(default)]
    pub profile: EndpointProfile,
    #[serde(default = "default_expiry_margin_secs")]
    pub expiry_margin_secs: i64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "file" or "memory"
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Api {
    pub base_url: String,
}

fn default_expiry_margin_secs() -> i64 {
    DEFAULT_EXPIRY_MARGIN_SECS
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_systems_parse() {
        let first = parse_settings(Some("settings/system1.toml")).unwrap();
        assert_eq!(first.session.key_suffix, "");
        assert_eq!(first.session.profile, EndpointProfile::Legacy);
        assert_eq!(first.session.expiry_margin_secs, 180);

        let second = parse_settings(Some("settings/system2.toml")).unwrap();
        assert_eq!(second.session.key_suffix, "2");
        assert_eq!(second.session.profile, EndpointProfile::Oidc);
        assert!(second.session.auth_base_url.ends_with("/api2"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }
}
