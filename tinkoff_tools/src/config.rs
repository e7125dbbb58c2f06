use std::time::Duration;

use log::*;
use wfm_common::Secret;

pub const DEFAULT_BASE_URL: &str = "https://securepay.tinkoff.ru";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Gateway credentials and endpoint configuration. Always passed in explicitly so that the client and the
/// token scheme stay testable with fixed vectors; [`TinkoffConfig::new_from_env_or_default`] is the
/// production entry point.
#[derive(Debug, Clone)]
pub struct TinkoffConfig {
    pub terminal_key: String,
    pub password: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for TinkoffConfig {
    fn default() -> Self {
        Self {
            terminal_key: String::new(),
            password: Secret::new(String::new()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl TinkoffConfig {
    pub fn new<S: Into<String>>(terminal_key: S, password: S) -> Self {
        Self {
            terminal_key: terminal_key.into(),
            password: Secret::new(password.into()),
            ..Self::default()
        }
    }

    pub fn new_from_env_or_default() -> Self {
        let terminal_key = std::env::var("WFM_TINKOFF_TERMINAL_KEY").unwrap_or_else(|_| {
            warn!("WFM_TINKOFF_TERMINAL_KEY not set, using (probably useless) default");
            "0000000000000".to_string()
        });
        let password = Secret::new(std::env::var("WFM_TINKOFF_PASSWORD").unwrap_or_else(|_| {
            warn!("WFM_TINKOFF_PASSWORD not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let base_url = std::env::var("WFM_TINKOFF_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout = std::env::var("WFM_TINKOFF_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { terminal_key, password, base_url, timeout }
    }
}
