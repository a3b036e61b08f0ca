use std::{collections::HashMap, fs, path::Path, time::Duration};

use client_core::{HttpApiConfig, SessionPolicy, DEFAULT_RECOMPUTE_DELAY};

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub recompute_delay_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:9000".into(),
            request_timeout_secs: 30,
            recompute_delay_ms: DEFAULT_RECOMPUTE_DELAY.as_millis() as u64,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn http_config(&self) -> HttpApiConfig {
        HttpApiConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            recompute_delay: Duration::from_millis(self.recompute_delay_ms),
            ..SessionPolicy::default()
        }
    }
}

pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("api_url") {
        settings.api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("request_timeout_secs") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Some(v) = file_cfg.get("recompute_delay_ms") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.recompute_delay_ms = parsed;
        }
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("PATHFINDER_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = var("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = var("APP__RECOMPUTE_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.recompute_delay_ms = parsed;
        }
    }

    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
