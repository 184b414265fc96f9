use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use stayfinder_core::config::{AppConfig, FALLBACK_API_KEY_ENV};
use toml::Value;

use crate::commands::load_options;

struct ConfigSources {
    file_path: Option<PathBuf>,
    file_doc: Option<Value>,
}

impl ConfigSources {
    fn detect(explicit_path: Option<PathBuf>) -> Self {
        let file_path = detect_config_path(explicit_path);
        let file_doc = load_config_file_doc(file_path.as_deref());
        Self { file_path, file_doc }
    }

    fn line(&self, key_path: &str, value: &str, env_keys: &[&str]) -> String {
        format!("- {key_path} = {value} (source: {})", self.source(key_path, env_keys))
    }

    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env_is_set(key)) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.file_doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .file_path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

pub fn run(config_path: Option<PathBuf>) -> String {
    let config = match AppConfig::load(load_options(config_path.clone())) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };
    let sources = ConfigSources::detect(config_path);

    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    let lines = vec![
        "effective config (source precedence: env > file > default):".to_string(),
        sources.line(
            "llm.provider",
            &format!("{:?}", config.llm.provider),
            &["STAYFINDER_LLM_PROVIDER"],
        ),
        sources.line("llm.model", &config.llm.model, &["STAYFINDER_LLM_MODEL"]),
        sources.line("llm.base_url", &config.llm.base_url, &["STAYFINDER_LLM_BASE_URL"]),
        sources.line("llm.api_key", &api_key, &["STAYFINDER_LLM_API_KEY", FALLBACK_API_KEY_ENV]),
        sources.line(
            "llm.timeout_secs",
            &config.llm.timeout_secs.to_string(),
            &["STAYFINDER_LLM_TIMEOUT_SECS"],
        ),
        sources.line(
            "agent.max_tool_rounds",
            &config.agent.max_tool_rounds.to_string(),
            &["STAYFINDER_AGENT_MAX_TOOL_ROUNDS"],
        ),
        sources.line(
            "agent.system_prompt",
            &summarize_prompt(&config.agent.system_prompt),
            &[],
        ),
        sources.line(
            "booking.require_positive_stay",
            &config.booking.require_positive_stay.to_string(),
            &["STAYFINDER_BOOKING_REQUIRE_POSITIVE_STAY"],
        ),
        sources.line(
            "browse.listings_path",
            &config.browse.listings_path.display().to_string(),
            &["STAYFINDER_BROWSE_LISTINGS_PATH"],
        ),
        sources.line(
            "logging.level",
            &config.logging.level,
            &["STAYFINDER_LOGGING_LEVEL", "STAYFINDER_LOG_LEVEL"],
        ),
        sources.line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            &["STAYFINDER_LOGGING_FORMAT", "STAYFINDER_LOG_FORMAT"],
        ),
    ];

    lines.join("\n")
}

/// Blank values are ignored by the loader, so they do not count as a source.
fn env_is_set(key: &str) -> bool {
    env::var(key).is_ok_and(|value| !value.trim().is_empty())
}

fn detect_config_path(explicit_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path);
    }

    [PathBuf::from("stayfinder.toml"), PathBuf::from("config/stayfinder.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

fn summarize_prompt(prompt: &str) -> String {
    const PREVIEW_CHARS: usize = 40;
    let preview: String = prompt.chars().take(PREVIEW_CHARS).collect();
    if prompt.chars().count() > PREVIEW_CHARS {
        format!("\"{preview}...\"")
    } else {
        format!("\"{preview}\"")
    }
}
