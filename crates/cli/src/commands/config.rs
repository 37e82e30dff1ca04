use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use leadmate_core::config::AppConfig;
use secrecy::ExposeSecret;
use toml::Value;

use crate::GlobalArgs;

pub fn run(global: &GlobalArgs) -> String {
    let config = match AppConfig::load(global.load_options()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(global);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];

    lines.push(render_line(
        "store.path",
        &config.store.path.display().to_string(),
        field_source(
            "store.path",
            global.store.is_some().then_some("--store"),
            &["LEADMATE_STORE_PATH"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "llm.base_url",
        &config.llm.base_url,
        field_source(
            "llm.base_url",
            None,
            &["LEADMATE_LLM_BASE_URL"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "llm.model",
        &config.llm.model,
        field_source(
            "llm.model",
            None,
            &["LEADMATE_LLM_MODEL", "OPENAI_MODEL"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "llm.api_key",
        &api_key,
        field_source(
            "llm.api_key",
            None,
            &["LEADMATE_LLM_API_KEY", "OPENAI_API_KEY"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        field_source(
            "llm.timeout_secs",
            None,
            &["LEADMATE_LLM_TIMEOUT_SECS"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "agent.max_tool_rounds",
        &config.agent.max_tool_rounds.to_string(),
        field_source(
            "agent.max_tool_rounds",
            None,
            &["LEADMATE_AGENT_MAX_TOOL_ROUNDS"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            global.log_level.is_some().then_some("--log-level"),
            &["LEADMATE_LOGGING_LEVEL", "LEADMATE_LOG_LEVEL"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            global.log_format.is_some().then_some("--log-format"),
            &["LEADMATE_LOGGING_FORMAT", "LEADMATE_LOG_FORMAT"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.join("\n")
}

fn detect_config_path(global: &GlobalArgs) -> Option<PathBuf> {
    if let Some(path) = &global.config {
        return path.exists().then(|| path.clone());
    }

    let env_path = env::var("LEADMATE_CONFIG").ok().filter(|value| !value.trim().is_empty());
    if let Some(value) = env_path {
        let path = PathBuf::from(value);
        return path.exists().then_some(path);
    }

    [PathBuf::from("leadmate.toml"), PathBuf::from("config/leadmate.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    flag: Option<&str>,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(flag_name) = flag {
        return format!("flag ({flag_name})");
    }

    for env_key in env_keys {
        if env_present(env_key) {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

// Mirrors the loader, which treats blank environment values as unset.
fn env_present(key: &str) -> bool {
    env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
