use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use storefront_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct ConfigSources {
    file_path: Option<PathBuf>,
    file_doc: Option<Value>,
}

impl ConfigSources {
    fn detect() -> Self {
        let file_path = ["storefront.toml", "config/storefront.toml"]
            .into_iter()
            .map(PathBuf::from)
            .find(|path| path.exists());
        let file_doc = load_config_file_doc(file_path.as_deref());
        Self { file_path, file_doc }
    }

    /// Reports where a value came from: env wins over file, file over default.
    fn source_of(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if self.file_doc.as_ref().is_some_and(|doc| contains_path(doc, key_path)) {
            let file_path = self
                .file_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }

        "default".to_string()
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let sources = ConfigSources::detect();
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in effective_values(&config) {
        let source = sources.source_of(key_path, &env_keys);
        lines.push(format!("- {key_path} = {value} (source: {source})"));
    }

    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<(&'static str, String, Vec<&'static str>)> {
    let api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };

    vec![
        ("database.url", config.database.url.clone(), vec!["STOREFRONT_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            vec!["STOREFRONT_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            vec!["STOREFRONT_DATABASE_TIMEOUT_SECS"],
        ),
        ("llm.api_key", api_key.to_string(), vec!["STOREFRONT_LLM_API_KEY", "HUGGINGFACE_API_KEY"]),
        ("llm.base_url", config.llm.base_url.clone(), vec!["STOREFRONT_LLM_BASE_URL"]),
        ("llm.model", config.llm.model.clone(), vec!["STOREFRONT_LLM_MODEL"]),
        ("llm.max_tokens", config.llm.max_tokens.to_string(), vec!["STOREFRONT_LLM_MAX_TOKENS"]),
        (
            "llm.temperature",
            config.llm.temperature.to_string(),
            vec!["STOREFRONT_LLM_TEMPERATURE"],
        ),
        (
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            vec!["STOREFRONT_LLM_TIMEOUT_SECS"],
        ),
        (
            "assistant.currency",
            config.assistant.currency.clone(),
            vec!["STOREFRONT_ASSISTANT_CURRENCY"],
        ),
        (
            "assistant.max_history_turns",
            config.assistant.max_history_turns.to_string(),
            vec!["STOREFRONT_ASSISTANT_MAX_HISTORY_TURNS"],
        ),
        ("scope.mode", format!("{:?}", config.scope.mode), vec!["STOREFRONT_SCOPE_MODE"]),
        (
            "scope.allow_keywords",
            format!("{} keywords", config.scope.allow_keywords.len()),
            vec!["STOREFRONT_SCOPE_ALLOW_KEYWORDS"],
        ),
        (
            "scope.deny_keywords",
            format!("{} keywords", config.scope.deny_keywords.len()),
            vec!["STOREFRONT_SCOPE_DENY_KEYWORDS"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            vec!["STOREFRONT_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), vec!["STOREFRONT_SERVER_PORT"]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            vec!["STOREFRONT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            vec!["STOREFRONT_LOGGING_LEVEL", "STOREFRONT_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            vec!["STOREFRONT_LOGGING_FORMAT", "STOREFRONT_LOG_FORMAT"],
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
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

#[cfg(test)]
mod tests {
    use storefront_core::config::AppConfig;
    use toml::Value;

    use super::{contains_path, effective_values};

    #[test]
    fn nested_keys_are_found_in_file_document() {
        let doc: Value = "[llm]\nmodel = \"m\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "llm.model"));
        assert!(!contains_path(&doc, "llm.api_key"));
        assert!(!contains_path(&doc, "server.port"));
    }

    #[test]
    fn api_key_is_never_rendered() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("hf-very-secret".to_string().into());

        let rendered = effective_values(&config)
            .into_iter()
            .map(|(_, value, _)| value)
            .collect::<Vec<_>>()
            .join("\n");

        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hf-very-secret"));
    }
}
