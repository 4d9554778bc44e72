use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use storefront_cli::commands::{ask, config, doctor, migrate, seed};
use tempfile::TempDir;

const VALID_ENV: &[(&str, &str)] = &[
    ("STOREFRONT_LLM_API_KEY", "hf-test-key"),
    ("STOREFRONT_LLM_MODEL", "test-model"),
    ("STOREFRONT_DATABASE_URL", "sqlite::memory:"),
    ("STOREFRONT_DATABASE_MAX_CONNECTIONS", "1"),
];

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(VALID_ENV, || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_without_api_key() {
    with_env(&[("STOREFRONT_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_lists_demo_products() {
    with_env(VALID_ENV, || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("demo catalog loaded with 4 products"));
        assert!(message.contains("  - Wireless Mouse"));
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("storefront.db").display());
    let vars = [
        ("STOREFRONT_LLM_API_KEY", "hf-test-key"),
        ("STOREFRONT_LLM_MODEL", "test-model"),
        ("STOREFRONT_DATABASE_URL", url.as_str()),
    ];

    with_env(&vars, || {
        let first = seed::run();
        let second = seed::run();

        assert_eq!(first.exit_code, 0, "first seed: {}", first.output);
        assert_eq!(second.exit_code, 0, "second seed: {}", second.output);
        assert_eq!(parse_payload(&first.output)["message"], parse_payload(&second.output)["message"]);

        let (output, passed) = doctor::run(true, false);
        assert!(passed, "doctor should pass on the seeded file: {output}");
        let report = parse_payload(&output);
        let catalog = report["checks"]
            .as_array()
            .expect("checks array")
            .iter()
            .find(|check| check["name"] == "catalog_render")
            .expect("catalog_render check")
            .clone();
        assert_eq!(catalog["details"], "4 products rendered into assistant context");
    });
}

#[test]
fn config_redacts_api_key_and_reports_env_source() {
    with_env(VALID_ENV, || {
        let output = config::run();

        assert!(output.contains("- llm.api_key = <redacted> (source: env (STOREFRONT_LLM_API_KEY))"));
        assert!(output.contains("- llm.model = test-model"));
        assert!(output.contains("- assistant.currency = EUR (source: default)"));
        assert!(!output.contains("hf-test-key"));
    });
}

#[test]
fn doctor_passes_with_valid_env() {
    with_env(VALID_ENV, || {
        let (output, passed) = doctor::run(true, false);
        assert!(passed, "doctor should pass: {output}");

        let report = parse_payload(&output);
        assert_eq!(report["overall_status"], "pass");
        let names: Vec<&str> = report["checks"]
            .as_array()
            .expect("checks array")
            .iter()
            .filter_map(|check| check["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec!["config_validation", "llm_client", "database_connectivity", "catalog_render"]
        );
    });
}

#[test]
fn doctor_rejects_plain_http_to_remote_model_host() {
    let mut vars = VALID_ENV.to_vec();
    vars.push(("STOREFRONT_LLM_BASE_URL", "http://llm.example.com/v1"));

    with_env(&vars, || {
        let (output, passed) = doctor::run(false, false);

        assert!(!passed);
        assert!(output.contains("- [fail] llm_client"), "{output}");
        assert!(output.contains("- [ok] database_connectivity"), "{output}");
    });
}

#[test]
fn doctor_ping_reports_unreachable_model() {
    let mut vars = VALID_ENV.to_vec();
    vars.push(("STOREFRONT_LLM_BASE_URL", "http://127.0.0.1:9/v1"));
    vars.push(("STOREFRONT_LLM_TIMEOUT_SECS", "2"));

    with_env(&vars, || {
        let (without_ping, passed) = doctor::run(false, false);
        assert!(passed, "{without_ping}");
        assert!(!without_ping.contains("llm_ping"));

        let (output, passed) = doctor::run(false, true);
        assert!(!passed);
        assert!(output.contains("- [ok] llm_client"), "{output}");
        assert!(output.contains("- [fail] llm_ping"), "{output}");
    });
}

#[test]
fn huggingface_key_configures_the_assistant() {
    with_env(&[("HUGGINGFACE_API_KEY", "hf-fallback-key"), ("STOREFRONT_LLM_MODEL", "test-model")], || {
        let output = config::run();

        assert!(output.contains("- llm.api_key = <redacted> (source: env (HUGGINGFACE_API_KEY))"), "{output}");
        assert!(!output.contains("hf-fallback-key"));
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[], || {
        let (output, passed) = doctor::run(false, false);

        assert!(!passed);
        assert!(output.contains("- [fail] config_validation"));
        assert!(output.contains("- [skip] database_connectivity"));
    });
}

#[test]
fn ask_refuses_off_topic_message_without_network() {
    with_env(VALID_ENV, || {
        let result = ask::run("What's the weather today?");
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["message"], "Sorry, I can only help with questions about our online shop.");
    });
}

#[test]
fn ask_reports_unreachable_model_as_assistant_failure() {
    let mut vars = VALID_ENV.to_vec();
    vars.push(("STOREFRONT_LLM_BASE_URL", "http://127.0.0.1:9/v1"));
    vars.push(("STOREFRONT_LLM_TIMEOUT_SECS", "2"));

    with_env(&vars, || {
        let result = ask::run("Where is my order?");
        assert_eq!(result.exit_code, 7);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "assistant");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("Sorry, the shop assistant is temporarily unavailable."));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "STOREFRONT_DATABASE_URL",
        "STOREFRONT_DATABASE_MAX_CONNECTIONS",
        "STOREFRONT_DATABASE_TIMEOUT_SECS",
        "STOREFRONT_LLM_API_KEY",
        "HUGGINGFACE_API_KEY",
        "STOREFRONT_LLM_BASE_URL",
        "STOREFRONT_LLM_MODEL",
        "STOREFRONT_LLM_MAX_TOKENS",
        "STOREFRONT_LLM_TEMPERATURE",
        "STOREFRONT_LLM_TIMEOUT_SECS",
        "STOREFRONT_ASSISTANT_CURRENCY",
        "STOREFRONT_ASSISTANT_MAX_HISTORY_TURNS",
        "STOREFRONT_SCOPE_MODE",
        "STOREFRONT_SCOPE_ALLOW_KEYWORDS",
        "STOREFRONT_SCOPE_DENY_KEYWORDS",
        "STOREFRONT_SERVER_BIND_ADDRESS",
        "STOREFRONT_SERVER_PORT",
        "STOREFRONT_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "STOREFRONT_LOGGING_LEVEL",
        "STOREFRONT_LOGGING_FORMAT",
        "STOREFRONT_LOG_LEVEL",
        "STOREFRONT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
