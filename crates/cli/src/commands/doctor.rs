use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use storefront_agent::catalog::{CatalogReader, CATALOG_UNAVAILABLE_TEXT};
use storefront_agent::conversation::SHOP_ASSISTANT_INSTRUCTION;
use storefront_agent::llm::{
    ChatCompletionClient, CompletionRequest, LlmError, OpenAiCompatibleClient,
};
use storefront_core::config::{AppConfig, LoadOptions};
use storefront_core::ConversationTurn;
use storefront_db::{connect_with_settings, migrations, SqlCatalogRepository};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn from_checks(checks: Vec<DoctorCheck>) -> Self {
        let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
        Self {
            overall_status: if all_pass { CheckStatus::Pass } else { CheckStatus::Fail },
            summary: if all_pass {
                "doctor: all readiness checks passed".to_string()
            } else {
                "doctor: one or more readiness checks failed".to_string()
            },
            checks,
        }
    }

    fn passed(&self) -> bool {
        self.overall_status == CheckStatus::Pass
    }
}

/// Returns the rendered report and whether every check passed. `ping` adds a
/// live completion call, which costs one request against the configured model.
pub fn run(json_output: bool, ping: bool) -> (String, bool) {
    let report = build_report(ping);
    let passed = report.passed();

    if json_output {
        let rendered = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        });
        return (rendered, passed);
    }

    (render_human(&report), passed)
}

fn build_report(ping: bool) -> DoctorReport {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            let mut checks = vec![
                DoctorCheck::fail("config_validation", error.to_string()),
                DoctorCheck::skipped("llm_client"),
                DoctorCheck::skipped("database_connectivity"),
                DoctorCheck::skipped("catalog_render"),
            ];
            if ping {
                checks.push(DoctorCheck::skipped("llm_ping"));
            }
            return DoctorReport::from_checks(checks);
        }
    };

    let client = build_client(&config);
    let mut checks = vec![
        DoctorCheck::pass("config_validation", "configuration loaded and validated"),
        match &client {
            Ok(client) => DoctorCheck::pass(
                "llm_client",
                format!("model `{}` via {}", config.llm.model, client.endpoint()),
            ),
            Err(error) => DoctorCheck::fail("llm_client", error.to_string()),
        },
    ];
    checks.extend(check_database_and_catalog(&config));

    if ping {
        checks.push(match &client {
            Ok(client) => check_ping(client, &config),
            Err(_) => DoctorCheck::fail("llm_ping", "no usable completion client"),
        });
    }

    DoctorReport::from_checks(checks)
}

fn build_client(config: &AppConfig) -> Result<OpenAiCompatibleClient, LlmError> {
    let api_key = config
        .llm
        .api_key
        .clone()
        .ok_or_else(|| LlmError::Configuration("llm.api_key is not set".to_string()))?;
    OpenAiCompatibleClient::new(
        &config.llm.base_url,
        api_key,
        Duration::from_secs(config.llm.timeout_secs),
    )
}

fn check_ping(client: &OpenAiCompatibleClient, config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck::fail(
                "llm_ping",
                format!("failed to initialize async runtime: {error}"),
            );
        }
    };

    let request = CompletionRequest {
        model: config.llm.model.clone(),
        messages: vec![
            ConversationTurn::system(SHOP_ASSISTANT_INSTRUCTION),
            ConversationTurn::user("Where is my order?"),
        ],
        max_tokens: config.llm.max_tokens,
        temperature: config.llm.temperature,
    };

    match runtime.block_on(client.complete(&request)) {
        Ok(reply) if reply.content.as_deref().is_some_and(|text| !text.trim().is_empty()) => {
            DoctorCheck::pass("llm_ping", "model answered a test question")
        }
        Ok(_) => DoctorCheck::fail("llm_ping", "model returned an empty reply"),
        Err(error) => DoctorCheck::fail("llm_ping", error.to_string()),
    }
}

fn check_database_and_catalog(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let details = format!("failed to initialize async runtime: {error}");
            return vec![
                DoctorCheck::fail("database_connectivity", details.clone()),
                DoctorCheck::fail("catalog_render", details),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::fail("catalog_render", "no database connection"),
                ];
            }
        };

        let database = DoctorCheck::pass(
            "database_connectivity",
            format!("connected using `{}`", config.database.url),
        );

        let catalog = match migrations::run_pending(&pool).await {
            Ok(()) => {
                let reader = CatalogReader::new(
                    Arc::new(SqlCatalogRepository::new(pool.clone())),
                    config.assistant.currency.clone(),
                );
                catalog_check(&reader.render_catalog().await)
            }
            Err(error) => DoctorCheck::fail("catalog_render", format!("migrations failed: {error}")),
        };

        pool.close().await;
        vec![database, catalog]
    })
}

fn catalog_check(rendered: &str) -> DoctorCheck {
    if rendered == CATALOG_UNAVAILABLE_TEXT {
        return DoctorCheck::fail("catalog_render", "catalog could not be read");
    }

    let products = rendered.lines().filter(|line| line.starts_with("- ")).count();
    DoctorCheck::pass("catalog_render", format!("{products} products rendered into assistant context"))
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
