use std::sync::Arc;

use axum::Router;
use storefront_agent::llm::LlmError;
use storefront_agent::runtime::AssistantGateway;
use storefront_core::config::{AppConfig, ConfigError};
use storefront_db::{connect_with_settings, migrations, DbPool, SqlCatalogRepository};
use thiserror::Error;
use tracing::info;

use crate::{chat, health};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub gateway: Arc<AssistantGateway>,
}

impl Application {
    pub fn router(&self) -> Router {
        chat::router(self.gateway.clone()).merge(health::router(self.db_pool.clone()))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("completion client setup failed: {0}")]
    CompletionClient(#[source] LlmError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let gateway = AssistantGateway::from_config(
        &config,
        Arc::new(SqlCatalogRepository::new(db_pool.clone())),
    )
    .map_err(BootstrapError::CompletionClient)?;

    info!(
        event_name = "system.bootstrap.gateway_ready",
        correlation_id = "bootstrap",
        model = %config.llm.model,
        scope_mode = ?config.scope.mode,
        "assistant gateway initialized"
    );

    Ok(Application { config, db_pool, gateway: Arc::new(gateway) })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use storefront_core::config::{AppConfig, ConfigOverrides, LoadOptions, ScopeMode};

    use super::{bootstrap_with_config, Application, BootstrapError};

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    fn options(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                llm_api_key: Some("hf-test".to_string()),
                llm_model: Some("test-model".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_api_key() {
        let mut options = options("sqlite::memory:");
        options.overrides.llm_api_key = Some("  ".to_string());

        let result = bootstrap(options).await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("llm.api_key"), "unexpected error: {message}");
    }

    #[tokio::test]
    async fn bootstrap_rejects_plain_http_remote_endpoint() {
        let mut options = options("sqlite::memory:");
        options.overrides.llm_base_url = Some("http://llm.example.com/v1".to_string());

        let result = bootstrap(options).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_builds_gateway_from_config() {
        let mut options = options("sqlite::memory:?cache=shared");
        options.overrides.scope_mode = Some(ScopeMode::AllowList);

        let app = bootstrap(options).await.expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'product'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("product table should exist after bootstrap");
        assert_eq!(table_count, 1);

        let settings = app.gateway.settings();
        assert_eq!(settings.model, "test-model");
        assert_eq!(settings.max_tokens, 150);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.currency, "EUR");

        app.db_pool.close().await;
    }
}
