use std::sync::Arc;

use storefront_agent::runtime::AssistantGateway;
use storefront_core::AssistantResponse;
use storefront_db::SqlCatalogRepository;

use crate::commands::{block_on, load_config, open_migrated_pool, CommandResult, StepFailure};

/// Sends one message through the live gateway, the same path `POST /chatbot` uses.
pub fn run(message: &str) -> CommandResult {
    if message.trim().is_empty() {
        return CommandResult::failure("ask", "invalid_input", "Please enter a message.", 2);
    }

    let config = match load_config("ask") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let result = block_on("ask", async {
        let pool = open_migrated_pool(&config).await?;
        let gateway = AssistantGateway::from_config(
            &config,
            Arc::new(SqlCatalogRepository::new(pool.clone())),
        )
        .map_err(|error| ("llm_client", error.to_string(), 6u8))?;

        let response = gateway.get_response(message, &[]).await;
        pool.close().await;
        Ok::<_, StepFailure>(response)
    });

    match result {
        Ok(response) => outcome(response),
        Err(failure) => failure,
    }
}

fn outcome(response: AssistantResponse) -> CommandResult {
    if response.succeeded {
        return CommandResult::success("ask", response.reply_text);
    }

    let detail = response.error_detail.unwrap_or_else(|| "no diagnostic available".to_string());
    CommandResult::failure("ask", "assistant", format!("{} ({detail})", response.reply_text), 7)
}
