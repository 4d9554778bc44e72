use std::sync::Arc;
use std::time::Duration;

use storefront_core::config::AppConfig;
use storefront_core::domain::assistant::{AssistantRequest, AssistantResponse};
use storefront_core::domain::conversation::ConversationTurn;
use storefront_db::repositories::CatalogRepository;
use tracing::{error, info, warn};

use crate::catalog::CatalogReader;
use crate::conversation::{PromptAssembler, SHOP_ASSISTANT_INSTRUCTION};
use crate::guardrails::{KeywordScopePolicy, ScopeDecision, ScopeFilter};
use crate::llm::{
    ChatCompletionClient, CompletionReply, CompletionRequest, LlmError, OpenAiCompatibleClient,
};

pub const REFUSAL_TEXT: &str = "Sorry, I can only help with questions about our online shop.";
pub const NO_REPLY_TEXT: &str =
    "I could not generate an answer right now. Please try rephrasing your question.";
pub const APOLOGY_TEXT: &str =
    "Sorry, the shop assistant is temporarily unavailable. Please try again later.";

#[derive(Clone, Debug, PartialEq)]
pub struct GatewaySettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub currency: String,
    pub max_history_turns: usize,
}

impl GatewaySettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            request_timeout: Duration::from_secs(config.llm.timeout_secs),
            currency: config.assistant.currency.clone(),
            max_history_turns: config.assistant.max_history_turns,
        }
    }
}

/// Mediates between the chat endpoint and the completion API.
///
/// Every path returns an [`AssistantResponse`]; failures are folded into the
/// response with a user-safe text and a diagnostic `error_detail`.
pub struct AssistantGateway {
    client: Arc<dyn ChatCompletionClient>,
    catalog: CatalogReader,
    scope: Arc<dyn ScopeFilter>,
    prompt: PromptAssembler,
    settings: GatewaySettings,
}

impl AssistantGateway {
    pub fn new(
        client: Arc<dyn ChatCompletionClient>,
        catalog: Arc<dyn CatalogRepository>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            client,
            catalog: CatalogReader::new(catalog, settings.currency.clone()),
            scope: Arc::new(KeywordScopePolicy::default()),
            prompt: PromptAssembler::new(SHOP_ASSISTANT_INSTRUCTION, settings.max_history_turns),
            settings,
        }
    }

    /// Production wiring: OpenAI-compatible client plus the configured scope policy.
    pub fn from_config(
        config: &AppConfig,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Result<Self, LlmError> {
        let api_key = config
            .llm
            .api_key
            .clone()
            .ok_or_else(|| LlmError::Configuration("llm.api_key is required".to_string()))?;
        let client = OpenAiCompatibleClient::new(
            &config.llm.base_url,
            api_key,
            Duration::from_secs(config.llm.timeout_secs),
        )?;

        Ok(Self::new(Arc::new(client), catalog, GatewaySettings::from_config(config))
            .with_scope_filter(Arc::new(KeywordScopePolicy::from_config(&config.scope))))
    }

    pub fn with_scope_filter(mut self, scope: Arc<dyn ScopeFilter>) -> Self {
        self.scope = scope;
        self
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub async fn get_response(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> AssistantResponse {
        self.respond(message, history, "unassigned").await
    }

    pub async fn handle(&self, request: &AssistantRequest, correlation_id: &str) -> AssistantResponse {
        self.respond(&request.message, &request.history, correlation_id).await
    }

    async fn respond(
        &self,
        message: &str,
        history: &[ConversationTurn],
        correlation_id: &str,
    ) -> AssistantResponse {
        if let ScopeDecision::Refuse { reason_code, matched_keyword } = self.scope.evaluate(message)
        {
            info!(
                event_name = "assistant.scope.refused",
                correlation_id = %correlation_id,
                reason_code,
                matched_keyword = matched_keyword.as_deref().unwrap_or("none"),
                "message refused without calling the model"
            );
            return AssistantResponse::success(REFUSAL_TEXT);
        }

        let catalog_context = self.catalog.render_catalog().await;
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: self.prompt.assemble(&catalog_context, history, message),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        info!(
            event_name = "assistant.completion.start",
            correlation_id = %correlation_id,
            model = %request.model,
            turns = request.messages.len(),
            "requesting completion"
        );

        match self.complete_with_timeout(&request).await {
            Ok(reply) => {
                let text = reply.content.as_deref().map(str::trim).unwrap_or_default();
                if text.is_empty() {
                    warn!(
                        event_name = "assistant.completion.empty",
                        correlation_id = %correlation_id,
                        "model returned an empty reply"
                    );
                    return AssistantResponse::failure(NO_REPLY_TEXT, "model returned an empty reply");
                }

                info!(
                    event_name = "assistant.completion.succeeded",
                    correlation_id = %correlation_id,
                    reply_chars = text.chars().count(),
                    "completion received"
                );
                AssistantResponse::success(text)
            }
            Err(llm_error) => {
                error!(
                    event_name = "assistant.completion.failed",
                    correlation_id = %correlation_id,
                    error_kind = llm_error.kind(),
                    error = %llm_error,
                    "completion call failed"
                );
                AssistantResponse::failure(APOLOGY_TEXT, llm_error.to_string())
            }
        }
    }

    async fn complete_with_timeout(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionReply, LlmError> {
        match tokio::time::timeout(self.settings.request_timeout, self.client.complete(request)).await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(LlmError::Timeout),
        }
    }
}
