use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use storefront_agent::runtime::AssistantGateway;
use storefront_core::{ApplicationError, AssistantRequest, InterfaceError};
use tokio::task::JoinHandle;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ChatState {
    gateway: Arc<AssistantGateway>,
}

/// Wire shape returned to the storefront widget. Diagnostics stay server-side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub success: bool,
}

pub fn router(gateway: Arc<AssistantGateway>) -> Router {
    Router::new().route("/chatbot", post(chatbot)).with_state(ChatState { gateway })
}

pub async fn chatbot(
    State(state): State<ChatState>,
    payload: Result<Json<AssistantRequest>, JsonRejection>,
) -> (StatusCode, Json<ChatReply>) {
    let correlation_id = Uuid::new_v4().to_string();

    let request = match parse_request(payload) {
        Ok(request) => request,
        Err(error) => return reject(error.into_interface(correlation_id)),
    };

    let gateway = state.gateway.clone();
    let task_correlation_id = correlation_id.clone();
    let mut task = AbortOnDrop(tokio::spawn(async move {
        gateway.handle(&request, &task_correlation_id).await
    }));
    let outcome = (&mut task.0).await;

    match outcome {
        Ok(response) => (
            StatusCode::OK,
            Json(ChatReply { response: response.reply_text, success: response.succeeded }),
        ),
        Err(join_error) => {
            error!(
                event_name = "server.chatbot.task_failed",
                correlation_id = %correlation_id,
                error = %join_error,
                "assistant task did not complete"
            );
            reject(ApplicationError::Internal(join_error.to_string()).into_interface(correlation_id))
        }
    }
}

/// Cancels the gateway task when the handler future is dropped, so a
/// disconnected caller does not leave a completion call running.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn parse_request(
    payload: Result<Json<AssistantRequest>, JsonRejection>,
) -> Result<AssistantRequest, ApplicationError> {
    let Json(request) =
        payload.map_err(|rejection| ApplicationError::InvalidInput(rejection.body_text()))?;

    if request.message.trim().is_empty() {
        return Err(ApplicationError::InvalidInput("message is empty".to_string()));
    }

    Ok(request)
}

fn reject(error: InterfaceError) -> (StatusCode, Json<ChatReply>) {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    warn!(
        event_name = "server.chatbot.rejected",
        correlation_id = %error.correlation_id(),
        status = status.as_u16(),
        error = %error,
        "chat request rejected"
    );

    (status, Json(ChatReply { response: error.user_message().to_string(), success: false }))
}
