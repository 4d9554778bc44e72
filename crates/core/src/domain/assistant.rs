use serde::{Deserialize, Serialize};

use super::conversation::ConversationTurn;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

/// Outcome of one assistant exchange. `error_detail` is diagnostic only and
/// must not be shown to shoppers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssistantResponse {
    pub reply_text: String,
    pub succeeded: bool,
    pub error_detail: Option<String>,
}

impl AssistantResponse {
    pub fn success(reply_text: impl Into<String>) -> Self {
        Self { reply_text: reply_text.into(), succeeded: true, error_detail: None }
    }

    pub fn failure(reply_text: impl Into<String>, error_detail: impl Into<String>) -> Self {
        Self {
            reply_text: reply_text.into(),
            succeeded: false,
            error_detail: Some(error_detail.into()),
        }
    }
}
