//! Shop assistant gateway.
//!
//! Turns a shopper message plus prior turns into a single reply:
//! - `guardrails` decides whether a message is in scope before any paid call
//! - `catalog` renders current products as model context
//! - `conversation` assembles the system turn, history and current message
//! - `llm` talks to an OpenAI-compatible chat-completions endpoint
//! - `runtime` wires these together in [`runtime::AssistantGateway`]
//!
//! The model only phrases answers. Prices and stock always come from the
//! catalog rendered into the system turn.

pub mod catalog;
pub mod conversation;
pub mod guardrails;
pub mod llm;
pub mod runtime;

pub use catalog::CatalogReader;
pub use guardrails::{KeywordScopePolicy, ScopeDecision, ScopeFilter};
pub use llm::{ChatCompletionClient, CompletionReply, CompletionRequest, LlmError, OpenAiCompatibleClient};
pub use runtime::{AssistantGateway, GatewaySettings};
