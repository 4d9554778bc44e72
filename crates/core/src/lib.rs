pub mod config;
pub mod domain;
pub mod errors;

pub use domain::assistant::{AssistantRequest, AssistantResponse};
pub use domain::catalog::CatalogEntry;
pub use domain::conversation::{ConversationTurn, TurnRole};
pub use errors::{ApplicationError, InterfaceError};
