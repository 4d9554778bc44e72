pub mod assistant;
pub mod catalog;
pub mod conversation;
