pub mod database;
pub mod llm_service;
pub mod retry;
pub mod schema_text;

pub use llm_service::*;
pub use retry::*;
pub use schema_text::*;
