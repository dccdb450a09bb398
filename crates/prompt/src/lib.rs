//! Prompt assembly for docqa.
//!
//! This crate turns a question and its retrieved context into the text sent
//! to the generation model:
//! - Built-in Handlebars template with `{{question}}` and `{{context}}`
//! - Optional YAML prompt definitions replacing the template

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{
    format_context, PromptBuilder, CONTEXT_VAR, DEFAULT_ANSWER_MARKER, DEFAULT_TEMPLATE,
    QUESTION_VAR,
};
pub use loader::load_prompt;
pub use types::PromptDefinition;
