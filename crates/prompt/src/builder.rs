//! Prompt builder: fills the question and retrieved context into a template.

use crate::types::PromptDefinition;
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Template variable holding the user's question.
pub const QUESTION_VAR: &str = "question";

/// Template variable holding the retrieved context block.
pub const CONTEXT_VAR: &str = "context";

/// Marker that ends the built-in template; the answer follows it.
pub const DEFAULT_ANSWER_MARKER: &str = "### Answer:";

/// Built-in generation prompt.
///
/// Generation models are sensitive to the exact wording, so changes here
/// change answers.
pub const DEFAULT_TEMPLATE: &str = "Below is a question, paired with reference text retrieved from \
the user's documents. Write an answer to the question using only the reference text.\n\n\
### Question:\n{{question}}\n\n\
### Reference:\n{{context}}\n\
### Answer:";

const TEMPLATE_NAME: &str = "prompt";

const QUESTION_SENTINEL: &str = "\u{1}question\u{1}";
const CONTEXT_SENTINEL: &str = "\u{1}context\u{1}";

/// Renders generation prompts from a fixed template.
///
/// The template is parsed once on construction; `build` is a pure function
/// of its arguments.
#[derive(Debug)]
pub struct PromptBuilder {
    handlebars: Handlebars<'static>,
    source_id: String,
}

impl PromptBuilder {
    /// Builder using the built-in template.
    pub fn new() -> AppResult<Self> {
        Self::with_template("builtin", DEFAULT_TEMPLATE)
    }

    /// Builder using a loaded prompt definition.
    pub fn from_definition(definition: &PromptDefinition) -> AppResult<Self> {
        Self::with_template(&definition.id, &definition.template)
    }

    /// Builder using an arbitrary template string.
    ///
    /// The template must reference both `{{question}}` and `{{context}}`.
    pub fn with_template(source_id: &str, template: &str) -> AppResult<Self> {
        let mut handlebars = Handlebars::new();

        // Plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        handlebars
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        let builder = Self {
            handlebars,
            source_id: source_id.to_string(),
        };
        builder.check_placeholders()?;

        tracing::debug!("Prompt template '{}' ready", builder.source_id);
        Ok(builder)
    }

    /// Identifier of the template in use ("builtin" or the definition id).
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Build the prompt for a question and its ranked context texts.
    ///
    /// Context texts are joined one per line in the order given.
    pub fn build<I, S>(&self, question: &str, context_texts: I) -> AppResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let context = format_context(context_texts);
        self.render(question, &context)
    }

    fn render(&self, question: &str, context: &str) -> AppResult<String> {
        let mut variables = HashMap::with_capacity(2);
        variables.insert(QUESTION_VAR, question);
        variables.insert(CONTEXT_VAR, context);

        self.handlebars
            .render(TEMPLATE_NAME, &variables)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
    }

    /// Fail unless the template text itself contains `marker`.
    pub fn ensure_marker(&self, marker: &str) -> AppResult<()> {
        let rendered = self.render_sentinels()?;
        if rendered.contains(marker) {
            return Ok(());
        }
        Err(AppError::Config(format!(
            "Prompt template '{}' does not contain the answer marker '{}'",
            self.source_id, marker
        )))
    }

    fn render_sentinels(&self) -> AppResult<String> {
        self.render(QUESTION_SENTINEL, CONTEXT_SENTINEL)
    }

    /// Render sentinel values and make sure both show up in the output.
    fn check_placeholders(&self) -> AppResult<()> {
        let rendered = self.render_sentinels()?;

        for (sentinel, name) in [
            (QUESTION_SENTINEL, QUESTION_VAR),
            (CONTEXT_SENTINEL, CONTEXT_VAR),
        ] {
            if !rendered.contains(sentinel) {
                return Err(AppError::Prompt(format!(
                    "Template '{}' does not use the {{{{{}}}}} placeholder",
                    self.source_id, name
                )));
            }
        }

        Ok(())
    }
}

/// Join context texts into a block, each followed by a newline.
pub fn format_context<I, S>(texts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts.into_iter().fold(String::new(), |mut block, text| {
        block.push_str(text.as_ref());
        block.push('\n');
        block
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_context_keeps_order() {
        let block = format_context(["second best", "best", "third"]);
        assert_eq!(block, "second best\nbest\nthird\n");
    }

    #[test]
    fn test_format_context_empty() {
        assert_eq!(format_context(Vec::<String>::new()), "");
    }

    #[test]
    fn test_build_with_default_template() {
        let builder = PromptBuilder::new().unwrap();
        let prompt = builder
            .build("What is <Rust>?", ["Rust is a language.", "It is fast."])
            .unwrap();

        assert!(prompt.contains("### Question:\nWhat is <Rust>?"));
        assert!(prompt.contains("Rust is a language.\nIt is fast.\n"));
        assert!(prompt.ends_with(DEFAULT_ANSWER_MARKER));
        assert_eq!(builder.source_id(), "builtin");
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::new().unwrap();
        let first = builder.build("q", ["a", "b"]).unwrap();
        let second = builder.build("q", ["a", "b"]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_template() {
        let builder =
            PromptBuilder::with_template("custom", "Q={{question}}|C={{context}}|A:").unwrap();
        let prompt = builder.build("why", ["because"]).unwrap();
        assert_eq!(prompt, "Q=why|C=because\n|A:");
    }

    #[test]
    fn test_ensure_marker() {
        let builtin = PromptBuilder::new().unwrap();
        assert!(builtin.ensure_marker(DEFAULT_ANSWER_MARKER).is_ok());

        let custom =
            PromptBuilder::with_template("custom", "Q={{question}}|C={{context}}|A:").unwrap();
        assert!(custom.ensure_marker("|A:").is_ok());
        let err = custom.ensure_marker(DEFAULT_ANSWER_MARKER).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("'custom'"));
    }

    #[test]
    fn test_template_missing_context_placeholder() {
        let result = PromptBuilder::with_template("broken", "Question: {{question}}");
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_template_unknown_variable_rejected() {
        let result =
            PromptBuilder::with_template("strict", "{{question}} {{context}} {{history}}");
        assert!(result.is_err());
    }
}
