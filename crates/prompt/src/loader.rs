//! Loads YAML prompt definitions that replace the built-in template.

use crate::types::PromptDefinition;
use docqa_core::{AppError, AppResult};
use std::path::Path;

/// Load and validate a prompt definition file.
///
/// # Example
/// ```no_run
/// use docqa_prompt::{load_prompt, PromptBuilder};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let definition = load_prompt(Path::new("prompts/answer.yml"))?;
/// let builder = PromptBuilder::from_definition(&definition)?;
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(path: &Path) -> AppResult<PromptDefinition> {
    tracing::debug!("Loading prompt from: {:?}", path);

    if !path.exists() {
        return Err(AppError::Prompt(format!("Prompt file not found: {:?}", path)));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e)))?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e)))?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PromptBuilder;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_prompt(
            temp_dir.path(),
            "answer.yml",
            "id: answer.ja\ntitle: Japanese\napiVersion: \"1.0\"\ntemplate: \"{{question}}\\n{{context}}###回答:\"\n",
        );

        let prompt = load_prompt(&path).unwrap();
        assert_eq!(prompt.id, "answer.ja");

        let builder = PromptBuilder::from_definition(&prompt).unwrap();
        let built = builder.build("質問", ["文脈"]).unwrap();
        assert_eq!(built, "質問\n文脈\n###回答:");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(&temp_dir.path().join("missing.yml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_prompt(temp_dir.path(), "bad.yml", "invalid: yaml: content:");
        assert!(load_prompt(&path).is_err());
    }

    #[test]
    fn test_load_bad_api_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_prompt(
            temp_dir.path(),
            "v.yml",
            "id: x\ntitle: x\napiVersion: \"1\"\ntemplate: \"{{question}}{{context}}\"\n",
        );
        assert!(load_prompt(&path).is_err());
    }
}
