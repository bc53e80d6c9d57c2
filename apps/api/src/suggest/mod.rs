//! Content suggestions: thin, validated wrappers over the LLM client.
//!
//! Two operations: bullet-point suggestions from a job title + industry,
//! and a project summary distilled from raw README text. Model output is
//! validated against a fixed shape before it reaches the caller; anything
//! malformed surfaces as a recoverable suggestion error.

pub mod handlers;
mod prompts;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm::LlmClient;

const MAX_BULLETS: usize = 8;
const MAX_README_CHARS: usize = 20_000;

/// Structured output of the project-summary suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
}

/// Suggests resume bullet points for a role.
pub async fn suggest_bullets(
    llm: &LlmClient,
    job_title: &str,
    industry: &str,
) -> Result<Vec<String>, AppError> {
    if job_title.trim().is_empty() {
        return Err(AppError::Validation("job_title must not be empty".to_string()));
    }

    let prompt = prompts::BULLETS_PROMPT_TEMPLATE
        .replace("{job_title}", job_title.trim())
        .replace("{industry}", industry.trim());

    let bullets: Vec<String> = llm
        .call_json(&prompt, prompts::SUGGEST_SYSTEM)
        .await
        .map_err(|e| AppError::Suggestion(e.to_string()))?;

    validate_bullets(bullets)
}

fn validate_bullets(bullets: Vec<String>) -> Result<Vec<String>, AppError> {
    let bullets: Vec<String> = bullets
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .take(MAX_BULLETS)
        .collect();
    if bullets.is_empty() {
        return Err(AppError::Suggestion(
            "model returned no usable bullets".to_string(),
        ));
    }
    Ok(bullets)
}

/// Distills a project README into `{ name, description, technologies }`.
pub async fn summarize_readme(
    llm: &LlmClient,
    readme: &str,
) -> Result<ProjectSummary, AppError> {
    let readme = readme.trim();
    if readme.is_empty() {
        return Err(AppError::Validation("readme must not be empty".to_string()));
    }
    // Truncate oversized READMEs instead of rejecting them.
    let readme: String = readme.chars().take(MAX_README_CHARS).collect();

    let prompt = prompts::README_PROMPT_TEMPLATE.replace("{readme}", &readme);

    let summary: ProjectSummary = llm
        .call_json(&prompt, prompts::SUGGEST_SYSTEM)
        .await
        .map_err(|e| AppError::Suggestion(e.to_string()))?;

    validate_summary(summary)
}

fn validate_summary(summary: ProjectSummary) -> Result<ProjectSummary, AppError> {
    if summary.name.trim().is_empty() || summary.description.trim().is_empty() {
        return Err(AppError::Suggestion(
            "model returned an incomplete project summary".to_string(),
        ));
    }
    Ok(ProjectSummary {
        name: summary.name.trim().to_string(),
        description: summary.description.trim().to_string(),
        technologies: summary
            .technologies
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bullets_trims_and_caps() {
        let raw: Vec<String> = (0..12).map(|i| format!("  bullet {i}  ")).collect();
        let bullets = validate_bullets(raw).unwrap();
        assert_eq!(bullets.len(), MAX_BULLETS);
        assert_eq!(bullets[0], "bullet 0");
    }

    #[test]
    fn test_validate_bullets_rejects_all_blank() {
        let err = validate_bullets(vec!["   ".to_string(), String::new()]).unwrap_err();
        assert!(matches!(err, AppError::Suggestion(_)));
    }

    #[test]
    fn test_validate_summary_requires_name_and_description() {
        let err = validate_summary(ProjectSummary {
            name: String::new(),
            description: "a tool".to_string(),
            technologies: vec![],
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Suggestion(_)));

        let ok = validate_summary(ProjectSummary {
            name: " folio ".to_string(),
            description: " a resume builder ".to_string(),
            technologies: vec![" rust ".to_string(), String::new()],
        })
        .unwrap();
        assert_eq!(ok.name, "folio");
        assert_eq!(ok.technologies, vec!["rust"]);
    }

    #[test]
    fn test_prompt_templates_fill_their_slots() {
        let prompt = prompts::BULLETS_PROMPT_TEMPLATE
            .replace("{job_title}", "Data Engineer")
            .replace("{industry}", "Healthcare");
        assert!(prompt.contains("Data Engineer"));
        assert!(prompt.contains("Healthcare"));
        assert!(!prompt.contains("{job_title}"));
    }
}
