// Prompt constants for the suggestion module. All prompts demand JSON-only
// output; `LlmClient::call_json` strips stray fences before parsing.

/// Shared system prompt; enforces JSON-only output.
pub const SUGGEST_SYSTEM: &str =
    "You are an expert resume and portfolio writer. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Bullet suggestion template. Replace `{job_title}` and `{industry}`
/// before sending.
pub const BULLETS_PROMPT_TEMPLATE: &str = r#"Suggest resume bullet points for the role below.

Return a JSON array of 4 to 6 strings, for example:
["Led migration of billing pipeline to event-driven architecture", "Reduced page load time by 40% through query optimization"]

Rules:
- Each bullet starts with a strong action verb.
- Each bullet is one sentence, under 140 characters.
- Prefer concrete, quantifiable phrasing; leave numbers as realistic placeholders the user can adjust.
- No first-person pronouns.

ROLE: {job_title}
INDUSTRY: {industry}"#;

/// README distillation template. Replace `{readme}` before sending.
pub const README_PROMPT_TEMPLATE: &str = r#"Read the project README below and distill it for a portfolio card.

Return a JSON object with this EXACT schema (no extra fields):
{
  "name": "project name",
  "description": "two to three sentences describing what the project does and why it matters",
  "technologies": ["list", "of", "technologies"]
}

Rules:
- "name" comes from the README title when present.
- "description" is written for a non-expert reader.
- "technologies" lists only technologies actually mentioned in the README.

README:
{readme}"#;
