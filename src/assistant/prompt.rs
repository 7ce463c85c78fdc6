//! Prompt assembly: personas, context wrapping, report templates, and the
//! token/cost arithmetic applied to provider responses.

use rust_decimal::Decimal;

pub const PERSONAS: &[&str] = &["general", "sales", "hr", "technical"];
pub const DEFAULT_PERSONA: &str = "general";
pub const REPORT_PERSONA: &str = "report_generation";

/// Only the most recent N history turns are forwarded to the model.
pub const HISTORY_LIMIT: usize = 5;

pub const FALLBACK_UNEXPECTED: &str = "Sorry, the format of the AI response was unexpected.";
pub const FALLBACK_EMPTY: &str = "Sorry, the AI returned an empty response.";
pub const REPORT_FALLBACK_UNEXPECTED: &str =
    "Sorry, the format of the AI report response was unexpected.";
pub const REPORT_FALLBACK_EMPTY: &str = "Sorry, the AI returned an empty report.";

pub fn system_prompt(persona: &str) -> &'static str {
    match persona {
        "sales" => {
            "You are a sales analytics assistant. Focus on sales figures, targets, and revenue trends."
        }
        "hr" => {
            "You are an HR assistant. Focus on employees, teams, engagement, and training matters."
        }
        "technical" => {
            "You are a technical support assistant. Give precise, step-by-step answers."
        }
        _ => "You are a helpful business assistant.",
    }
}

pub const REPORT_SYSTEM_PROMPT: &str = "You are a business analyst assistant specialized in \
creating HR and performance report summaries from provided data. Focus on trends, insights, and \
recommendations.";

pub const REPORT_LOG_PROMPT: &str = "Action: Generate Team Performance Report";

/// Wrap grounding data around the user's question, or pass it through
/// unchanged when no context was selected.
pub fn augment(prompt: &str, context: Option<&str>) -> String {
    match context {
        Some(data) => format!(
            "Use ONLY the following data to answer the user's question accurately. \
Do not make assumptions beyond this data.\n\nContext Data:\n```json\n{}\n```\n\nUser Question: {}",
            data, prompt
        ),
        None => prompt.to_string(),
    }
}

pub fn report_prompt(employee_data: &str) -> String {
    format!(
        "Given this JSON data representing employee information:\n\n```json\n{}\n```\n\n\
Summarize any concerning trends for management. Focus specifically on engagement scores, \
training completion percentages, and attendance rates across different teams or departments \
if possible. Provide actionable insights or recommendations based on the data. Format the \
summary clearly, perhaps using bullet points for key findings.",
        employee_data
    )
}

/// Rough character-based token estimate used when the provider reports no
/// usage figures.
pub fn estimate_tokens(text: &str) -> i64 {
    text.len().div_ceil(4) as i64
}

/// Per-token USD rates, first matching prefix wins. Order matters: the more
/// specific model names must come before their prefixes.
const COST_TABLE: &[(&str, fn() -> Decimal)] = &[
    ("gpt-4o-mini", || Decimal::new(15, 8)), // 0.00000015
    ("gpt-4o", || Decimal::new(5, 6)),       // 0.000005
    ("gpt-4-turbo", || Decimal::new(1, 5)),  // 0.00001
    ("gpt-4", || Decimal::new(3, 5)),        // 0.00003
    ("gpt-3.5-turbo", || Decimal::new(5, 7)), // 0.0000005
];

fn default_rate() -> Decimal {
    Decimal::new(1, 6) // 0.000001
}

pub fn cost_per_token(model: &str) -> Decimal {
    COST_TABLE
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, rate)| rate())
        .unwrap_or_else(default_rate)
}

pub fn estimate_cost(tokens: i64, model: &str) -> Decimal {
    Decimal::from(tokens.max(0)) * cost_per_token(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_augment_without_context() {
        assert_eq!(augment("hello", None), "hello");
    }

    #[test]
    fn test_augment_with_context() {
        let augmented = augment("What are Q1 sales?", Some(r#"[{"revenue":1}]"#));
        assert!(augmented.starts_with("Use ONLY the following data"));
        assert!(augmented.contains(r#"```json
[{"revenue":1}]
```"#));
        assert!(augmented.ends_with("User Question: What are Q1 sales?"));
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_cost_prefix_order() {
        // gpt-4o-mini must not fall into the gpt-4o or gpt-4 buckets
        assert_eq!(cost_per_token("gpt-4o-mini-2024-07-18"), Decimal::new(15, 8));
        assert_eq!(cost_per_token("gpt-4o-2024-05-13"), Decimal::new(5, 6));
        assert_eq!(cost_per_token("gpt-4-turbo-preview"), Decimal::new(1, 5));
        assert_eq!(cost_per_token("gpt-4-0613"), Decimal::new(3, 5));
        assert_eq!(cost_per_token("gpt-3.5-turbo"), Decimal::new(5, 7));
    }

    #[test]
    fn test_unknown_model_uses_default_rate() {
        assert_eq!(cost_per_token("claude-haiku"), Decimal::new(1, 6));
    }

    #[test]
    fn test_estimate_cost() {
        assert_eq!(estimate_cost(1000, "gpt-4o-mini"), Decimal::new(15, 5));
        assert_eq!(estimate_cost(-5, "gpt-4o-mini"), Decimal::ZERO);
    }

    #[test]
    fn test_persona_prompts_distinct() {
        let prompts: Vec<_> = PERSONAS.iter().map(|p| system_prompt(p)).collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        assert_eq!(system_prompt("unknown"), system_prompt("general"));
    }
}
