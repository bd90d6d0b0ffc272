use crate::config::PromptConfig;
use crate::rubric::Rubric;
use crate::scoring::SKIP_SENTINEL;

/// Build the analyst prompt asking a language model for raw subfactor scores.
///
/// The reply is expected in the shape [`super::parse_response`] accepts.
pub fn build_prompt(rubric: &Rubric, deck_text: &str, config: &PromptConfig) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a senior VC analyst. Score all categories strictly based on evidence in the pitch deck.\n\n",
    );
    prompt.push_str("IMPORTANT RULES:\n");
    prompt.push_str("- Score each subfactor from 0 to 100\n");
    for category in &rubric.categories {
        if let Some(skip) = &category.skip_subfactor {
            prompt.push_str(&format!(
                "- For **{}**, return 0-100 if the deck shows evidence, otherwise \"{}\"\n",
                skip, SKIP_SENTINEL
            ));
        }
    }
    if rubric.categories.iter().any(|c| c.is_skippable()) {
        prompt.push_str(&format!(
            "- If \"{}\", the whole category is skipped.\n",
            SKIP_SENTINEL
        ));
    }

    let closing = config
        .closing_line
        .as_deref()
        .map(|line| format!(" End with: {}", line))
        .unwrap_or_default();

    prompt.push_str("\nReturn ONLY valid JSON:\n");
    prompt.push_str("{\n");
    prompt.push_str("  \"scores\": {\n");
    prompt.push_str("    \"Category\": {\n");
    prompt.push_str(&format!(
        "      \"Subfactor\": number OR \"{}\"\n",
        SKIP_SENTINEL
    ));
    prompt.push_str("    }\n");
    prompt.push_str("  },\n");
    prompt.push_str(&format!(
        "  \"overall_improvement\": \"4-5 line improvement analysis. Do not mention skipped categories.{}\"\n",
        closing
    ));
    prompt.push_str("}\n\n");

    prompt.push_str("CATEGORIES:\n");
    prompt.push_str(&categories_json(rubric));
    prompt.push_str("\n\nPITCH:\n\"\"\"");
    prompt.push_str(&truncate_chars(deck_text, config.max_chars));
    prompt.push_str("\"\"\"\n");

    prompt
}

/// `{ "Category": ["Subfactor", ...], ... }` in rubric order.
fn categories_json(rubric: &Rubric) -> String {
    let lines: Vec<String> = rubric
        .categories
        .iter()
        .map(|c| {
            format!(
                "  {}: {}",
                serde_json::Value::from(c.name.as_str()),
                serde_json::Value::from(c.subfactors.clone())
            )
        })
        .collect();
    format!("{{\n{}\n}}", lines.join(",\n"))
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
