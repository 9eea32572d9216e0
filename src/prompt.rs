use crate::constants::{ANSWER_INDEX_BASE, JSON_ONLY_INSTRUCTION};

/// Builds the user message sent upstream: the prompt, an optional tags line and
/// the JSON-only instruction.
pub fn build_user_message(prompt: &str, tags: &[String]) -> String {
    let mut parts = vec![prompt.to_string()];

    if !tags.is_empty() {
        let tags_str = tags
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("\nTags to consider: {}", tags_str));
    }

    parts.push(format!("\n{}", JSON_ONLY_INSTRUCTION));

    parts.join("\n")
}

pub fn default_system_prompt() -> String {
    let index_convention = if ANSWER_INDEX_BASE == 0 {
        "zero-based"
    } else {
        "one-based"
    };
    let correct = ANSWER_INDEX_BASE;

    format!(
        r#"You are a helpful Quiz master with extensive knowledge in various subjects.
You have knowledge of various competitive exams for general knowledge which are conducted in India.
Some of the exams are:
- UPSC Civil Services Exam
- Common law entrance test (CLAT)
You are expected to use this knowledge to generate questions and answers in JSON format
based on the user prompt. The JSON should include a question, multiple choice options, and the {index_convention} index of the correct answer.

Key requirements:
- Use the sample JSON provided below as a template
- Always generate structured JSON based on the user prompts
- Always respond with valid JSON
- Include relevant metadata when appropriate

Sample JSON format:
{{
    "question": "What is the main difference between CAMT.035 and PACS.002?",
    "options": [
        "CAMT.035 is for acknowledgement, PACS.002 is for final status",
        "They are the same message",
        "PACS.002 is for acknowledgement, CAMT.035 is for final status",
        "CAMT.035 is only for domestic payments"
    ],
    "correct": {correct}
}}"#
    )
}
