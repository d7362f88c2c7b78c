// Prompts for lesson worksheet generation.

pub const WORKSHEET_SYSTEM: &str = r#"You are an experienced teacher who designs lesson worksheets.
You write clear learning objectives, practical teaching suggestions and well-formed assessment items.
You always answer with a single valid JSON object and nothing else."#;

/// Worksheet prompt. Placeholders: `{learning_content}`, `{requirements}`,
/// `{language_instruction}`, `{escaping_instruction}`.
pub const WORKSHEET_PROMPT_TEMPLATE: &str = r#"Learning content: {learning_content}
{requirements}
Design a worksheet for this content and return JSON in exactly this format:
{
    "theme": "Overall theme of the lesson",
    "topic": "Specific topic",
    "learning_focus": "What students concentrate on",
    "learning_outcome": "What students can do after the lesson",
    "teaching_suggestions": ["Suggestion 1", "Suggestion 2"],
    "worksheet_title": "Title printed on the worksheet",
    "quiz_data": [
        {"question": "Question text", "answer": "Expected answer"}
    ],
    "answer": "Answer key for the whole worksheet",
    "multiple_choice": [
        {"question": "Question text", "options": ["A. ...", "B. ...", "C. ...", "D. ..."], "answer": "A"}
    ],
    "short_answer_questions": ["Question 1", "Question 2"],
    "filename": "Suggested file name without the .docx extension"
}

Requirements:
1. Fill every field; use empty strings or empty lists only when a field truly does not apply.
2. Keep questions appropriate to the learning content.
3. {language_instruction}
4. {escaping_instruction}

Return valid JSON only, with no other commentary."#;

pub fn build_worksheet_prompt(learning_content: &str, user_requirements: Option<&str>) -> String {
    let requirements = match user_requirements.map(str::trim) {
        Some(r) if !r.is_empty() => format!("Additional requirements from the teacher: {r}\n"),
        _ => String::new(),
    };
    WORKSHEET_PROMPT_TEMPLATE
        .replace("{language_instruction}", crate::llm_client::prompts::SAME_LANGUAGE_INSTRUCTION)
        .replace("{escaping_instruction}", crate::llm_client::prompts::JSON_ESCAPING_INSTRUCTION)
        .replace("{requirements}", &requirements)
        .replace("{learning_content}", learning_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements_line_only_when_present() {
        let with = build_worksheet_prompt("Photosynthesis", Some("Grade 5, ten questions"));
        assert!(with.contains("Additional requirements from the teacher: Grade 5, ten questions"));

        let without = build_worksheet_prompt("Photosynthesis", Some("   "));
        assert!(!without.contains("Additional requirements"));
        assert!(!without.contains("{requirements}"));
        assert!(without.starts_with("Learning content: Photosynthesis"));
    }
}
