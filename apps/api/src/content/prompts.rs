// Prompts for slide-deck content generation.

pub const DECK_SYSTEM: &str = crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// Deck generation prompt. Placeholders: `{user_input}`, `{expected_slides}`,
/// `{language_instruction}`, `{escaping_instruction}`.
pub const DECK_PROMPT_TEMPLATE: &str = r#"User content for the presentation: {user_input}
Expected number of slides: {expected_slides}

Analyse the topic and content of the user's request, then produce a slide deck.

Return JSON in exactly this format:
{
    "title": "Presentation title",
    "filename": "Suggested file name without the .pptx extension",
    "slides": [
        {
            "type": "title",
            "title": "Main title",
            "subtitle": "Subtitle"
        },
        {
            "type": "content",
            "title": "Part one title",
            "content_type": "bullet_list",
            "content": ["Point 1", "Point 2", "Point 3"]
        },
        {
            "type": "content",
            "title": "Part two title",
            "content_type": "paragraph",
            "content": "A complete paragraph that explains one concept or argument in detail."
        },
        {
            "type": "content",
            "title": "Part N title",
            "content_type": "title_paragraph",
            "content": {
                "subtitle": "Sub-heading",
                "text": "Detailed explanation under the sub-heading."
            }
        },
        {
            "type": "content",
            "title": "Summary title",
            "content_type": "paragraph",
            "content": "A concise paragraph that summarises the whole presentation."
        }
    ]
}

Content types:
- "bullet_list": a list of bullet points
- "paragraph": one complete paragraph
- "title_paragraph": a sub-heading followed by a paragraph

Requirements:
1. Produce exactly {expected_slides} slides, counting the title slide and the table of contents.
2. Every content slide needs a clear title; titles are used to build the table of contents.
3. Choose the content_type that suits each slide.
4. Pick a fitting presentation title and file name.
5. Content must be substantial and match the user's request.
6. {language_instruction}
7. {escaping_instruction}

Return valid JSON only, with no other commentary."#;

pub fn build_deck_prompt(user_input: &str, expected_slides: u32) -> String {
    DECK_PROMPT_TEMPLATE
        .replace("{language_instruction}", crate::llm_client::prompts::SAME_LANGUAGE_INSTRUCTION)
        .replace("{escaping_instruction}", crate::llm_client::prompts::JSON_ESCAPING_INSTRUCTION)
        .replace("{expected_slides}", &expected_slides.to_string())
        .replace("{user_input}", user_input)
}
