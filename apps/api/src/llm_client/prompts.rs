// Shared prompt fragments.
// Each pipeline that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every generation prompt: keep the caller's language.
pub const SAME_LANGUAGE_INSTRUCTION: &str = "\
    Write every text field in the same language as the user's input. \
    If the input is in English, answer in English; if it is in Traditional Chinese, \
    answer in Traditional Chinese; if it is Cantonese, use formal written Cantonese. \
    Never switch or mix languages.";

/// Appended to every generation prompt: JSON escaping rules for formulas.
pub const JSON_ESCAPING_INSTRUCTION: &str = "\
    The JSON must parse. Escape backslashes in LaTeX formulas as double backslashes (\\\\) \
    and avoid invalid escape sequences.";
