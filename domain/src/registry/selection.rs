//! Task description tokenizer used for capability matching

/// Words that never carry capability information
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "for", "from", "has",
    "have", "i", "if", "in", "into", "is", "it", "its", "me", "my", "of", "on", "or", "our",
    "please", "should", "so", "that", "the", "their", "then", "there", "these", "this", "to",
    "us", "was", "we", "will", "with", "you", "your",
];

/// Split a task description into normalized terms.
///
/// Terms are lower-cased runs of alphanumeric characters and underscores
/// (capability tags such as `code_generation` stay intact). Stop words are
/// dropped; repeated terms are kept so that each occurrence contributes to
/// the score.
pub fn tokenize(description: &str) -> Vec<String> {
    description
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Normalize a capability tag to the single-term form `tokenize` yields.
///
/// `"Long-Context"` and `"code generation"` become `long_context` and
/// `code_generation`; a tag with no alphanumeric content becomes empty.
pub fn normalize_tag(tag: &str) -> String {
    tag.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}
