use localchat_core::types::ScoredUnit;

pub const NO_DOCS_NOTE: &str = "[No local documents found]";
pub const CONTEXT_INSTRUCTION: &str = "Use the CONTEXT information if it is relevant. When citing, reference [n] and the file.";

/// Wrap `user_input` with numbered, truncated paragraphs from `hits`.
pub fn augment(user_input: &str, hits: &[ScoredUnit], preview_chars: usize) -> String {
    if hits.is_empty() {
        return format!("{}\n\n{}", user_input, NO_DOCS_NOTE);
    }
    let context = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("[{}] {}: {}", i + 1, hit.id, preview(&hit.text, preview_chars)))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{}\n\nCONTEXT:\n{}\n\nQUESTION:\n{}", CONTEXT_INSTRUCTION, context, user_input)
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}
