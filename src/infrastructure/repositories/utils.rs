pub fn escape_like_pattern(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `LIKE` pattern matching every value that starts with `prefix`.
pub fn prefix_pattern(prefix: &str) -> String {
    format!("{}%", escape_like_pattern(prefix))
}

/// `ILIKE` pattern matching every value containing `needle`.
pub fn contains_pattern(needle: &str) -> String {
    format!("%{}%", escape_like_pattern(needle))
}
