/// Render chunk text inline: CR/LF become spaces and whitespace runs collapse
/// to a single space, with no leading or trailing space.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
