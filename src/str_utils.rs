/// Safely returns a prefix of the string with at most `max_chars` characters.
/// This respects UTF-8 character boundaries.
pub fn prefix_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Prefix for log lines, with a marker when something was cut.
pub fn preview(s: &str, max_chars: usize) -> String {
    let head = prefix_chars(s, max_chars);
    if head.len() < s.len() {
        format!("{}… [{} bytes total]", head, s.len())
    } else {
        head.to_string()
    }
}
