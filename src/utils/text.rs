pub fn truncate_utf8_prefix(value: &str, max_bytes: usize) -> String {
    if max_bytes == 0 {
        return String::new();
    }
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

/// Shortens `value` to `max_chars` characters, spending three of them on `...`.
pub fn ellipsize(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = value.chars().take(keep).collect();
    out.push_str("...");
    out
}

pub fn pad_end(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + width - len);
    out.push_str(value);
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_utf8_prefix_does_not_split_utf8() {
        assert_eq!(truncate_utf8_prefix("hello", 3), "hel");
        assert_eq!(truncate_utf8_prefix("a\u{e9}b", 2), "a");
        assert_eq!(truncate_utf8_prefix("a\u{e9}b", 3), "a\u{e9}");
    }

    #[test]
    fn ellipsize_keeps_short_values() {
        assert_eq!(ellipsize("short", 50), "short");
        let long = "x".repeat(51);
        let out = ellipsize(&long, 50);
        assert_eq!(out.chars().count(), 50);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn pad_end_counts_characters() {
        assert_eq!(pad_end("ab", 4), "ab  ");
        assert_eq!(pad_end("\u{e9}", 2), "\u{e9} ");
        assert_eq!(pad_end("abcdef", 2), "abcdef");
    }

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" x ")), Some("x"));
        assert_eq!(non_empty(None), None);
    }
}
