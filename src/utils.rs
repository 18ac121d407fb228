/// Shared utility functions

/// Safely truncate a string at a UTF-8 boundary
pub fn safe_truncate(s: &str, max_bytes: usize) -> &str {
    if max_bytes >= s.len() { return s; }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Parse a 1-based activity number as typed by the user into an index
pub fn parse_activity_number(input: &str) -> Option<usize> {
    input.trim().parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_truncate_ascii() {
        assert_eq!(safe_truncate("hello", 3), "hel");
        assert_eq!(safe_truncate("hello", 10), "hello");
        assert_eq!(safe_truncate("hello", 5), "hello");
    }

    #[test]
    fn test_safe_truncate_utf8() {
        // 'æ' and 'ø' take two bytes each
        let s = "æøå";
        assert_eq!(safe_truncate(s, 3), "æ");
        assert_eq!(safe_truncate(s, 4), "æø");
        assert_eq!(safe_truncate(s, 1), "");
    }

    #[test]
    fn test_parse_activity_number() {
        assert_eq!(parse_activity_number("1"), Some(0));
        assert_eq!(parse_activity_number(" 3 "), Some(2));
        assert_eq!(parse_activity_number("0"), None);
        assert_eq!(parse_activity_number("to"), None);
    }
}
