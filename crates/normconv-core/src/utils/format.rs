use chrono::NaiveDate;

/// Format a date the way Korean clinical reports write it: "2023.07.15".
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}

/// Truncate a string to a maximum number of characters, adding an ellipsis
/// if needed. Never splits a multi-byte character.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Terminal column width of a string. Hangul and other wide characters
/// take two columns.
pub fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

fn char_width(c: char) -> usize {
    match c as u32 {
        // Hangul Jamo, CJK symbols through Yi, Hangul syllables,
        // compatibility ideographs, fullwidth forms
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6 => 2,
        _ => 1,
    }
}

/// Left-align `s` in a column `width` display columns wide.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let w = display_width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2023, 7, 5).unwrap();
        assert_eq!(format_date(date), "2023.07.05");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("수용언어표현언어", 5), "수용...");
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("수용"), 4);
        assert_eq!(display_width("22개월"), 6);
    }

    #[test]
    fn test_pad_to_width() {
        assert_eq!(pad_to_width("수용", 6), "수용  ");
        assert_eq!(pad_to_width("abc", 2), "abc");
    }
}
