//! Thread titles, derived once from the first user message.

pub const MAX_TITLE_CHARS: usize = 40;

const FALLBACK_TITLE: &str = "New chat";

/// First non-empty line, whitespace collapsed, cut at a word boundary
/// when longer than [`MAX_TITLE_CHARS`].
pub fn derive_title(first_message: &str) -> String {
    let line = first_message
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return FALLBACK_TITLE.to_string();
    }
    if collapsed.chars().count() <= MAX_TITLE_CHARS {
        return collapsed;
    }

    let cut: String = collapsed.chars().take(MAX_TITLE_CHARS).collect();
    let ends_on_word = collapsed.chars().nth(MAX_TITLE_CHARS) == Some(' ');
    let head = if ends_on_word {
        cut.as_str()
    } else {
        match cut.rfind(' ') {
            Some(idx) if idx > 0 => &cut[..idx],
            _ => cut.as_str(),
        }
    };

    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_is_kept() {
        assert_eq!(derive_title("hi"), "hi");
    }

    #[test]
    fn test_first_non_empty_line_with_collapsed_whitespace() {
        assert_eq!(derive_title("\n\n   hello    world  \nsecond line"), "hello world");
    }

    #[test]
    fn test_long_message_cut_at_word_boundary() {
        let title = derive_title("The quick brown fox jumps over the lazy dog again and again");
        assert_eq!(title, "The quick brown fox jumps over the lazy...");
    }

    #[test]
    fn test_cut_exactly_before_a_space_keeps_whole_word() {
        let head = format!("{} {}", "a".repeat(19), "b".repeat(20));
        assert_eq!(head.chars().count(), MAX_TITLE_CHARS);
        assert_eq!(derive_title(&format!("{} tail", head)), format!("{}...", head));
    }

    #[test]
    fn test_long_single_word_is_hard_cut() {
        let title = derive_title(&"a".repeat(50));
        assert_eq!(title, format!("{}...", "a".repeat(MAX_TITLE_CHARS)));
    }

    #[test]
    fn test_multibyte_text_is_cut_on_char_boundaries() {
        let title = derive_title(&"日本語 ".repeat(20));
        assert!(title.ends_with("..."));
        assert!(title.chars().count() <= MAX_TITLE_CHARS + 3);
    }

    #[test]
    fn test_blank_message_falls_back() {
        assert_eq!(derive_title("   \n  "), FALLBACK_TITLE);
    }
}
