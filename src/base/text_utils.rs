//! Text manipulation utilities for working with COBOL source code.

/// Check if a character is considered part of a COBOL word.
///
/// Uses Unicode Standard Annex #31 continue rules plus the hyphen, which
/// COBOL allows inside user-defined words (`WS-CUSTOMER-ID`).
#[inline]
pub fn is_word_character(c: char) -> bool {
    c == '-' || unicode_ident::is_xid_continue(c)
}

/// Find the boundaries of a word at the given position.
///
/// Returns `Some((start, end))` where `start` is the character index of the word start
/// and `end` is the character index after the last word character.
/// Leading and trailing hyphens are not part of a word.
pub fn find_word_boundaries(chars: &[char], position: usize) -> Option<(usize, usize)> {
    if position >= chars.len() || !is_word_character(chars[position]) {
        return None;
    }

    let mut start = position;
    while start > 0 && is_word_character(chars[start - 1]) {
        start -= 1;
    }

    let mut end = position;
    while end < chars.len() && is_word_character(chars[end]) {
        end += 1;
    }

    while start < end && chars[start] == '-' {
        start += 1;
    }
    while end > start && chars[end - 1] == '-' {
        end -= 1;
    }

    (start < end && position >= start && position < end).then_some((start, end))
}

/// Extract the word at the cursor position in a line of text.
///
/// # Example
/// ```
/// use cobol_lsp::base::text_utils::extract_word_at_cursor;
///
/// let line = "           MOVE WS-NAME TO OUT-NAME";
/// assert_eq!(extract_word_at_cursor(line, 17), Some("WS-NAME".to_string()));
/// assert_eq!(extract_word_at_cursor(line, 3), None);
/// ```
pub fn extract_word_at_cursor(line: &str, position: usize) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    let (start, end) = find_word_boundaries(&chars, position)?;
    Some(chars[start..end].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_word_character() {
        assert!(is_word_character('a'));
        assert!(is_word_character('Z'));
        assert!(is_word_character('0'));
        assert!(is_word_character('-'));
        assert!(!is_word_character(' '));
        assert!(!is_word_character('.'));
    }

    #[test]
    fn test_find_word_boundaries_with_hyphen() {
        let chars: Vec<char> = "PERFORM 100-INIT.".chars().collect();
        assert_eq!(find_word_boundaries(&chars, 0), Some((0, 7)));
        assert_eq!(find_word_boundaries(&chars, 11), Some((8, 16)));
        assert_eq!(find_word_boundaries(&chars, 7), None);
        assert_eq!(find_word_boundaries(&chars, 16), None);
    }

    #[test]
    fn test_dangling_hyphen_is_not_a_word() {
        assert_eq!(extract_word_at_cursor("A - B", 2), None);
    }

    #[test]
    fn test_extract_word_out_of_bounds() {
        assert_eq!(extract_word_at_cursor("ABC", 100), None);
        assert_eq!(extract_word_at_cursor("", 0), None);
    }
}
