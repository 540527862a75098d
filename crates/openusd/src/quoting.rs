/// Characters that make a string unsafe to paste into a shell unquoted
const SPECIAL_CHARACTERS: [char; 9] = [' ', '\\', '"', '!', '$', '\'', '{', '}', ','];

/// Single-quote `s` if it contains shell-special characters.
///
/// Only meant for commands echoed in diagnostics; it is not a general
/// shell escaping routine.
pub fn quoted_if_necessary(s: &str) -> String {
    if s.contains(SPECIAL_CHARACTERS) {
        format!("'{}'", s.replace('\'', r"'\''"))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_strings_unchanged() {
        assert_eq!(quoted_if_necessary("checkout"), "checkout");
        assert_eq!(quoted_if_necessary("v25.05"), "v25.05");
        assert_eq!(quoted_if_necessary(""), "");
    }

    #[test]
    fn test_special_characters_quoted() {
        assert_eq!(quoted_if_necessary("my dir"), "'my dir'");
        assert_eq!(quoted_if_necessary("$HOME"), "'$HOME'");
        assert_eq!(quoted_if_necessary("a,b"), "'a,b'");
        assert_eq!(quoted_if_necessary("{x}"), "'{x}'");
    }

    #[test]
    fn test_single_quote_escaped() {
        assert_eq!(quoted_if_necessary("it's"), r"'it'\''s'");
    }
}
