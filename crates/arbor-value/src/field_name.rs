//! Struct and field name rules.
//!
//! Valid names match `[A-Za-z][A-Za-z0-9_]*`. Struct names may additionally
//! be empty (anonymous structs).
//!
//! Producers building structs from loosely-structured sources (CSV headers,
//! JSON keys) can map arbitrary input onto valid names with
//! [`escape_struct_field`] (reversible) or [`camel_case_field_name`]
//! (best-effort, lossy).

use crate::error::{ValueError, ValueResult};

/// Marker introducing an escaped character in [`escape_struct_field`].
pub const ESCAPE_CHAR: char = 'Q';

fn is_head_char(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

fn is_tail_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Returns whether `name` is valid as a struct field name.
///
/// # Examples
///
/// ```
/// use arbor_value::field_name::is_valid_struct_field_name;
///
/// assert!(is_valid_struct_field_name("a1_B"));
/// assert!(!is_valid_struct_field_name("1ab"));
/// assert!(!is_valid_struct_field_name(""));
/// assert!(!is_valid_struct_field_name("a b"));
/// ```
pub fn is_valid_struct_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_head_char(first) => chars.all(is_tail_char),
        _ => false,
    }
}

pub fn verify_field_name(name: &str) -> ValueResult<()> {
    if is_valid_struct_field_name(name) {
        return Ok(());
    }
    Err(ValueError::InvalidIdentifier {
        name: name.to_string(),
        context: " field",
    })
}

/// Struct names follow field rules but may be empty.
pub fn verify_struct_name(name: &str) -> ValueResult<()> {
    if name.is_empty() || is_valid_struct_field_name(name) {
        return Ok(());
    }
    Err(ValueError::InvalidIdentifier {
        name: name.to_string(),
        context: "",
    })
}

/// Walk `input`, checking the first character against the head class and
/// every later one against the tail class, and let `encode` decide what each
/// character becomes.
fn map_field_chars(input: &str, mut encode: impl FnMut(char, bool, &mut String)) -> String {
    let mut output = String::with_capacity(input.len());
    for (i, ch) in input.chars().enumerate() {
        let allowed = if i == 0 { is_head_char(ch) } else { is_tail_char(ch) };
        encode(ch, allowed, &mut output);
    }
    output
}

/// Escape arbitrary input into a valid field name.
///
/// Disallowed characters become `Q` followed by the upper-case hex of their
/// UTF-8 bytes. `Q` itself is always escaped, so the transform is
/// reversible. Input that is already valid and contains no `Q` is returned
/// unchanged.
pub fn escape_struct_field(input: &str) -> String {
    if !input.contains(ESCAPE_CHAR) && is_valid_struct_field_name(input) {
        return input.to_string();
    }
    map_field_chars(input, |ch, allowed, out| {
        if allowed && ch != ESCAPE_CHAR {
            out.push(ch);
            return;
        }
        let mut utf8 = [0u8; 4];
        out.push(ESCAPE_CHAR);
        out.push_str(&hex::encode_upper(ch.encode_utf8(&mut utf8).as_bytes()));
    })
}

/// Best-effort camel-casing of arbitrary input.
///
/// Disallowed characters are stripped (spaces are kept as word breaks), the
/// first word is lower-cased and the rest capitalised. Returns an empty
/// string if the result is still not a valid field name.
pub fn camel_case_field_name(input: &str) -> String {
    let stripped = map_field_chars(input, |ch, allowed, out| {
        if allowed || ch == ' ' {
            out.push(ch);
        }
    });

    let mut words = stripped.split_whitespace();
    let Some(first) = words.next() else {
        return String::new();
    };

    let mut output = first.to_lowercase();
    for word in words {
        let lower = word.to_lowercase();
        let mut chars = lower.chars();
        if let Some(head) = chars.next() {
            output.extend(head.to_uppercase());
            output.push_str(chars.as_str());
        }
    }

    if !is_valid_struct_field_name(&output) {
        return String::new();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_grammar() {
        assert!(is_valid_struct_field_name("a1_B"));
        assert!(is_valid_struct_field_name("Z"));
        assert!(!is_valid_struct_field_name("1ab"));
        assert!(!is_valid_struct_field_name(""));
        assert!(!is_valid_struct_field_name("a b"));
        assert!(!is_valid_struct_field_name("_a"));
        assert!(!is_valid_struct_field_name("añ"));
    }

    #[test]
    fn struct_names_may_be_empty() {
        assert!(verify_struct_name("").is_ok());
        assert!(verify_field_name("").is_err());
        assert!(matches!(
            verify_struct_name("9lives"),
            Err(ValueError::InvalidIdentifier { context: "", .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Escaping
    // -----------------------------------------------------------------------

    #[test]
    fn escape_valid_name_is_identity() {
        assert_eq!(escape_struct_field("abc_1"), "abc_1");
    }

    #[test]
    fn escape_space() {
        let escaped = escape_struct_field("a b");
        assert_eq!(escaped, "aQ20b");
        assert!(is_valid_struct_field_name(&escaped));
    }

    #[test]
    fn escape_leading_digit_and_marker() {
        assert_eq!(escape_struct_field("1a"), "Q31a");
        assert_eq!(escape_struct_field("Qa"), "Q51a");
        assert_eq!(escape_struct_field("aQ"), "aQ51");
    }

    #[test]
    fn escape_multibyte_char() {
        let escaped = escape_struct_field("caf\u{e9}");
        assert_eq!(escaped, "cafQC3A9");
        assert!(is_valid_struct_field_name(&escaped));
    }

    #[test]
    fn escape_always_yields_valid_name() {
        for input in ["", "-", " x ", "a.b.c", "~~", "日本"] {
            let escaped = escape_struct_field(input);
            if !input.is_empty() {
                assert!(is_valid_struct_field_name(&escaped), "{input:?} -> {escaped:?}");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Camel case
    // -----------------------------------------------------------------------

    #[test]
    fn camel_case_joins_words() {
        assert_eq!(camel_case_field_name("hello world"), "helloWorld");
        assert_eq!(camel_case_field_name("  FIRST  name "), "firstName");
        assert_eq!(camel_case_field_name("zip-code"), "zipcode");
    }

    #[test]
    fn camel_case_returns_empty_when_unfixable() {
        assert_eq!(camel_case_field_name(""), "");
        assert_eq!(camel_case_field_name("---"), "");
        assert_eq!(camel_case_field_name(" 1a"), "");
    }
}
