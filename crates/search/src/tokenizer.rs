//! Text tokenizer
//!
//! Lowercases and splits on anything that is not alphanumeric. The same
//! function runs at index time and query time, so a term matches iff both
//! sides produced the same token.

/// Split `text` into lowercase alphanumeric tokens, in order
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Tokenize several values as one field, leaving a position gap between them
///
/// The gap keeps a phrase from matching across two tags.
pub fn tokenize_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(String, u32)> {
    let mut out = Vec::new();
    let mut position = 0u32;
    for value in values {
        for token in tokenize(value) {
            out.push((token, position));
            position += 1;
        }
        position += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(
            tokenize("Hello, World! Rust-lang 2024"),
            vec!["hello", "world", "rust", "lang", "2024"]
        );
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn test_unicode_words() {
        assert_eq!(tokenize("Café Über"), vec!["café", "über"]);
    }

    #[test]
    fn test_values_have_gaps() {
        let tokens = tokenize_values(["open source", "rust"]);
        assert_eq!(
            tokens,
            vec![
                ("open".to_string(), 0),
                ("source".to_string(), 1),
                ("rust".to_string(), 3)
            ]
        );
    }
}
