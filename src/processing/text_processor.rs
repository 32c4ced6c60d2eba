//! Text normalization and tokenization shared by the matchers

use unicode_segmentation::UnicodeSegmentation;

/// A candidate phrase: `tokens` consecutive folded tokens joined by one space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub text: String,
    pub tokens: usize,
    pub start: usize,
}

/// Normalize typographic characters that PDF and OCR output are full of
pub fn normalize_unicode(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'', // Smart quotes to regular quotes
            '\u{201C}' | '\u{201D}' => '"',  // Smart double quotes
            '\u{2010}'..='\u{2015}' => '-',  // Hyphens, en dash, em dash
            '\u{2022}' | '\u{25CF}' | '\u{25AA}' => '\n', // Bullets start a new item
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ', // Non-breaking spaces
            '\u{2026}' => '.',
            _ => c,
        })
        .collect()
}

/// Comparison key: lowercase, keep alphanumerics, `+` and `#`, and collapse
/// everything else into single spaces.
///
/// `"Node.js"` folds to `"node js"`, `"CI/CD"` to `"ci cd"`, `"C++"` stays `"c++"`.
pub fn fold(text: &str) -> String {
    tokenize(text).join(" ")
}

/// Split text into folded tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_alphanumeric() || c == '+' || c == '#' {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// All n-grams of 1..=max_n tokens, in text order (shorter grams first at each position)
pub fn ngrams(tokens: &[String], max_n: usize) -> Vec<Phrase> {
    let mut phrases = Vec::new();

    for start in 0..tokens.len() {
        for n in 1..=max_n {
            let end = start + n;
            if end > tokens.len() {
                break;
            }
            phrases.push(Phrase {
                text: tokens[start..end].join(" "),
                tokens: n,
                start,
            });
        }
    }

    phrases
}

pub fn non_whitespace_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

pub fn alphanumeric_chars(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphanumeric()).count()
}

/// Words as defined by Unicode segmentation rules
pub fn words(text: &str) -> Vec<&str> {
    text.unicode_words().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_keeps_tech_punctuation() {
        assert_eq!(fold("Node.js"), "node js");
        assert_eq!(fold("CI/CD"), "ci cd");
        assert_eq!(fold("C++ and C#"), "c++ and c#");
        assert_eq!(fold("  scikit-learn, "), "scikit learn");
        assert_eq!(fold("Bachelor's"), "bachelor s");
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" ,.;  ").is_empty());
    }

    #[test]
    fn test_ngrams_order_and_bounds() {
        let tokens = tokenize("machine learning engineer");
        let grams = ngrams(&tokens, 2);
        let texts: Vec<&str> = grams.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["machine", "machine learning", "learning", "learning engineer", "engineer"]
        );
        assert_eq!(grams[1].tokens, 2);
        assert_eq!(grams[2].start, 1);
    }

    #[test]
    fn test_normalize_unicode() {
        assert_eq!(normalize_unicode("3\u{2013}5 years"), "3-5 years");
        assert_eq!(normalize_unicode("\u{201C}quoted\u{201D}"), "\"quoted\"");
        assert_eq!(normalize_unicode("a\u{00A0}b"), "a b");
    }

    #[test]
    fn test_character_counts() {
        assert_eq!(non_whitespace_chars(" a b\n c "), 3);
        assert_eq!(alphanumeric_chars("a-b c!"), 3);
    }
}
