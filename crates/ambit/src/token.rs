//! # Tokens
//!
//! The token stream is produced by an external tokenizer. Each token keeps
//! its surface text, a coarse kind (part of speech, entity class, ...), an
//! open set of tags and the half-open character span it came from.
//!
//! Token identity for caching is structural: see
//! [`Fingerprint`](crate::incremental::Fingerprint), which ignores the span.

use crate::text::{TextRange, TextSize};
use compact_str::CompactString;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Inline capacity for token tags; most tokens carry one or two.
pub type TagSet = SmallVec<[CompactString; 4]>;

/// A tagged token with its source span
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Token {
    /// Surface text as typed
    pub text: CompactString,
    /// Coarse token kind assigned by the tokenizer
    pub kind: CompactString,
    /// Additional tags (e.g. `comparative`, `pronoun`)
    #[cfg_attr(feature = "serialize", serde(default))]
    pub tags: TagSet,
    /// Half-open character span in the source request
    pub span: TextRange,
    /// Set when the tokenizer merged several surface words into this token
    #[cfg_attr(feature = "serialize", serde(default))]
    pub merged: bool,
}

impl Token {
    /// Create an untagged token
    #[must_use]
    pub fn new(text: impl Into<CompactString>, kind: impl Into<CompactString>, span: TextRange) -> Self {
        Self {
            text: text.into(),
            kind: kind.into(),
            tags: TagSet::new(),
            span,
            merged: false,
        }
    }

    /// Add a tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<CompactString>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Mark the token as a merge of several surface words
    #[must_use]
    pub const fn merged(mut self, merged: bool) -> Self {
        self.merged = merged;
        self
    }

    /// Text after trimming and lowercasing; used for literal matching and fingerprints
    #[must_use]
    pub fn normalized_text(&self) -> CompactString {
        normalize(&self.text)
    }

    /// Check whether the token carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Normalize surface text: trim surrounding whitespace and lowercase
#[must_use]
pub fn normalize(text: &str) -> CompactString {
    let trimmed = text.trim();
    if trimmed.chars().any(char::is_uppercase) {
        trimmed.to_lowercase().into()
    } else {
        trimmed.into()
    }
}

/// Build a token stream from whitespace-separated words, assigning spans.
///
/// `classify` returns the kind and tags for each word. Handy for tests and
/// the command-line tool; production callers bring their own tokenizer.
pub fn tokenize_words<F>(input: &str, mut classify: F) -> Vec<Token>
where
    F: FnMut(&str) -> (CompactString, TagSet),
{
    let mut tokens = Vec::new();
    let mut offset = 0u32;
    let mut start: Option<u32> = None;

    let mut flush = |start: u32, end: u32, tokens: &mut Vec<Token>| {
        let word: String = input
            .chars()
            .skip(start as usize)
            .take((end - start) as usize)
            .collect();
        let (kind, tags) = classify(&word);
        tokens.push(Token {
            text: word.into(),
            kind,
            tags,
            span: TextRange::new(TextSize::from(start), TextSize::from(end)),
            merged: false,
        });
    };

    for ch in input.chars() {
        if ch.is_whitespace() {
            if let Some(begin) = start.take() {
                flush(begin, offset, &mut tokens);
            }
        } else if start.is_none() {
            start = Some(offset);
        }
        offset += 1;
    }
    if let Some(begin) = start {
        flush(begin, offset, &mut tokens);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Brighter "), "brighter");
        assert_eq!(normalize("it"), "it");
    }

    #[test]
    fn test_tokenize_words_assigns_char_spans() {
        let tokens = tokenize_words("make  it brighter", |_| ("WORD".into(), TagSet::new()));
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].span, TextRange::new(TextSize::from(0), TextSize::from(4)));
        assert_eq!(tokens[1].span, TextRange::new(TextSize::from(6), TextSize::from(8)));
        assert_eq!(tokens[2].text, "brighter");
        assert_eq!(tokens[2].span.end(), TextSize::from(17));
    }

    #[test]
    fn test_tags() {
        let token = Token::new("it", "PRON", TextRange::default()).with_tag("pronoun");
        assert!(token.has_tag("pronoun"));
        assert!(!token.has_tag("noun"));
    }
}
