//! Position-independent token identity

use crate::token::Token;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::hash::{BuildHasher, Hash, Hasher};
use std::ops::Range;

/// Fixed keys, so fingerprint hashes agree across processes
const FINGERPRINT_HASH: ahash::RandomState = ahash::RandomState::with_seeds(
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
);

/// Structural identity of a token: normalized text, kind, sorted and
/// deduplicated tags, and the merged flag. The span is deliberately left
/// out so that edits elsewhere in the request do not change it.
#[derive(Debug, Clone, Eq)]
pub struct Fingerprint {
    text: CompactString,
    kind: CompactString,
    tags: SmallVec<[CompactString; 4]>,
    merged: bool,
    hash: u64,
}

impl Fingerprint {
    #[must_use]
    pub fn of(token: &Token) -> Self {
        let mut tags: SmallVec<[CompactString; 4]> = token.tags.clone();
        tags.sort_unstable();
        tags.dedup();
        let text = token.normalized_text();

        let mut hasher = FINGERPRINT_HASH.build_hasher();
        text.hash(&mut hasher);
        token.kind.hash(&mut hasher);
        tags.hash(&mut hasher);
        token.merged.hash(&mut hasher);

        Self {
            text,
            kind: token.kind.clone(),
            tags,
            merged: token.merged,
            hash: hasher.finish(),
        }
    }

    /// Precomputed content hash
    #[must_use]
    pub const fn hash_value(&self) -> u64 {
        self.hash
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn tags(&self) -> &[CompactString] {
        &self.tags
    }

    #[must_use]
    pub const fn merged(&self) -> bool {
        self.merged
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.merged == other.merged
            && self.text == other.text
            && self.kind == other.kind
            && self.tags == other.tags
    }
}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Fingerprints of a token list
#[must_use]
pub fn fingerprint(tokens: &[Token]) -> Vec<Fingerprint> {
    tokens.iter().map(Fingerprint::of).collect()
}

/// Length of the longest common prefix
#[must_use]
pub fn common_prefix(a: &[Fingerprint], b: &[Fingerprint]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Length of the longest common suffix that does not overlap `skip` leading
/// elements of either list
#[must_use]
pub fn common_suffix(a: &[Fingerprint], b: &[Fingerprint], skip: usize) -> usize {
    let limit = a.len().min(b.len()).saturating_sub(skip);
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take(limit)
        .take_while(|(x, y)| x == y)
        .count()
}

/// Token-level difference between a previous and a current token list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDiff {
    /// Tokens shared at the start
    pub prefix: usize,
    /// Tokens shared at the end, not overlapping the prefix
    pub suffix: usize,
    /// Changed region in the previous list
    pub removed: Range<usize>,
    /// Changed region in the current list
    pub inserted: Range<usize>,
}

impl TokenDiff {
    #[must_use]
    pub fn between(previous: &[Fingerprint], current: &[Fingerprint]) -> Self {
        let prefix = common_prefix(previous, current);
        let suffix = common_suffix(previous, current, prefix);
        Self {
            prefix,
            suffix,
            removed: prefix..previous.len() - suffix,
            inserted: prefix..current.len() - suffix,
        }
    }

    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.removed.is_empty() && self.inserted.is_empty()
    }

    /// Number of unchanged tokens
    #[must_use]
    pub const fn unchanged(&self) -> usize {
        self.prefix + self.suffix
    }
}
