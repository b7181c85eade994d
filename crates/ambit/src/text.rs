//! Character offsets and half-open spans over the source request.

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Character offset into the original request text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct TextSize(u32);

/// Half-open character range `[start, end)`; `start <= end` always holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(try_from = "RawRange"))]
pub struct TextRange {
    start: TextSize,
    end: TextSize,
}

/// Unchecked wire form of a [`TextRange`]
#[cfg(feature = "serialize")]
#[derive(Deserialize)]
struct RawRange {
    start: TextSize,
    end: TextSize,
}

#[cfg(feature = "serialize")]
impl TryFrom<RawRange> for TextRange {
    type Error = String;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        if raw.start > raw.end {
            return Err(format!(
                "range start {} is after its end {}",
                raw.start.0, raw.end.0
            ));
        }
        Ok(Self {
            start: raw.start,
            end: raw.end,
        })
    }
}

impl TextSize {
    #[must_use]
    pub const fn from(offset: u32) -> Self {
        Self(offset)
    }

    #[must_use]
    pub const fn into(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

impl From<TextSize> for usize {
    fn from(size: TextSize) -> Self {
        size.0 as usize
    }
}

impl std::ops::Add<Self> for TextSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl TextRange {
    /// Create a range; `start` and `end` are swapped if given out of order
    #[must_use]
    pub const fn new(start: TextSize, end: TextSize) -> Self {
        if start.0 <= end.0 {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    #[must_use]
    pub const fn at(start: TextSize, len: TextSize) -> Self {
        Self::new(start, TextSize(start.0 + len.0))
    }

    /// Empty range positioned at `offset`
    #[must_use]
    pub const fn empty(offset: TextSize) -> Self {
        Self::new(offset, offset)
    }

    #[must_use]
    pub const fn start(self) -> TextSize {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> TextSize {
        self.end
    }

    #[must_use]
    pub const fn len(self) -> TextSize {
        TextSize(self.end.0.saturating_sub(self.start.0))
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    #[must_use]
    pub const fn contains(self, offset: TextSize) -> bool {
        offset.0 >= self.start.0 && offset.0 < self.end.0
    }

    #[must_use]
    pub const fn contains_range(self, other: Self) -> bool {
        other.start.0 >= self.start.0 && other.end.0 <= self.end.0
    }

    /// Smallest range covering both `self` and `other`
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.0, self.end.0)
    }
}

/// Half-open range of token indices `[start, end)`.
///
/// Charts, derivations and forests are positioned in token indices; the
/// character span of a token range is recovered from the tokens themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Character range covered by the tokens in this span.
    ///
    /// Empty spans map to an empty range at the boundary they sit on.
    #[must_use]
    pub fn text_range(self, tokens: &[crate::token::Token]) -> TextRange {
        if self.is_empty() {
            let offset = match (self.start.checked_sub(1), tokens.get(self.start)) {
                (_, Some(next)) => next.span.start(),
                (Some(prev), None) => tokens.get(prev).map_or(TextSize::zero(), |t| t.span.end()),
                (None, None) => TextSize::zero(),
            };
            return TextRange::empty(offset);
        }
        let first = tokens.get(self.start).map(|t| t.span);
        let last = tokens.get(self.end - 1).map(|t| t.span);
        match (first, last) {
            (Some(first), Some(last)) => first.cover(last),
            _ => TextRange::default(),
        }
    }
}

impl fmt::Display for TokenSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(feature = "diagnostics")]
impl From<TextRange> for miette::SourceSpan {
    fn from(range: TextRange) -> Self {
        use miette::SourceOffset;
        Self::new(
            SourceOffset::from(usize::from(range.start())),
            usize::from(range.len()),
        )
    }
}
