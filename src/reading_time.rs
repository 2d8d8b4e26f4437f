//! Reading-time estimation.
//!
//! A post's reading time is its word count divided by a fixed reading speed,
//! rounded up to whole minutes:
//!
//! ```text
//! minutes = ceil(words / 200)
//! ```
//!
//! Words are collected block by block, heading first and then body text.
//! Body text is the plain-text rendering of the rich-text blocks, so markup
//! never counts. Punctuation is stripped before splitting on whitespace: a
//! token counts only if it contains at least one letter or digit, which means
//! a lone dash or ellipsis between words is not a word.
//!
//! An empty post reads in zero minutes; anything with at least one word reads
//! in at least one.

use crate::richtext;
use crate::types::ContentBlock;

/// Average adult reading speed used when nothing else is configured.
pub const WORDS_PER_MINUTE: usize = 200;

/// Count the words of a post's content.
pub fn count_words(content: &[ContentBlock]) -> usize {
    content
        .iter()
        .map(|block| count_text_words(&block.heading) + count_text_words(&richtext::as_text(&block.body)))
        .sum()
}

fn count_text_words(text: &str) -> usize {
    text.split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .count()
}

/// Estimated reading time in whole minutes at the default speed.
pub fn estimate_minutes(content: &[ContentBlock]) -> usize {
    estimate_minutes_at(content, WORDS_PER_MINUTE)
}

/// Estimated reading time in whole minutes at `words_per_minute`.
///
/// A zero rate is treated as the default rate; config validation rejects it
/// before it gets here.
pub fn estimate_minutes_at(content: &[ContentBlock], words_per_minute: usize) -> usize {
    let rate = if words_per_minute == 0 {
        WORDS_PER_MINUTE
    } else {
        words_per_minute
    };
    count_words(content).div_ceil(rate)
}
