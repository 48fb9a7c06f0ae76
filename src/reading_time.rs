//! Estimates how long a post takes to read. The estimate is for display only.

use crate::post::RichTextBlock;
use crate::richtext::to_plain_text;
use std::num::NonZeroUsize;

/// The assumed reading speed.
pub const WORDS_PER_MINUTE: usize = 200;

/// Counts whitespace-delimited words. Runs of whitespace count as a single
/// separator.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Returns the estimated reading time of `content` in whole minutes, rounded
/// up. Empty content reads in zero minutes.
pub fn estimate(content: &[RichTextBlock]) -> u32 {
    estimate_with_rate(
        content,
        NonZeroUsize::new(WORDS_PER_MINUTE).unwrap_or(NonZeroUsize::MIN),
    )
}

/// Like [`estimate`] but with a custom reading speed.
pub fn estimate_with_rate(content: &[RichTextBlock], words_per_minute: NonZeroUsize) -> u32 {
    let words: usize = content
        .iter()
        .map(|block| count_words(&block.heading) + count_words(&to_plain_text(&block.body)))
        .sum();
    words.div_ceil(words_per_minute.get()) as u32
}

/// Renders an estimate with its unit, e.g. `4 min`.
pub fn format_minutes(minutes: u32) -> String {
    format!("{} min", minutes)
}
