//! Filename decomposition and composition.
//!
//! Every physical filename is split into five structured fields — prefix,
//! counter, separator, description, extension — edited independently, and
//! concatenated back together on save. Decomposition never fails: a name the
//! algorithm can't make sense of simply lands entirely in the description
//! field. Which numeric run counts as "the counter" is decided once per
//! directory by [`counter_position`] and held fixed afterwards so re-parses
//! stay idempotent.

mod heuristic;
mod parts;
mod split;

pub use crate::heuristic::counter_position;
pub use crate::parts::{NameParts, SeparatorSet};
pub use crate::split::{DigitRun, decompose, digit_runs};

/// Formats a counter value with a fixed decimal width.
///
/// A `width` of zero formats the number with no padding; renumbering callers
/// that want auto-width pass the result of [`auto_width`] instead.
///
/// # Examples
///
/// ```
/// use remo_codec::format_counter;
/// assert_eq!(format_counter(15, 3), "015");
/// assert_eq!(format_counter(15, 0), "15");
/// assert_eq!(format_counter(1234, 2), "1234");
/// ```
pub fn format_counter(value: u64, width: usize) -> String {
    format!("{value:0width$}")
}

/// The minimum decimal width that can represent `max_value` without
/// truncation. This is what a renumber with `digit_width = 0` resolves to.
///
/// # Examples
///
/// ```
/// use remo_codec::auto_width;
/// assert_eq!(auto_width(0), 1);
/// assert_eq!(auto_width(9), 1);
/// assert_eq!(auto_width(20), 2);
/// assert_eq!(auto_width(100), 3);
/// ```
pub fn auto_width(max_value: u64) -> usize {
    if max_value == 0 { 1 } else { (max_value.ilog10() + 1) as usize }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(9, 1)]
    #[case(10, 2)]
    #[case(99, 2)]
    #[case(100, 3)]
    #[case(10_000, 5)]
    fn test_auto_width(#[case] value: u64, #[case] expected: usize) {
        assert_eq!(auto_width(value), expected);
    }

    #[rstest]
    #[case(10, 0, "10")]
    #[case(10, 3, "010")]
    #[case(15, 3, "015")]
    #[case(20, 3, "020")]
    #[case(7, 1, "7")]
    // Width never truncates
    #[case(1234, 2, "1234")]
    fn test_format_counter(#[case] value: u64, #[case] width: usize, #[case] expected: &str) {
        assert_eq!(format_counter(value, width), expected);
    }
}
