//! The decomposition algorithm: extension split, digit-run scan, field
//! assignment.

use crate::parts::{NameParts, SeparatorSet};

/// One maximal run of ASCII digits inside a pure (extension-less) name,
/// as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitRun {
    pub start: usize,
    pub end: usize,
}

/// All maximal digit runs of `name`, left to right.
///
/// # Examples
///
/// ```
/// use remo_codec::digit_runs;
/// let runs = digit_runs("IMG20240101_0042");
/// assert_eq!(runs.len(), 2);
/// assert_eq!(&"IMG20240101_0042"[runs[1].start..runs[1].end], "0042");
/// ```
pub fn digit_runs(name: &str) -> Vec<DigitRun> {
    let mut runs = Vec::new();
    let mut current: Option<DigitRun> = None;
    for (index, c) in name.char_indices() {
        if c.is_ascii_digit() {
            match current.as_mut() {
                Some(run) => run.end = index + 1,
                None => current = Some(DigitRun { start: index, end: index + 1 }),
            }
        } else if let Some(run) = current.take() {
            runs.push(run);
        }
    }
    if let Some(run) = current {
        runs.push(run);
    }
    runs
}

/// Decomposes a physical filename into structured fields.
///
/// `counter_position` is 1-based: the n-th digit run of the extension-less
/// name becomes the counter. Decomposition never fails; when the name has
/// fewer digit runs than `counter_position` the whole pure name lands in the
/// description.
///
/// The guaranteed law is `compose(decompose(compose(x))) == compose(x)` —
/// one normalization pass is idempotent. Full round-tripping is lossy by
/// design when the counter position changes between calls.
///
/// # Examples
///
/// ```
/// use remo_codec::{SeparatorSet, decompose};
/// let parts = decompose("IMG0042_holiday.jpg", 1, &SeparatorSet::default());
/// assert_eq!(parts.prefix, "IMG");
/// assert_eq!(parts.counter, "0042");
/// assert_eq!(parts.separator, "_");
/// assert_eq!(parts.description, "holiday");
/// assert_eq!(parts.extension, ".jpg");
/// assert_eq!(parts.compose(), "IMG0042_holiday.jpg");
/// ```
pub fn decompose(filename: &str, counter_position: usize, separators: &SeparatorSet) -> NameParts {
    // The extension starts at the last dot, unless that dot is the first
    // character, in which case this is a dotfile-style name with no
    // extension at all.
    let (pure, extension) = match filename.rfind('.') {
        Some(0) | None => (filename, ""),
        Some(index) => filename.split_at(index),
    };

    let runs = digit_runs(pure);
    let (mut prefix, counter, mut description) = match counter_position.checked_sub(1).and_then(|i| runs.get(i)) {
        Some(run) => (
            pure[..run.start].to_string(),
            pure[run.start..run.end].to_string(),
            pure[run.end..].to_string(),
        ),
        None => (String::new(), String::new(), pure.to_string()),
    };

    // A name with a non-numeric body and nothing after the counter would
    // otherwise lose that body into the prefix; editing workflows treat the
    // description as the "main" text field, so move it there.
    if description.is_empty() && !prefix.is_empty() {
        std::mem::swap(&mut prefix, &mut description);
    }

    let mut separator = String::new();
    if let Some(first) = description.chars().next()
        && separators.contains(first)
    {
        separator.push(first);
        description.drain(..first.len_utf8());
    }

    NameParts {
        prefix,
        counter,
        separator,
        description,
        extension: extension.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn seps() -> SeparatorSet {
        SeparatorSet::default()
    }

    #[rstest]
    #[case("abc", 0)]
    #[case("a1b22c333", 3)]
    #[case("123", 1)]
    #[case("1a1", 2)]
    #[case("", 0)]
    fn test_digit_run_count(#[case] name: &str, #[case] expected: usize) {
        assert_eq!(digit_runs(name).len(), expected);
    }

    #[test]
    fn test_digit_run_offsets() {
        let runs = digit_runs("a12bc345");
        assert_eq!(runs, [DigitRun { start: 1, end: 3 }, DigitRun { start: 5, end: 8 }]);
    }

    #[rstest]
    // prefix, counter, separator, description, extension
    #[case("IMG0042_holiday.jpg", 1, ("IMG", "0042", "_", "holiday", ".jpg"))]
    #[case("IMG0042.jpg", 1, ("IMG", "0042", "", "", ".jpg"))]
    #[case("0042.jpg", 1, ("", "0042", "", "", ".jpg"))]
    // Second digit run as the counter
    #[case("2024-01-01_0042 beach.jpg", 4, ("2024-01-01_", "0042", " ", "beach", ".jpg"))]
    // Fewer runs than the position: everything is description
    #[case("holiday.jpg", 1, ("", "", "", "holiday", ".jpg"))]
    #[case("a1.jpg", 2, ("", "", "", "a1", ".jpg"))]
    // No extension
    #[case("IMG0042", 1, ("IMG", "0042", "", "", ""))]
    // Leading dot is not an extension split point; it is a separator
    // character, so it splits off the description instead.
    #[case(".hidden", 1, ("", "", ".", "hidden", ""))]
    // Empty description with non-empty prefix swaps
    #[case("take1", 2, ("", "", "", "take1", ""))]
    fn test_decompose(#[case] name: &str, #[case] position: usize, #[case] expected: (&str, &str, &str, &str, &str)) {
        let parts = decompose(name, position, &seps());
        assert_eq!(
            (
                parts.prefix.as_str(),
                parts.counter.as_str(),
                parts.separator.as_str(),
                parts.description.as_str(),
                parts.extension.as_str(),
            ),
            expected
        );
    }

    #[test]
    fn test_trailing_counter_keeps_prefix_as_description() {
        // "scan99" at position 1: prefix "scan", counter "99", empty
        // description; the swap moves "scan" into the description.
        let parts = decompose("scan99.png", 1, &seps());
        assert_eq!(parts.prefix, "");
        assert_eq!(parts.counter, "99");
        assert_eq!(parts.description, "scan");
        // Composition reorders: this is the documented lossy case, stable
        // after one normalization.
        assert_eq!(parts.compose(), "99scan.png");
        let again = decompose(&parts.compose(), 1, &seps());
        assert_eq!(again.compose(), parts.compose());
    }

    #[rstest]
    #[case("IMG0042_holiday.jpg", 1)]
    #[case("holiday.jpg", 1)]
    #[case("2024-01-01_0042 beach.jpg", 4)]
    #[case("scan99.png", 1)]
    #[case("a1b2c3.tif", 2)]
    #[case("no_extension_42", 1)]
    #[case(".dotfile", 1)]
    fn test_normalization_idempotent(#[case] name: &str, #[case] position: usize) {
        let once = decompose(name, position, &seps()).compose();
        let twice = decompose(&once, position, &seps()).compose();
        assert_eq!(once, twice);
    }

    #[rstest]
    #[case("IMG0042_holiday.jpg", 1)]
    #[case("holiday.jpg", 1)]
    #[case("scan99.png", 1)]
    fn test_extension_and_counter_preserved(#[case] name: &str, #[case] position: usize) {
        let parts = decompose(name, position, &seps());
        let recomposed = parts.compose();
        let reparsed = decompose(&recomposed, position, &seps());
        assert_eq!(reparsed.extension, parts.extension);
        assert_eq!(reparsed.counter, parts.counter);
    }

    #[test]
    fn test_unicode_description() {
        let parts = decompose("IMG1_ünïcödé.jpg", 1, &seps());
        assert_eq!(parts.description, "ünïcödé");
        assert_eq!(parts.compose(), "IMG1_ünïcödé.jpg");
    }
}
