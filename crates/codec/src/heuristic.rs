//! The counter-position vote.
//!
//! Runs once when a directory is opened; the winning ordinal is held fixed
//! for the directory's lifetime so that re-parsing a renamed file never
//! reshuffles its fields.

use crate::split::digit_runs;
use std::collections::HashSet;

/// Per-ordinal ballot: how many names carry this digit run, and the distinct
/// run texts seen across the sample.
struct Tally<'a> {
    presence: usize,
    values: HashSet<&'a str>,
}

/// Guesses which ordinal digit run is "the counter" for a directory.
///
/// Each filename votes for every digit-run ordinal it has, but an ordinal
/// whose run text never changes across the sample is struck from the
/// ballot: a constant run like the year in `2024_001.jpg` is part of the
/// name, not the counter. Among the surviving ordinals the one present in
/// the most names wins, ties broken towards the front. When no run varies
/// (a single digit-bearing name, or identical numbering everywhere) the
/// election falls back to plain presence. A sample with no digits at all
/// (or an empty sample) yields position 1, which
/// [`decompose`](crate::decompose) then treats as "no counter" for
/// digit-free names anyway.
///
/// # Examples
///
/// ```
/// use remo_codec::counter_position;
/// let names = ["2024_001.jpg", "2024_002.jpg", "party.jpg"];
/// assert_eq!(counter_position(names.iter().map(|n| *n)), 2);
/// ```
pub fn counter_position<'a>(sample: impl IntoIterator<Item = &'a str>) -> usize {
    let mut tallies: Vec<Tally<'a>> = Vec::new();
    let mut total = 0usize;
    for name in sample {
        total += 1;
        // Vote on the extension-less portion; a numeric extension like
        // `.mp3` never contains digit runs anyway, but "photo.2024.jpg"
        // should not count its middle part twice.
        let pure = match name.rfind('.') {
            Some(0) | None => name,
            Some(index) => &name[..index],
        };
        for (ordinal, run) in digit_runs(pure).into_iter().enumerate() {
            if tallies.len() <= ordinal {
                tallies.push(Tally { presence: 0, values: HashSet::new() });
            }
            tallies[ordinal].presence += 1;
            tallies[ordinal].values.insert(&pure[run.start..run.end]);
        }
    }

    let winner = front_runner(&tallies, true).or_else(|| front_runner(&tallies, false));
    match winner {
        Some(ordinal) => {
            let position = ordinal + 1;
            tracing::debug!(sample_size = total, position, "counter position elected");
            position
        },
        None => {
            tracing::debug!(sample_size = total, "no digit runs in sample; defaulting counter position to 1");
            1
        },
    }
}

/// The most-present ordinal, optionally restricted to ordinals whose run
/// text varies across the sample. Ties break towards the front of the name.
fn front_runner(tallies: &[Tally<'_>], varying_only: bool) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (ordinal, tally) in tallies.iter().enumerate() {
        if varying_only && tally.values.len() < 2 {
            continue;
        }
        if best.is_none_or(|(_, presence)| tally.presence > presence) {
            best = Some((ordinal, tally.presence));
        }
    }
    best.map(|(ordinal, _)| ordinal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    // Uniform single-counter names
    #[case(vec!["IMG001.jpg", "IMG002.jpg", "IMG003.jpg"], 1)]
    // Digit-free names fall back to 1
    #[case(vec!["party.jpg", "beach.jpg"], 1)]
    #[case(vec![], 1)]
    // The year run is constant across the sample, so the second run is the
    // counter.
    #[case(vec!["2024_001.jpg", "2024_002.jpg"], 2)]
    // The trailing dpi run is constant; the first run varies.
    #[case(vec!["holiday1_300dpi.jpg", "holiday2_300dpi.jpg"], 1)]
    // Mixed: most names have at least one run
    #[case(vec!["IMG001.jpg", "notes.txt", "IMG002.jpg"], 1)]
    // Both runs vary with equal presence: the tie breaks towards the front
    #[case(vec!["1_1.jpg", "2_2.jpg"], 1)]
    // A single name has no variation to go on; presence decides
    #[case(vec!["IMG001.jpg"], 1)]
    fn test_counter_position(#[case] names: Vec<&str>, #[case] expected: usize) {
        assert_eq!(counter_position(names), expected);
    }

    #[test]
    fn test_extension_digits_do_not_vote() {
        // The "3" in ".mp3"-style extensions must not create a phantom
        // second run.
        assert_eq!(counter_position(["track01.mp3", "track02.mp3"]), 1);
    }
}
