//! Batch counter renumbering.
//!
//! Two entry points share the arithmetic but differ in what drives a
//! record's new value: its rank among the selected records, or its absolute
//! position in the collection.

use super::{CollectionEvent, MediaCollection};
use crate::error::{ErrorKind, Result};
use remo_codec::auto_width;

impl MediaCollection {
    /// Renumbers `targets` by their rank within the selection: the
    /// lowest-positioned target gets `start`, the next `start + step`, and
    /// so on, regardless of gaps between them.
    ///
    /// `width == 0` pads every counter to the width of the largest value
    /// produced. A negative `step` is allowed as long as no value dips
    /// below zero.
    pub fn renumber_relative(
        &mut self,
        start: u64,
        step: i64,
        width: usize,
        targets: &[usize],
    ) -> Result<()> {
        let mut ordered = self.checked_targets(targets)?;
        ordered.sort_unstable();
        let assignments: Vec<(usize, u64)> = ordered
            .into_iter()
            .enumerate()
            .map(|(rank, index)| Ok((index, counter_at(start, step, rank)?)))
            .collect::<Result<_>>()?;
        self.apply_counters(&assignments, width);
        Ok(())
    }

    /// Renumbers `targets` by their absolute position: the record at index
    /// `i` gets `start + i * step`, so untouched records in between leave
    /// visible gaps in the sequence.
    pub fn renumber_by_position(
        &mut self,
        start: u64,
        step: i64,
        width: usize,
        targets: &[usize],
    ) -> Result<()> {
        let ordered = self.checked_targets(targets)?;
        let assignments: Vec<(usize, u64)> = ordered
            .into_iter()
            .map(|index| Ok((index, counter_at(start, step, index)?)))
            .collect::<Result<_>>()?;
        self.apply_counters(&assignments, width);
        Ok(())
    }

    fn checked_targets(&self, targets: &[usize]) -> Result<Vec<usize>> {
        let len = self.len();
        for &index in targets {
            if index >= len {
                exn::bail!(ErrorKind::IndexOutOfRange { index, len });
            }
        }
        Ok(targets.to_vec())
    }

    fn apply_counters(&mut self, assignments: &[(usize, u64)], width: usize) {
        let width = if width == 0 {
            let max = assignments.iter().map(|(_, value)| *value).max().unwrap_or(0);
            auto_width(max)
        } else {
            width
        };
        for &(index, value) in assignments {
            self.files[index].set_counter_value(value, width);
        }
        self.emit(CollectionEvent::Changed);
    }
}

/// `start + offset * step`, rejecting results outside `u64` before any
/// record is touched. The arithmetic runs in `i128` so the full `u64` start
/// range stays usable with negative steps.
fn counter_at(start: u64, step: i64, offset: usize) -> Result<u64> {
    let value = (offset as i128)
        .checked_mul(step as i128)
        .and_then(|delta| delta.checked_add(start as i128));
    match value.map(u64::try_from) {
        Some(Ok(value)) => Ok(value),
        _ => exn::bail!(ErrorKind::Invalid(format!(
            "renumber produces an out-of-range counter at offset {offset} (start {start}, step {step})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::collection;
    use crate::error::ErrorKind;

    fn resulting(coll: &crate::MediaCollection) -> Vec<String> {
        coll.records().iter().map(|record| record.resulting_filename()).collect()
    }

    #[test]
    fn test_relative_ignores_gaps() {
        let mut coll = collection(&["a9.jpg", "b8.jpg", "c7.jpg", "d6.jpg"]);
        // Targets given out of order; ranking follows collection order.
        coll.renumber_relative(1, 1, 3, &[3, 0, 2]).unwrap();
        assert_eq!(resulting(&coll), ["a001.jpg", "b8.jpg", "c002.jpg", "d003.jpg"]);
    }

    #[test]
    fn test_by_position_leaves_gaps() {
        let mut coll = collection(&["a9.jpg", "b8.jpg", "c7.jpg", "d6.jpg"]);
        coll.renumber_by_position(10, 10, 0, &[0, 2, 3]).unwrap();
        // Auto width from the largest produced value (40).
        assert_eq!(resulting(&coll), ["a10.jpg", "b8.jpg", "c30.jpg", "d40.jpg"]);
    }

    #[test]
    fn test_auto_width_relative() {
        let mut coll = collection(&["a1.jpg", "b2.jpg", "c3.jpg"]);
        coll.renumber_relative(99, 1, 0, &[0, 1, 2]).unwrap();
        assert_eq!(resulting(&coll), ["a099.jpg", "b100.jpg", "c101.jpg"]);
    }

    #[test]
    fn test_negative_step_descending() {
        let mut coll = collection(&["a1.jpg", "b2.jpg", "c3.jpg"]);
        coll.renumber_relative(3, -1, 1, &[0, 1, 2]).unwrap();
        assert_eq!(resulting(&coll), ["a3.jpg", "b2.jpg", "c1.jpg"]);
    }

    #[test]
    fn test_negative_counter_rejected_before_mutation() {
        let mut coll = collection(&["a1.jpg", "b2.jpg", "c3.jpg"]);
        let err = coll.renumber_relative(1, -1, 1, &[0, 1, 2]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
        // No partial application.
        assert_eq!(resulting(&coll), ["a1.jpg", "b2.jpg", "c3.jpg"]);
    }

    #[test]
    fn test_full_u64_start_range() {
        let mut coll = collection(&["a1.jpg", "b2.jpg"]);
        // Counting down from the very top of the range must not wrap into a
        // spurious rejection.
        coll.renumber_relative(u64::MAX, -1, 1, &[0, 1]).unwrap();
        assert_eq!(
            resulting(&coll),
            ["a18446744073709551615.jpg", "b18446744073709551614.jpg"]
        );
    }

    #[test]
    fn test_counter_overflow_rejected_before_mutation() {
        let mut coll = collection(&["a1.jpg", "b2.jpg"]);
        let err = coll.renumber_relative(u64::MAX, 1, 1, &[0, 1]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
        assert_eq!(resulting(&coll), ["a1.jpg", "b2.jpg"]);
    }

    #[test]
    fn test_out_of_range_target() {
        let mut coll = collection(&["a1.jpg"]);
        let err = coll.renumber_by_position(1, 1, 2, &[7]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::IndexOutOfRange { index: 7, len: 1 }));
    }
}
