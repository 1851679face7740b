use shared_types::{Interval, Slot};

/// Merge a day's raw slots into definite outage intervals.
///
/// Only definite slots with positive length count. They are ordered by start
/// and a slot extends the open interval only when it begins exactly where
/// that interval ends; overlapping slots open a new interval. Exact duplicate
/// slots are collapsed so the result does not depend on input order.
pub fn compact(slots: &[Slot]) -> Vec<Interval> {
    let mut definite: Vec<&Slot> = slots
        .iter()
        .filter(|slot| slot.is_definite() && slot.has_duration())
        .collect();
    definite.sort_by_key(|slot| (slot.start, slot.end));
    definite.dedup();

    let mut intervals: Vec<Interval> = Vec::with_capacity(definite.len());
    for slot in definite {
        match intervals.last_mut() {
            Some(open) if open.end_minutes == slot.start => open.end_minutes = slot.end,
            _ => intervals.push(Interval::new(slot.start, slot.end)),
        }
    }

    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::SlotKind;

    fn definite(start: u16, end: u16) -> Slot {
        Slot::new(start, end, SlotKind::Definite)
    }

    #[test]
    fn test_contiguous_slots_merge() {
        let merged = compact(&[definite(0, 60), definite(60, 120)]);
        assert_eq!(merged, vec![Interval::new(0, 120)]);
    }

    #[test]
    fn test_gap_splits_intervals() {
        let merged = compact(&[definite(0, 60), definite(90, 120)]);
        assert_eq!(merged, vec![Interval::new(0, 60), Interval::new(90, 120)]);
    }

    #[test]
    fn test_non_definite_slots_dropped() {
        assert!(compact(&[Slot::new(0, 60, SlotKind::Possible)]).is_empty());
        assert!(compact(&[
            Slot::new(0, 60, SlotKind::NotPlanned),
            Slot::new(60, 120, SlotKind::Unknown),
        ])
        .is_empty());
        assert!(compact(&[]).is_empty());
    }

    #[test]
    fn test_possible_slot_breaks_run() {
        let merged = compact(&[
            definite(0, 30),
            Slot::new(30, 60, SlotKind::Possible),
            definite(60, 90),
        ]);
        assert_eq!(merged, vec![Interval::new(0, 30), Interval::new(60, 90)]);
    }

    #[test]
    fn test_invalid_slots_discarded() {
        let merged = compact(&[definite(60, 60), definite(120, 90), definite(200, 260)]);
        assert_eq!(merged, vec![Interval::new(200, 260)]);
    }

    #[test]
    fn test_overlap_is_not_merged() {
        let merged = compact(&[definite(0, 90), definite(60, 120)]);
        assert_eq!(merged, vec![Interval::new(0, 90), Interval::new(60, 120)]);
    }

    #[test]
    fn test_duplicate_slots_collapse() {
        let merged = compact(&[definite(0, 60), definite(0, 60), definite(60, 90)]);
        assert_eq!(merged, vec![Interval::new(0, 90)]);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let slots = vec![
            definite(0, 30),
            definite(30, 60),
            Slot::new(60, 90, SlotKind::Possible),
            definite(120, 150),
            definite(150, 180),
            definite(300, 360),
            definite(1380, 1440),
        ];
        let expected = compact(&slots);
        assert_eq!(
            expected,
            vec![
                Interval::new(0, 60),
                Interval::new(120, 180),
                Interval::new(300, 360),
                Interval::new(1380, 1440),
            ]
        );

        let mut reversed = slots.clone();
        reversed.reverse();
        assert_eq!(compact(&reversed), expected);

        for shift in 1..slots.len() {
            let mut rotated = slots.clone();
            rotated.rotate_left(shift);
            assert_eq!(compact(&rotated), expected, "rotation by {}", shift);
        }

        let interleaved: Vec<Slot> = slots
            .iter()
            .step_by(2)
            .chain(slots.iter().skip(1).step_by(2))
            .copied()
            .collect();
        assert_eq!(compact(&interleaved), expected);
    }

    #[test]
    fn test_output_sorted_and_non_adjacent() {
        let merged = compact(&[
            definite(600, 660),
            definite(0, 60),
            definite(660, 720),
            definite(61, 120),
            definite(120, 180),
        ]);

        for pair in merged.windows(2) {
            assert!(pair[0].start_minutes < pair[1].start_minutes);
            assert_ne!(pair[0].end_minutes, pair[1].start_minutes);
        }
        assert_eq!(
            merged,
            vec![
                Interval::new(0, 60),
                Interval::new(61, 180),
                Interval::new(600, 720),
            ]
        );
    }
}
