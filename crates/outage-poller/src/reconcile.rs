use shared_types::{DesiredEvent, ObservedEvent, ReconciliationResult};

/// Compute the deletes and adds that turn `observed` into `desired`.
///
/// Events match via `ObservedEvent::matches` (start, end and summary). Each
/// side is checked for the existence of a counterpart, not paired off, so
/// duplicates on either side are judged independently. `desired` must not
/// contain duplicates itself.
pub fn reconcile(observed: &[ObservedEvent], desired: &[DesiredEvent]) -> ReconciliationResult {
    let to_delete = observed
        .iter()
        .filter(|seen| !desired.iter().any(|wanted| seen.matches(wanted)))
        .cloned()
        .collect();
    let to_add = desired
        .iter()
        .filter(|wanted| !observed.iter().any(|seen| seen.matches(wanted)))
        .cloned()
        .collect();

    ReconciliationResult { to_delete, to_add }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired(start: &str, end: &str, summary: &str) -> DesiredEvent {
        DesiredEvent {
            start_iso: format!("2025-11-05T{}:00+02:00", start),
            end_iso: format!("2025-11-05T{}:00+02:00", end),
            summary: summary.to_string(),
            description: "Schedule updated 2025-11-05 10:26".to_string(),
        }
    }

    fn observed(id: &str, start: &str, end: &str, summary: &str) -> ObservedEvent {
        ObservedEvent::from_desired(id, &desired(start, end, summary))
    }

    #[test]
    fn test_adds_missing_event() {
        let result = reconcile(
            &[observed("a", "10:00", "11:00", "A")],
            &[desired("10:00", "11:00", "A"), desired("14:00", "15:00", "A")],
        );
        assert!(result.to_delete.is_empty());
        assert_eq!(result.to_add, vec![desired("14:00", "15:00", "A")]);
    }

    #[test]
    fn test_matching_sets_are_idempotent() {
        let wanted = vec![desired("10:00", "11:00", "A"), desired("14:00", "16:30", "A")];
        let seen: Vec<ObservedEvent> = wanted
            .iter()
            .enumerate()
            .map(|(i, e)| ObservedEvent::from_desired(format!("evt-{}", i), e))
            .collect();

        let result = reconcile(&seen, &wanted);
        assert!(result.is_empty());
        assert_eq!(result, ReconciliationResult::default());
    }

    #[test]
    fn test_stale_events_deleted() {
        let result = reconcile(
            &[
                observed("a", "10:00", "11:00", "A"),
                observed("b", "12:00", "13:00", "A"),
            ],
            &[desired("10:00", "11:00", "A")],
        );
        assert_eq!(result.to_delete.len(), 1);
        assert_eq!(result.to_delete[0].id, "b");
        assert!(result.to_add.is_empty());
    }

    #[test]
    fn test_changed_end_replaces_event() {
        let result = reconcile(
            &[observed("a", "10:00", "11:00", "A")],
            &[desired("10:00", "12:00", "A")],
        );
        assert_eq!(result.to_delete[0].id, "a");
        assert_eq!(result.to_add, vec![desired("10:00", "12:00", "A")]);
    }

    #[test]
    fn test_summary_participates_description_does_not() {
        let mut reworded = observed("a", "10:00", "11:00", "A");
        reworded.description = "Schedule updated 2025-11-04 18:00".to_string();
        let result = reconcile(&[reworded], &[desired("10:00", "11:00", "A")]);
        assert!(result.is_empty());

        let result = reconcile(
            &[observed("a", "10:00", "11:00", "B")],
            &[desired("10:00", "11:00", "A")],
        );
        assert_eq!(result.to_delete.len(), 1);
        assert_eq!(result.to_add.len(), 1);
    }

    #[test]
    fn test_observed_duplicates_judged_independently() {
        let result = reconcile(
            &[
                observed("a", "10:00", "11:00", "A"),
                observed("a-copy", "10:00", "11:00", "A"),
            ],
            &[desired("10:00", "11:00", "A")],
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_empty_desired_clears_calendar() {
        let result = reconcile(&[observed("a", "10:00", "11:00", "A")], &[]);
        assert_eq!(result.to_delete.len(), 1);
        assert!(result.to_add.is_empty());

        assert!(reconcile(&[], &[]).is_empty());
    }
}
