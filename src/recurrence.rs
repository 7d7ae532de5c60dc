//! Expansion of recurring tasks into concrete future instances.
//!
//! A pure generator: given a template task and its pattern it produces a
//! bounded sequence of instances and persists nothing. Callers feed the
//! results back into the store as ordinary tasks.

use chrono::{DateTime, Duration, Months, Utc};

use crate::fields::RecurrenceKind;
use crate::task::{RecurringPattern, Task};

/// Default maximum number of instances generated per expansion.
pub const DEFAULT_INSTANCE_COUNT: usize = 10;

/// Generate up to `count` future instances of `parent` under `pattern`.
///
/// Each instance is a copy of the parent with id `"{parent_id}_{index}"`,
/// a due date advanced by `interval × index` periods from the parent's due
/// date (or `now` when the parent has none), fresh timestamps,
/// `is_recurring` cleared, and `parent_task_id` pointing back at the
/// origin. Generation stops early once a computed due date passes the
/// pattern's end date.
pub fn expand_instances(
    parent: &Task,
    pattern: &RecurringPattern,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<Task> {
    let start = parent.due_date.unwrap_or(now);
    let mut instances = Vec::new();

    for index in 1..=count {
        let steps = pattern.interval.max(1).saturating_mul(index as u32);
        let due = advance(start, pattern.kind, steps);
        if let Some(end) = pattern.end_date {
            if due > end {
                break;
            }
        }

        let mut instance = parent.clone();
        instance.id = format!("{}_{}", parent.id, index);
        instance.due_date = Some(due);
        instance.parent_task_id = Some(parent.id.clone());
        instance.is_recurring = false;
        instance.created_at = now;
        instance.updated_at = now;
        instances.push(instance);
    }

    instances
}

fn advance(start: DateTime<Utc>, kind: RecurrenceKind, steps: u32) -> DateTime<Utc> {
    let shifted = match kind {
        RecurrenceKind::Daily | RecurrenceKind::Custom => {
            start.checked_add_signed(Duration::days(steps as i64))
        }
        RecurrenceKind::Weekly => start.checked_add_signed(Duration::weeks(steps as i64)),
        // Calendar-aware: Jan 31 + 1 month clamps to Feb 29/28.
        RecurrenceKind::Monthly => start.checked_add_months(Months::new(steps)),
    };
    // A shift past the representable date range leaves the date unchanged.
    shifted.unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Category, Priority};
    use crate::store::materialize_draft;
    use crate::task::TaskDraft;
    use chrono::TimeZone;

    fn parent(due: DateTime<Utc>) -> Task {
        let draft = TaskDraft {
            title: "Water the plants".into(),
            priority: Priority::Low,
            category: Category::Personal,
            due_date: Some(due),
            is_recurring: true,
            ..TaskDraft::default()
        };
        materialize_draft(draft, "plant".into(), due)
    }

    fn weekly(end_date: Option<DateTime<Utc>>) -> RecurringPattern {
        RecurringPattern {
            kind: RecurrenceKind::Weekly,
            interval: 1,
            days_of_week: Vec::new(),
            end_date,
            count: None,
        }
    }

    #[test]
    fn weekly_pattern_advances_by_whole_weeks() {
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let instances = expand_instances(&parent(due), &weekly(None), 3, now);

        assert_eq!(instances.len(), 3);
        for (i, instance) in instances.iter().enumerate() {
            let expected = due + Duration::weeks(i as i64 + 1);
            assert_eq!(instance.due_date, Some(expected));
            assert_eq!(instance.id, format!("plant_{}", i + 1));
            assert_eq!(instance.parent_task_id.as_deref(), Some("plant"));
            assert!(!instance.is_recurring);
            assert_eq!(instance.created_at, now);
        }
    }

    #[test]
    fn end_date_stops_generation_early() {
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let end = due + Duration::days(10);
        let now = due;
        let instances = expand_instances(&parent(due), &weekly(Some(end)), 3, now);
        assert_eq!(instances.len(), 1, "only D+7d fits before D+10d");
    }

    #[test]
    fn monthly_pattern_clamps_at_month_end() {
        let due = Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap();
        let pattern = RecurringPattern {
            kind: RecurrenceKind::Monthly,
            interval: 1,
            days_of_week: Vec::new(),
            end_date: None,
            count: None,
        };
        let instances = expand_instances(&parent(due), &pattern, 1, due);
        let expected = Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap();
        assert_eq!(instances[0].due_date, Some(expected));
    }

    #[test]
    fn parent_without_due_date_starts_from_now() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut template = parent(now);
        template.due_date = None;
        let instances = expand_instances(&template, &weekly(None), 2, now);
        assert_eq!(instances[0].due_date, Some(now + Duration::weeks(1)));
    }

    #[test]
    fn pathological_interval_does_not_panic() {
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut pattern = weekly(None);
        pattern.interval = u32::MAX;
        let instances = expand_instances(&parent(due), &pattern, 2, due);
        assert_eq!(instances.len(), 2);
        // The shift leaves the representable range and is dropped.
        assert_eq!(instances[0].due_date, Some(due));
    }

    #[test]
    fn zero_interval_is_treated_as_one() {
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut pattern = weekly(None);
        pattern.interval = 0;
        let instances = expand_instances(&parent(due), &pattern, 1, due);
        assert_eq!(instances[0].due_date, Some(due + Duration::weeks(1)));
    }
}
