//! Pure view derivation: filtering, sorting, and aggregate statistics.
//!
//! Everything in this module is a function of `(tasks, filter, sort, now)`
//! and never mutates the stored collection. The store clones matching tasks
//! into a fresh ordered sequence on every read.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};

use crate::fields::SortKey;
use crate::task::{Task, TaskFilter, TaskStats};

/// Midnight at the start of `now`'s calendar day, in UTC.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

/// The last representable instant of `now`'s calendar day.
pub fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now) + Duration::days(1) - Duration::nanoseconds(1)
}

/// Whether a single task matches the filter. Predicates are AND-combined;
/// absent predicates always pass.
///
/// Category and priority apply uniformly to all tasks regardless of
/// completion; combine with the `completed` predicate to narrow further.
pub fn matches_filter(task: &Task, filter: &TaskFilter, now: DateTime<Utc>) -> bool {
    if let Some(category) = filter.category {
        if task.category != category {
            return false;
        }
    }
    if let Some(priority) = filter.priority {
        if task.priority != priority {
            return false;
        }
    }
    if let Some(completed) = filter.completed {
        if task.completed != completed {
            return false;
        }
    }
    if filter.due_today == Some(true) {
        let in_today = task
            .due_date
            .map(|due| due >= start_of_day(now) && due <= end_of_day(now))
            .unwrap_or(false);
        if !in_today {
            return false;
        }
    }
    if filter.due_this_week == Some(true) {
        let in_week = task
            .due_date
            .map(|due| due >= now && due <= now + Duration::days(7))
            .unwrap_or(false);
        if !in_week {
            return false;
        }
    }
    if filter.overdue == Some(true) {
        let overdue = !task.completed
            && task.due_date.map(|due| due < start_of_day(now)).unwrap_or(false);
        if !overdue {
            return false;
        }
    }
    if let Some(tags) = &filter.tags {
        if !tags.is_empty() && !tags.iter().any(|tag| task.tags.contains(tag)) {
            return false;
        }
    }
    if let Some(query) = &filter.search {
        let query = query.trim().to_lowercase();
        if !query.is_empty() && !search_matches(task, &query) {
            return false;
        }
    }
    if let Some(range) = filter.date_range {
        let in_range = task
            .due_date
            .map(|due| due >= range.start && due <= range.end)
            .unwrap_or(false);
        if !in_range {
            return false;
        }
    }
    true
}

fn search_matches(task: &Task, query: &str) -> bool {
    task.title.to_lowercase().contains(query)
        || task
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(query))
            .unwrap_or(false)
        || task.tags.iter().any(|t| t.to_lowercase().contains(query))
}

/// Copy the tasks that match `filter` into a new sequence.
pub fn apply_filter(tasks: &[Task], filter: &TaskFilter, now: DateTime<Utc>) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| matches_filter(task, filter, now))
        .cloned()
        .collect()
}

/// Order tasks by the given sort key. The sort is stable, so tasks that
/// compare equal (for example two tasks without a due date under
/// `due-soon`) keep their current relative order.
pub fn sort_tasks(tasks: &mut [Task], key: SortKey) {
    tasks.sort_by(|a, b| compare(a, b, key));
}

fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::Newest => b.created_at.cmp(&a.created_at),
        SortKey::Oldest => a.created_at.cmp(&b.created_at),
        SortKey::DueSoon => match (a.due_date, b.due_date) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(da), Some(db)) => da.cmp(&db),
        },
        SortKey::DueLater => match (a.due_date, b.due_date) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(da), Some(db)) => db.cmp(&da),
        },
        SortKey::PriorityHigh => b.priority.weight().cmp(&a.priority.weight()),
        SortKey::PriorityLow => a.priority.weight().cmp(&b.priority.weight()),
        SortKey::TitleAZ => compare_titles(a, b),
        SortKey::TitleZA => compare_titles(b, a),
    }
}

fn compare_titles(a: &Task, b: &Task) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
}

/// Recompute aggregate statistics for the collection. Idempotent and safe
/// to call redundantly.
///
/// `completed_today` uses `updated_at` as a proxy for completion time,
/// matching the store's behaviour of bumping `updated_at` on completion.
pub fn compute_stats(tasks: &[Task], now: DateTime<Utc>) -> TaskStats {
    let today_start = start_of_day(now);
    let today = now.date_naive();

    let completed = tasks.iter().filter(|t| t.completed).count();
    let overdue = tasks
        .iter()
        .filter(|t| {
            !t.completed && t.due_date.map(|due| due < today_start).unwrap_or(false)
        })
        .count();
    let completed_today = tasks
        .iter()
        .filter(|t| t.completed && t.updated_at >= today_start)
        .count();
    let due_today = tasks
        .iter()
        .filter(|t| {
            !t.completed
                && t.due_date
                    .map(|due| due.date_naive() == today && due >= today_start)
                    .unwrap_or(false)
        })
        .count();

    TaskStats {
        total: tasks.len(),
        completed,
        pending: tasks.len() - completed,
        overdue,
        completed_today,
        due_today,
        focus_sessions_completed: 0,
    }
}
