//! Schema validators for persisted documents.
//!
//! Stored data may predate the current schema or have been edited by hand,
//! so each persisted type gets an explicit validator that repairs what it
//! can: individual bad fields are coerced to documented defaults, and only
//! records missing an id or a non-empty title are dropped entirely.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::error::StorageError;
use crate::fields::*;
use crate::storage::UserPreferences;
use crate::task::{RecurringPattern, Task};

/// Build a task from a raw JSON value, coercing invalid fields.
///
/// Returns `None` when the record lacks an id or a non-empty title, the two
/// fields without a sensible default.
pub fn task_from_value(value: &Value, now: DateTime<Utc>) -> Option<Task> {
    let id = non_empty_str(value.get("id"))?;
    let title = non_empty_str(value.get("title"))?;

    Some(Task {
        id,
        title,
        description: opt_string(value.get("description")),
        completed: value.get("completed").and_then(Value::as_bool).unwrap_or(false),
        priority: enum_field(value.get("priority"), parse_priority),
        category: enum_field(value.get("category"), parse_category),
        status: enum_field(value.get("status"), parse_status),
        due_date: opt_date(value.get("dueDate")),
        created_at: opt_date(value.get("createdAt")).unwrap_or(now),
        updated_at: opt_date(value.get("updatedAt")).unwrap_or(now),
        completed_at: opt_date(value.get("completedAt")),
        estimated_minutes: opt_minutes(value.get("estimatedMinutes")),
        actual_minutes: opt_minutes(value.get("actualMinutes")),
        tags: string_list(value.get("tags")),
        mentions: string_list(value.get("mentions")),
        is_recurring: value.get("isRecurring").and_then(Value::as_bool).unwrap_or(false),
        recurring_pattern: value.get("recurringPattern").and_then(pattern_from_value),
        parent_task_id: opt_string(value.get("parentTaskId")),
        creation_mode: value
            .get("creationMode")
            .and_then(Value::as_str)
            .and_then(parse_creation_mode),
    })
}

/// Build a recurring pattern from a raw JSON value. A pattern that is not an
/// object is dropped; an invalid interval is clamped to 1.
pub fn pattern_from_value(value: &Value) -> Option<RecurringPattern> {
    if !value.is_object() {
        return None;
    }
    let interval = value
        .get("interval")
        .and_then(Value::as_u64)
        .map(|n| n.min(u32::MAX as u64) as u32)
        .unwrap_or(1)
        .max(1);
    let days_of_week = value
        .get("daysOfWeek")
        .and_then(Value::as_array)
        .map(|days| {
            days.iter()
                .filter_map(Value::as_u64)
                .filter(|&d| d <= 6)
                .map(|d| d as u8)
                .collect()
        })
        .unwrap_or_default();

    Some(RecurringPattern {
        kind: enum_field(value.get("type"), parse_recurrence_kind),
        interval,
        days_of_week,
        end_date: opt_date(value.get("endDate")),
        count: value.get("count").and_then(Value::as_u64).map(|n| n as u32),
    })
}

/// Build preferences from a raw JSON value. Never fails: every field falls
/// back to its default independently.
pub fn preferences_from_value(value: &Value) -> UserPreferences {
    let defaults = UserPreferences::default();
    UserPreferences {
        theme: enum_field(value.get("theme"), parse_theme),
        view_mode: enum_field(value.get("viewMode"), parse_view_mode),
        notifications: value
            .get("notifications")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.notifications),
        auto_save: value
            .get("autoSave")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.auto_save),
        last_active_view: enum_field(value.get("lastActiveView"), parse_view),
        last_active_sub_view: value
            .get("lastActiveSubView")
            .and_then(Value::as_str)
            .and_then(parse_sub_view),
        dashboard_layouts: value
            .get("dashboardLayouts")
            .filter(|v| v.is_object())
            .cloned(),
    }
}

/// Validate a backup document. Both `tasks` and `preferences` must be
/// present; anything else is a format error. Field-level coercion still
/// applies within a well-formed document.
pub fn backup_from_value(
    value: &Value,
    now: DateTime<Utc>,
) -> Result<(Vec<Task>, UserPreferences), StorageError> {
    let raw_tasks = value
        .get("tasks")
        .and_then(Value::as_array)
        .ok_or_else(|| StorageError::Format("missing `tasks` field".into()))?;
    let raw_prefs = value
        .get("preferences")
        .filter(|v| v.is_object())
        .ok_or_else(|| StorageError::Format("missing `preferences` field".into()))?;

    let tasks = tasks_from_values(raw_tasks, now);
    Ok((tasks, preferences_from_value(raw_prefs)))
}

/// Validate an array of raw task values, dropping unusable records.
pub fn tasks_from_values(values: &[Value], now: DateTime<Utc>) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(values.len());
    for value in values {
        match task_from_value(value, now) {
            Some(task) => tasks.push(task),
            None => warn!("dropping task record without id or title"),
        }
    }
    tasks
}

/// Validate typed tasks before a write: drop records with an empty id or a
/// blank title, and trim title whitespace.
pub fn clean_tasks(tasks: &[Task]) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| !t.id.is_empty() && !t.title.trim().is_empty())
        .map(|t| {
            let mut task = t.clone();
            task.title = task.title.trim().to_string();
            task
        })
        .collect()
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn opt_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn opt_date(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn opt_minutes(value: Option<&Value>) -> Option<u32> {
    value.and_then(Value::as_u64).map(|n| n.min(u32::MAX as u64) as u32)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value.and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        // Non-array values coerce to an empty list rather than failing.
        None => Vec::new(),
    }
}

fn enum_field<T: Default>(value: Option<&Value>, parse: fn(&str) -> T) -> T {
    match value.and_then(Value::as_str) {
        Some(s) => parse(s),
        None => T::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn task_without_id_or_title_is_dropped() {
        assert!(task_from_value(&json!({ "title": "x" }), now()).is_none());
        assert!(task_from_value(&json!({ "id": "a" }), now()).is_none());
        assert!(task_from_value(&json!({ "id": "a", "title": "   " }), now()).is_none());
    }

    #[test]
    fn invalid_enums_coerce_to_defaults() {
        let task = task_from_value(
            &json!({
                "id": "a",
                "title": "Report",
                "priority": "sky-high",
                "category": 42,
                "status": "done-ish",
                "tags": "not-an-array"
            }),
            now(),
        )
        .unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, Category::Other);
        assert_eq!(task.status, Status::Pending);
        assert!(task.tags.is_empty());
    }

    #[test]
    fn dates_parse_from_iso_strings_including_nested_end_date() {
        let task = task_from_value(
            &json!({
                "id": "a",
                "title": "Report",
                "dueDate": "2024-03-01T12:00:00Z",
                "recurringPattern": {
                    "type": "weekly",
                    "interval": 0,
                    "endDate": "2024-06-01T00:00:00Z"
                }
            }),
            now(),
        )
        .unwrap();
        assert!(task.due_date.is_some());
        let pattern = task.recurring_pattern.unwrap();
        assert_eq!(pattern.interval, 1, "interval clamps to at least 1");
        assert!(pattern.end_date.is_some());
    }

    #[test]
    fn oversized_interval_clamps_instead_of_truncating() {
        let pattern = pattern_from_value(&json!({
            "type": "daily",
            "interval": u64::MAX
        }))
        .unwrap();
        assert_eq!(pattern.interval, u32::MAX);
    }

    #[test]
    fn preferences_coerce_field_by_field() {
        let prefs = preferences_from_value(&json!({
            "theme": "sepia",
            "viewMode": "grid",
            "notifications": "yes",
            "lastActiveView": "nowhere",
            "lastActiveSubView": "completed"
        }));
        assert_eq!(prefs.theme, Theme::System);
        assert_eq!(prefs.view_mode, ViewMode::Grid);
        assert!(prefs.notifications);
        assert_eq!(prefs.last_active_view, View::Overview);
        assert_eq!(prefs.last_active_sub_view, Some(SubView::Completed));
    }

    #[test]
    fn backup_requires_tasks_and_preferences() {
        let missing = json!({ "tasks": [] });
        assert!(matches!(
            backup_from_value(&missing, now()),
            Err(StorageError::Format(_))
        ));

        let ok = json!({ "tasks": [], "preferences": {} });
        assert!(backup_from_value(&ok, now()).is_ok());
    }

    #[test]
    fn clean_tasks_drops_blank_titles_and_trims() {
        let mut a = crate::sample::sample_drafts(now())[0].clone();
        a.title = "  padded  ".into();
        let task = crate::store::materialize_draft(a, "id-1".into(), now());
        let mut blank = task.clone();
        blank.title = "   ".into();
        let cleaned = clean_tasks(&[task, blank]);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].title, "padded");
    }
}
