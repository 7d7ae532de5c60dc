//! Task data structures and related functionality.
//!
//! This module defines the core `Task` struct that represents a single work
//! item with all its associated metadata, plus the transient filter, the
//! derived statistics record, and the draft/patch shapes used by the store's
//! mutation operations.
//!
//! Persisted field names are camelCase and timestamps serialize as ISO 8601
//! strings, matching the on-disk document format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A unit of user work with status/priority/category/scheduling metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub category: Category,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_pattern: Option<RecurringPattern>,
    /// Back-reference to the originating recurring task. Not an ownership
    /// link: deleting the parent does not cascade to instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_mode: Option<CreationMode>,
}

/// Rule for generating future task instances from a template task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPattern {
    #[serde(rename = "type")]
    pub kind: RecurrenceKind,
    pub interval: u32,
    /// Subset of {0..6}, 0 = Sunday.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// Input for creating a task. The store assigns the id and timestamps.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub category: Category,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<u32>,
    pub actual_minutes: Option<u32>,
    pub tags: Vec<String>,
    pub mentions: Vec<String>,
    pub is_recurring: bool,
    pub recurring_pattern: Option<RecurringPattern>,
    pub parent_task_id: Option<String>,
    pub creation_mode: Option<CreationMode>,
}

/// Partial update applied to an existing task. `None` fields are left
/// untouched; the `clear_*` flags reset their optional counterparts.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<u32>,
    pub actual_minutes: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub mentions: Option<Vec<String>>,
    pub clear_due_date: bool,
    pub clear_description: bool,
}

/// Inclusive due-date window for filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A transient predicate set narrowing the visible task collection.
///
/// All fields are independently optional and AND-combined when present.
/// Filters live only in store state for the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub due_today: Option<bool>,
    pub due_this_week: Option<bool>,
    pub overdue: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub search: Option<String>,
    pub date_range: Option<DateRange>,
}

impl TaskFilter {
    /// Merge another filter onto this one. Fields present in `patch`
    /// overwrite; absent fields keep their current value.
    pub fn merge(&mut self, patch: TaskFilter) {
        if patch.category.is_some() {
            self.category = patch.category;
        }
        if patch.priority.is_some() {
            self.priority = patch.priority;
        }
        if patch.completed.is_some() {
            self.completed = patch.completed;
        }
        if patch.due_today.is_some() {
            self.due_today = patch.due_today;
        }
        if patch.due_this_week.is_some() {
            self.due_this_week = patch.due_this_week;
        }
        if patch.overdue.is_some() {
            self.overdue = patch.overdue;
        }
        if patch.tags.is_some() {
            self.tags = patch.tags;
        }
        if patch.search.is_some() {
            self.search = patch.search;
        }
        if patch.date_range.is_some() {
            self.date_range = patch.date_range;
        }
    }
}

/// Aggregate counters derived from the task collection. Never stored;
/// recomputed whenever the collection changes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub completed_today: usize,
    pub due_today: usize,
    /// Retained for the external document shape; focus sessions are not
    /// tracked by this core and the count is always zero.
    pub focus_sessions_completed: usize,
}
