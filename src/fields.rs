//! Enumerations and field types for task management.
//!
//! This module defines the structured data types used to categorise and
//! organise tasks, plus the navigation and preference enums, together with
//! lenient `parse_*` helpers that coerce unknown stored values to their
//! documented defaults instead of rejecting a whole record.

use serde::{Deserialize, Serialize};

/// Priority classification for task importance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Numeric weight used by priority sorting: high(3) > medium(2) > low(1).
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

/// Life-area grouping for a task.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Work,
    Personal,
    Health,
    #[default]
    Other,
}

/// Workflow status. Maintained alongside the `completed` flag; the store's
/// completion transition keeps the two in agreement.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// Period of a recurring pattern.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RecurrenceKind {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Custom,
}

/// How a task was created. Provenance only, never affects behaviour.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CreationMode {
    Quick,
    Detailed,
}

/// Top-level navigation destination.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    #[default]
    Overview,
    Tasks,
    Projects,
    Calendar,
    Settings,
}

/// Secondary selector within the tasks view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SubView {
    All,
    Completed,
}

/// Colour theme preference.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Task list presentation mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    #[default]
    List,
    Grid,
    Compact,
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    DueSoon,
    DueLater,
    PriorityHigh,
    PriorityLow,
    #[serde(rename = "title-a-z")]
    TitleAZ,
    #[serde(rename = "title-z-a")]
    TitleZA,
}

/// Parse a stored priority value, falling back to the default.
pub fn parse_priority(s: &str) -> Priority {
    match s {
        "low" => Priority::Low,
        "medium" => Priority::Medium,
        "high" => Priority::High,
        _ => Priority::default(),
    }
}

/// Parse a stored category value, falling back to the default.
pub fn parse_category(s: &str) -> Category {
    match s {
        "work" => Category::Work,
        "personal" => Category::Personal,
        "health" => Category::Health,
        "other" => Category::Other,
        _ => Category::default(),
    }
}

/// Parse a stored status value, falling back to the default.
pub fn parse_status(s: &str) -> Status {
    match s {
        "pending" => Status::Pending,
        "in-progress" => Status::InProgress,
        "completed" => Status::Completed,
        "cancelled" => Status::Cancelled,
        _ => Status::default(),
    }
}

/// Parse a stored recurrence kind, falling back to the default.
pub fn parse_recurrence_kind(s: &str) -> RecurrenceKind {
    match s {
        "daily" => RecurrenceKind::Daily,
        "weekly" => RecurrenceKind::Weekly,
        "monthly" => RecurrenceKind::Monthly,
        "custom" => RecurrenceKind::Custom,
        _ => RecurrenceKind::default(),
    }
}

/// Parse a stored creation mode. Unknown values drop the marker entirely.
pub fn parse_creation_mode(s: &str) -> Option<CreationMode> {
    match s {
        "quick" => Some(CreationMode::Quick),
        "detailed" => Some(CreationMode::Detailed),
        _ => None,
    }
}

/// Parse a stored view value, falling back to the default.
pub fn parse_view(s: &str) -> View {
    match s {
        "overview" => View::Overview,
        "tasks" => View::Tasks,
        "projects" => View::Projects,
        "calendar" => View::Calendar,
        "settings" => View::Settings,
        _ => View::default(),
    }
}

/// Parse a stored sub-view value. Unknown values clear the sub-view.
pub fn parse_sub_view(s: &str) -> Option<SubView> {
    match s {
        "all" => Some(SubView::All),
        "completed" => Some(SubView::Completed),
        _ => None,
    }
}

/// Parse a stored theme value, falling back to the default.
pub fn parse_theme(s: &str) -> Theme {
    match s {
        "light" => Theme::Light,
        "dark" => Theme::Dark,
        "system" => Theme::System,
        _ => Theme::default(),
    }
}

/// Parse a stored view mode, falling back to the default.
pub fn parse_view_mode(s: &str) -> ViewMode {
    match s {
        "list" => ViewMode::List,
        "grid" => ViewMode::Grid,
        "compact" => ViewMode::Compact,
        _ => ViewMode::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parsers_coerce_unknown_values_to_defaults() {
        assert_eq!(parse_priority("urgent"), Priority::Medium);
        assert_eq!(parse_category("finance"), Category::Other);
        assert_eq!(parse_status("done"), Status::Pending);
        assert_eq!(parse_view("dashboard"), View::Overview);
        assert_eq!(parse_sub_view("archived"), None);
        assert_eq!(parse_theme(""), Theme::System);
        assert_eq!(parse_view_mode("kanban"), ViewMode::List);
    }

    #[test]
    fn serde_names_use_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::to_string(&SortKey::TitleAZ).unwrap(),
            "\"title-a-z\""
        );
        assert_eq!(
            serde_json::from_str::<SortKey>("\"due-soon\"").unwrap(),
            SortKey::DueSoon
        );
    }

    #[test]
    fn priority_weights_are_ordered() {
        assert!(Priority::High.weight() > Priority::Medium.weight());
        assert!(Priority::Medium.weight() > Priority::Low.weight());
    }
}
