//! Bundled sample dataset.
//!
//! Used when nothing is stored yet and as the guaranteed-usable fallback
//! after a catastrophic startup failure, so the app never greets the user
//! with an empty or broken screen.

use chrono::{DateTime, Duration, Utc};

use crate::fields::{Category, CreationMode, Priority, RecurrenceKind, Status};
use crate::task::{RecurringPattern, TaskDraft};

/// Build the sample drafts with due dates relative to `now`. The store
/// assigns ids and timestamps when materializing them.
pub fn sample_drafts(now: DateTime<Utc>) -> Vec<TaskDraft> {
    let yesterday = now - Duration::days(1);
    let tomorrow = now + Duration::days(1);
    let next_week = now + Duration::days(7);

    vec![
        TaskDraft {
            title: "Prepare quarterly board presentation".into(),
            description: Some(
                "Cover revenue growth, market expansion, and strategic initiatives. \
                 Include financial projections."
                    .into(),
            ),
            status: Status::InProgress,
            priority: Priority::High,
            category: Category::Work,
            due_date: Some(tomorrow),
            estimated_minutes: Some(180),
            actual_minutes: Some(45),
            tags: vec!["presentation".into(), "quarterly".into()],
            mentions: vec!["sarah".into(), "mike".into()],
            creation_mode: Some(CreationMode::Detailed),
            ..TaskDraft::default()
        },
        TaskDraft {
            title: "Fix authentication security bug".into(),
            description: Some("Address login vulnerability affecting all users.".into()),
            priority: Priority::High,
            category: Category::Work,
            due_date: Some(now),
            estimated_minutes: Some(120),
            tags: vec!["security".into(), "bug".into()],
            creation_mode: Some(CreationMode::Detailed),
            ..TaskDraft::default()
        },
        TaskDraft {
            title: "Review pull request #247".into(),
            description: Some("Dashboard component: accessibility and performance.".into()),
            status: Status::InProgress,
            priority: Priority::Medium,
            category: Category::Work,
            due_date: Some(tomorrow),
            estimated_minutes: Some(60),
            tags: vec!["code-review".into()],
            mentions: vec!["alex".into()],
            creation_mode: Some(CreationMode::Detailed),
            ..TaskDraft::default()
        },
        TaskDraft {
            title: "Book dentist appointment".into(),
            priority: Priority::Medium,
            category: Category::Health,
            due_date: Some(next_week),
            tags: vec!["appointment".into()],
            creation_mode: Some(CreationMode::Quick),
            ..TaskDraft::default()
        },
        TaskDraft {
            title: "Morning run".into(),
            description: Some("5k around the park.".into()),
            priority: Priority::Low,
            category: Category::Health,
            due_date: Some(tomorrow),
            estimated_minutes: Some(30),
            is_recurring: true,
            recurring_pattern: Some(RecurringPattern {
                kind: RecurrenceKind::Daily,
                interval: 1,
                days_of_week: Vec::new(),
                end_date: None,
                count: None,
            }),
            creation_mode: Some(CreationMode::Detailed),
            ..TaskDraft::default()
        },
        TaskDraft {
            title: "Pay electricity bill".into(),
            priority: Priority::High,
            category: Category::Personal,
            due_date: Some(yesterday),
            tags: vec!["bills".into()],
            creation_mode: Some(CreationMode::Quick),
            ..TaskDraft::default()
        },
        TaskDraft {
            title: "Plan weekend trip".into(),
            description: Some("Compare routes and book accommodation.".into()),
            priority: Priority::Low,
            category: Category::Personal,
            due_date: Some(next_week),
            creation_mode: Some(CreationMode::Quick),
            ..TaskDraft::default()
        },
        TaskDraft {
            title: "Update project documentation".into(),
            completed: true,
            status: Status::Completed,
            priority: Priority::Medium,
            category: Category::Work,
            due_date: Some(yesterday),
            estimated_minutes: Some(90),
            actual_minutes: Some(75),
            tags: vec!["docs".into()],
            creation_mode: Some(CreationMode::Detailed),
            ..TaskDraft::default()
        },
    ]
}
