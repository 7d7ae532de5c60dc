//! Best-effort natural-language parsing for quick task entry.
//!
//! Turns a free-form line like "call dentist tomorrow #health urgent" into
//! a task draft: relative date phrases become a due date, priority and
//! category keywords are detected, and `#tag` / `@mention` tokens are
//! extracted. Everything consumed by the parser is stripped from the title;
//! if nothing is left, the raw text is kept. This is a heuristic and never
//! fails.

use chrono::{DateTime, Duration, Utc};

use crate::fields::{Category, CreationMode, Priority};
use crate::task::TaskDraft;

const HIGH_WORDS: [&str; 4] = ["urgent", "asap", "critical", "high"];
const MEDIUM_WORDS: [&str; 3] = ["medium", "normal", "moderate"];
const LOW_WORDS: [&str; 3] = ["low", "someday", "whenever"];

const WORK_WORDS: [&str; 5] = ["work", "job", "office", "meeting", "project"];
const PERSONAL_WORDS: [&str; 4] = ["personal", "home", "family", "life"];
const HEALTH_WORDS: [&str; 5] = ["health", "fitness", "exercise", "doctor", "medical"];

/// Parse a quick-add line into a draft. The draft is marked with
/// `CreationMode::Quick`.
pub fn parse_quick_add(text: &str, now: DateTime<Utc>) -> TaskDraft {
    let mut draft = TaskDraft {
        creation_mode: Some(CreationMode::Quick),
        ..TaskDraft::default()
    };

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut consumed = vec![false; tokens.len()];

    // Date phrases first, so "next" is not left dangling in the title.
    for i in 0..tokens.len() {
        if consumed[i] || draft.due_date.is_some() {
            continue;
        }
        let word = tokens[i].to_lowercase();
        match word.trim_matches(|c: char| !c.is_alphanumeric()) {
            "today" => {
                draft.due_date = Some(now);
                consumed[i] = true;
            }
            "tomorrow" => {
                draft.due_date = Some(now + Duration::days(1));
                consumed[i] = true;
            }
            "next" if i + 1 < tokens.len() => match tokens[i + 1].to_lowercase().as_str() {
                "week" => {
                    draft.due_date = Some(now + Duration::days(7));
                    consumed[i] = true;
                    consumed[i + 1] = true;
                }
                "month" => {
                    draft.due_date = Some(now + Duration::days(30));
                    consumed[i] = true;
                    consumed[i + 1] = true;
                }
                _ => {}
            },
            "in" if i + 2 < tokens.len() => {
                let days = tokens[i + 1].parse::<i64>().ok();
                let unit = tokens[i + 2].to_lowercase();
                if let (Some(days), "day" | "days") = (days, unit.as_str()) {
                    draft.due_date = Some(now + Duration::days(days));
                    consumed[i] = true;
                    consumed[i + 1] = true;
                    consumed[i + 2] = true;
                }
            }
            _ => {}
        }
    }

    let mut priority: Option<Priority> = None;
    let mut category: Option<Category> = None;

    for (i, token) in tokens.iter().enumerate() {
        if consumed[i] {
            continue;
        }
        if let Some(tag) = token.strip_prefix('#').filter(|t| !t.is_empty()) {
            draft.tags.push(tag.to_string());
            consumed[i] = true;
            continue;
        }
        if let Some(mention) = token.strip_prefix('@').filter(|m| !m.is_empty()) {
            draft.mentions.push(mention.to_string());
            consumed[i] = true;
            continue;
        }

        let word = token
            .to_lowercase()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_string();

        if priority.is_none() {
            if HIGH_WORDS.contains(&word.as_str()) {
                priority = Some(Priority::High);
                consumed[i] = true;
                continue;
            }
            if MEDIUM_WORDS.contains(&word.as_str()) {
                priority = Some(Priority::Medium);
                consumed[i] = true;
                continue;
            }
            if LOW_WORDS.contains(&word.as_str()) {
                priority = Some(Priority::Low);
                consumed[i] = true;
                continue;
            }
        }
        if category.is_none() {
            if WORK_WORDS.contains(&word.as_str()) {
                category = Some(Category::Work);
                consumed[i] = true;
                continue;
            }
            if PERSONAL_WORDS.contains(&word.as_str()) {
                category = Some(Category::Personal);
                consumed[i] = true;
                continue;
            }
            if HEALTH_WORDS.contains(&word.as_str()) {
                category = Some(Category::Health);
                consumed[i] = true;
            }
        }
    }

    draft.priority = priority.unwrap_or_default();
    draft.category = category.unwrap_or_default();

    let title: Vec<&str> = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| !consumed[*i])
        .map(|(_, t)| *t)
        .collect();
    let title = title.join(" ");
    draft.title = if title.is_empty() {
        text.trim().to_string()
    } else {
        title
    };

    draft
}
