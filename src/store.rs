//! The task store: single source of truth for tasks and view state.
//!
//! All mutation routes through here. Every mutating operation persists the
//! collection through the storage service and recomputes the derived stats.
//! Initialization never fails: unreadable persisted data degrades to the
//! bundled sample dataset and default settings.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::engine;
use crate::error::StorageError;
use crate::fields::{SortKey, Status, SubView, View, ViewMode};
use crate::recurrence;
use crate::sample;
use crate::storage::{StorageBackend, StorageService, UserPreferences};
use crate::task::{Task, TaskDraft, TaskFilter, TaskPatch, TaskStats};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 13;

/// Generate an opaque task id. Random base-36, long enough that collisions
/// are negligible; not a cryptographic guarantee.
pub(crate) fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Turn a draft into a full task with the given id and timestamps.
///
/// The three completion signals are reconciled at creation: if either the
/// `completed` flag or a completed status is set, all of `completed`,
/// `status`, and `completed_at` reflect completion together.
pub(crate) fn materialize_draft(draft: TaskDraft, id: String, now: DateTime<Utc>) -> Task {
    let completed = draft.completed || draft.status == Status::Completed;
    Task {
        id,
        title: draft.title.trim().to_string(),
        description: draft.description,
        completed,
        priority: draft.priority,
        category: draft.category,
        status: if completed { Status::Completed } else { draft.status },
        due_date: draft.due_date,
        created_at: now,
        updated_at: now,
        completed_at: completed.then_some(now),
        estimated_minutes: draft.estimated_minutes,
        actual_minutes: draft.actual_minutes,
        tags: draft.tags,
        mentions: draft.mentions,
        is_recurring: draft.is_recurring,
        recurring_pattern: draft.recurring_pattern,
        parent_task_id: draft.parent_task_id,
        creation_mode: draft.creation_mode,
    }
}

/// Apply a completion transition, keeping `completed`, `status`, and
/// `completed_at` consistent. Leaving completion keeps an explicit
/// non-completed status if one was set, otherwise falls back to pending.
fn set_completion(task: &mut Task, done: bool, now: DateTime<Utc>) {
    task.completed = done;
    if done {
        task.status = Status::Completed;
        task.completed_at = Some(now);
    } else {
        if task.status == Status::Completed {
            task.status = Status::Pending;
        }
        task.completed_at = None;
    }
}

/// Reducer-style store owning the task collection and UI-relevant state.
pub struct TaskStore<B: StorageBackend> {
    storage: StorageService<B>,
    tasks: Vec<Task>,
    current_view: View,
    current_sub_view: Option<SubView>,
    filter: TaskFilter,
    sort_by: SortKey,
    loading: bool,
    settings: UserPreferences,
    stats: TaskStats,
}

impl<B: StorageBackend> TaskStore<B> {
    /// Initialize the store from persisted state.
    ///
    /// Runs the corrupted-key sweep, migrates if the schema tag is stale,
    /// loads tasks (falling back to the sample dataset when nothing is
    /// stored), loads preferences, and restores the last active view. If
    /// anything escapes those guards the entire namespace is cleared and
    /// the store starts from sample data and defaults; this constructor
    /// never fails.
    pub fn init(storage: StorageService<B>) -> Self {
        let mut store = TaskStore {
            storage,
            tasks: Vec::new(),
            current_view: View::default(),
            current_sub_view: None,
            filter: TaskFilter::default(),
            sort_by: SortKey::default(),
            loading: true,
            settings: UserPreferences::default(),
            stats: TaskStats::default(),
        };

        if let Err(error) = store.initialize() {
            warn!(%error, "startup failed, clearing storage and loading sample data");
            store.storage.clear_all_data();
            store.settings = UserPreferences::default();
            store.current_view = View::default();
            store.current_sub_view = None;
            store.load_sample_data();
        }

        store.update_stats();
        store.loading = false;
        store
    }

    fn initialize(&mut self) -> Result<(), StorageError> {
        self.storage.clear_all_corrupted_data();

        if self.storage.needs_migration() {
            let outcome = self.storage.migrate_data()?;
            if outcome.migrated {
                info!("storage migrated to current schema");
            }
        }

        let tasks = self.storage.load_tasks();
        if tasks.is_empty() {
            self.load_sample_data();
        } else {
            self.tasks = tasks;
        }

        self.settings = self.storage.load_preferences();
        self.current_view = self.settings.last_active_view;
        self.current_sub_view = self.settings.last_active_sub_view;
        self.storage.set_auto_save(self.settings.auto_save);
        Ok(())
    }

    fn load_sample_data(&mut self) {
        let now = Utc::now();
        self.tasks = sample::sample_drafts(now)
            .into_iter()
            .enumerate()
            .map(|(i, draft)| {
                let mut task = materialize_draft(draft, generate_id(), now);
                // Spread creation over the past week so "newest" ordering
                // looks sensible out of the box.
                task.created_at = now - Duration::days((i % 7) as i64);
                task
            })
            .collect();
        debug!(count = self.tasks.len(), "loaded sample dataset");
        // Persist immediately so a restart sees the same ids instead of
        // regenerating a fresh sample set.
        self.persist();
    }

    fn persist(&mut self) {
        self.storage.save_tasks(&self.tasks);
        self.update_stats();
    }

    /// Create a task from a draft. Assigns a fresh id and
    /// `created_at == updated_at == now`, appends, and persists.
    pub fn add_task(&mut self, draft: TaskDraft) -> &Task {
        let task = materialize_draft(draft, generate_id(), Utc::now());
        self.tasks.push(task);
        self.persist();
        self.tasks.last().expect("task was just pushed")
    }

    /// Merge a partial update onto the matching task and bump `updated_at`.
    /// Silently a no-op when the id is unknown.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) {
        let now = Utc::now();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "update for unknown task ignored");
            return;
        };

        if let Some(title) = patch.title {
            if !title.trim().is_empty() {
                task.title = title.trim().to_string();
            }
        }
        if patch.clear_description {
            task.description = None;
        } else if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(category) = patch.category {
            task.category = category;
        }
        if patch.clear_due_date {
            task.due_date = None;
        } else if let Some(due) = patch.due_date {
            task.due_date = Some(due);
        }
        if let Some(estimated) = patch.estimated_minutes {
            task.estimated_minutes = Some(estimated);
        }
        if let Some(actual) = patch.actual_minutes {
            task.actual_minutes = Some(actual);
        }
        if let Some(tags) = patch.tags {
            task.tags = tags;
        }
        if let Some(mentions) = patch.mentions {
            task.mentions = mentions;
        }
        if let Some(status) = patch.status {
            task.status = status;
            if (status == Status::Completed) != task.completed {
                set_completion(task, status == Status::Completed, now);
                task.status = status;
            }
        }
        if let Some(done) = patch.completed {
            set_completion(task, done, now);
        }
        task.updated_at = now;
        self.persist();
    }

    /// Remove a task by id; no-op if absent.
    pub fn delete_task(&mut self, id: &str) {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() != before {
            self.persist();
        }
    }

    /// Flip a task's completion as a single consistent transition across
    /// `completed`, `status`, and `completed_at`.
    pub fn toggle_complete(&mut self, id: &str) {
        let now = Utc::now();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return;
        };
        let done = !task.completed;
        set_completion(task, done, now);
        task.updated_at = now;
        self.persist();
    }

    /// Update the current navigation location and persist it as the last
    /// active view so the next session restores the same place.
    pub fn set_view(&mut self, view: View, sub_view: Option<SubView>) {
        self.current_view = view;
        self.current_sub_view = sub_view;
        self.settings.last_active_view = view;
        self.settings.last_active_sub_view = sub_view;
        self.storage.save_preferences(&self.settings);
        self.storage.force_save();
    }

    /// Merge fields onto the transient filter. Not persisted.
    pub fn set_filter(&mut self, patch: TaskFilter) {
        self.filter.merge(patch);
    }

    /// Reset the transient filter.
    pub fn clear_filter(&mut self) {
        self.filter = TaskFilter::default();
    }

    /// Set the active sort key. Session-only; deliberately not persisted.
    pub fn set_sort(&mut self, key: SortKey) {
        self.sort_by = key;
    }

    /// Change the list presentation mode and persist it.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.settings.view_mode = mode;
        self.storage.save_preferences(&self.settings);
        self.storage.force_save();
    }

    /// Replace the settings and persist immediately.
    pub fn update_settings(&mut self, settings: UserPreferences) {
        self.storage.set_auto_save(settings.auto_save);
        self.settings = settings;
        self.storage.save_preferences(&self.settings);
        self.storage.force_save();
    }

    /// The current filter and sort applied to the full collection. Returns
    /// a new ordered sequence; stored order is untouched.
    pub fn filtered_tasks(&self) -> Vec<Task> {
        let mut tasks = engine::apply_filter(&self.tasks, &self.filter, Utc::now());
        engine::sort_tasks(&mut tasks, self.sort_by);
        tasks
    }

    /// View-specific base selection followed by the active sort:
    /// tasks/all shows incomplete, tasks/completed shows completed, every
    /// other view shows the full collection.
    pub fn tasks_for_view(&self, view: View, sub_view: Option<SubView>) -> Vec<Task> {
        let mut tasks: Vec<Task> = match (view, sub_view) {
            (View::Tasks, Some(SubView::Completed)) => {
                self.tasks.iter().filter(|t| t.completed).cloned().collect()
            }
            (View::Tasks, _) => {
                self.tasks.iter().filter(|t| !t.completed).cloned().collect()
            }
            _ => self.tasks.clone(),
        };
        engine::sort_tasks(&mut tasks, self.sort_by);
        tasks
    }

    /// Expand a recurring task into concrete instances and append them to
    /// the collection as ordinary tasks. Returns how many were added.
    pub fn materialize_recurring(&mut self, id: &str, count: usize) -> usize {
        let Some(parent) = self.tasks.iter().find(|t| t.id == id) else {
            return 0;
        };
        let Some(pattern) = parent.recurring_pattern.clone() else {
            debug!(id, "task has no recurring pattern");
            return 0;
        };
        let instances = recurrence::expand_instances(parent, &pattern, count, Utc::now());
        let added = instances.len();
        if added > 0 {
            self.tasks.extend(instances);
            self.persist();
        }
        added
    }

    /// Recompute derived stats from the current collection. Idempotent.
    pub fn update_stats(&mut self) {
        self.stats = engine::compute_stats(&self.tasks, Utc::now());
    }

    /// Serialize a full backup document.
    pub fn export_data(&mut self) -> Result<String, StorageError> {
        self.storage.export_data()
    }

    /// Import a backup document and refresh in-memory state from it.
    pub fn import_data(&mut self, data: &str) -> Result<(), StorageError> {
        self.storage.import_data(data)?;
        self.tasks = self.storage.load_tasks();
        self.settings = self.storage.load_preferences();
        self.storage.set_auto_save(self.settings.auto_save);
        self.update_stats();
        Ok(())
    }

    /// Run the debounced auto-save pass if it is due.
    pub fn poll_auto_save(&mut self) -> bool {
        self.storage.poll_auto_save()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn stats(&self) -> TaskStats {
        self.stats
    }

    pub fn settings(&self) -> &UserPreferences {
        &self.settings
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_by
    }

    pub fn current_view(&self) -> View {
        self.current_view
    }

    pub fn current_sub_view(&self) -> Option<SubView> {
        self.current_sub_view
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[cfg(test)]
    pub(crate) fn storage_mut(&mut self) -> &mut StorageService<B> {
        &mut self.storage
    }
}
