//! Durable local storage of tasks and preferences.
//!
//! The persistence adapter is a key-value layer with a pluggable backend:
//! `MemoryBackend` for tests and degraded in-memory operation, and
//! `FileBackend` for one JSON file per key with atomic temp-file writes.
//! Stored values are versioned under a schema tag, validated on load, and
//! recoverable from corruption: a malformed value is logged, its key is
//! removed, and the caller gets the documented default instead of an error.
//!
//! The service is an explicitly constructed instance handed to the store at
//! initialization; there is no global singleton.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::fields::{SubView, Theme, View, ViewMode};
use crate::task::Task;
use crate::validate;

/// Namespace prefix for every key owned by this application.
pub const KEY_PREFIX: &str = "taskflow_";
/// Key holding the serialized task collection.
pub const KEY_TASKS: &str = "taskflow_tasks";
/// Key holding the serialized user preferences.
pub const KEY_PREFERENCES: &str = "taskflow_preferences";
/// Key holding the schema version tag.
pub const KEY_SCHEMA_VERSION: &str = "taskflow_schema_version";
/// Key holding the last-backup marker (millisecond timestamp).
pub const KEY_LAST_BACKUP: &str = "taskflow_last_backup";

/// Version tag written alongside persisted data. A stored tag that differs
/// from this (including no tag at all) signals that migration is required.
pub const CURRENT_SCHEMA_VERSION: &str = "1.0.0";

/// Quiet period before a debounced auto-save pass runs.
pub const AUTO_SAVE_DELAY: Duration = Duration::from_millis(1000);

/// Persisted user preferences. Loaded once at startup, written through the
/// adapter on every settings change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub theme: Theme,
    pub view_mode: ViewMode,
    pub notifications: bool,
    pub auto_save: bool,
    pub last_active_view: View,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_sub_view: Option<SubView>,
    /// Opaque dashboard layout blob; round-tripped, never interpreted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_layouts: Option<Value>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        UserPreferences {
            theme: Theme::System,
            view_mode: ViewMode::List,
            notifications: true,
            auto_save: true,
            last_active_view: View::Overview,
            last_active_sub_view: None,
            dashboard_layouts: None,
        }
    }
}

/// Portable snapshot of everything this application persists. Pretty-printed
/// on export; import requires both `tasks` and `preferences` to be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub tasks: Vec<Task>,
    pub preferences: UserPreferences,
    pub schema_version: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
}

/// Result of a migration attempt that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOutcome {
    /// Whether a migration actually ran (false when already current).
    pub migrated: bool,
}

/// Key-value backend abstraction. Implementations only move strings; all
/// parsing, validation, and repair lives in [`StorageService`].
pub trait StorageBackend {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// In-memory backend used by tests and as the degraded fallback.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// File-per-key backend. Each key is stored as `<key>.json` inside the data
/// directory; writes go through a temp file and rename so a crash mid-write
/// cannot corrupt the previous value.
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (creating if necessary) a backend rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Write {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(FileBackend { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let write = |tmp: &Path| -> std::io::Result<()> {
            let mut f = File::create(tmp)?;
            f.write_all(value.as_bytes())?;
            f.flush()?;
            fs::rename(tmp, &path)
        };
        write(&tmp).map_err(|source| StorageError::Write {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&mut self, key: &str) {
        let _ = fs::remove_file(self.path_for(key));
    }

    fn keys(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension()? != "json" {
                    return None;
                }
                Some(path.file_stem()?.to_str()?.to_string())
            })
            .collect()
    }
}

/// Cancellable deadline timer used to coalesce bursts of writes.
///
/// A later `schedule` supersedes the pending one by resetting the deadline;
/// there is no separate cancellation handle.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer { delay, deadline: None }
    }

    /// Arm (or re-arm) the timer for one quiet period from now.
    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Drop any pending deadline without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether an action is scheduled, fired or not.
    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// If the quiet period has elapsed, disarm and report that the action
    /// should run now.
    pub fn fire_if_due(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Disarm and report whether anything was pending. Used by explicit user
    /// actions that must not wait out the quiet period.
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

/// Validating, versioned persistence service over a [`StorageBackend`].
pub struct StorageService<B: StorageBackend> {
    backend: B,
    auto_save_enabled: bool,
    debounce: Debouncer,
}

impl<B: StorageBackend> StorageService<B> {
    pub fn new(backend: B) -> Self {
        Self::with_delay(backend, AUTO_SAVE_DELAY)
    }

    /// Service with a custom debounce window. Tests use a zero delay.
    pub fn with_delay(backend: B, delay: Duration) -> Self {
        StorageService {
            backend,
            auto_save_enabled: true,
            debounce: Debouncer::new(delay),
        }
    }

    /// Enable or disable the debounced auto-save pass. Direct saves still
    /// happen either way.
    pub fn set_auto_save(&mut self, enabled: bool) {
        self.auto_save_enabled = enabled;
        if !enabled {
            self.debounce.cancel();
        }
    }

    /// Read and parse a stored value. A malformed value is removed, a broad
    /// corrupted-key sweep runs, and the caller sees "no data".
    fn read_value(&mut self, key: &str) -> Option<Value> {
        let raw = self.backend.get(key)?;
        if raw.trim().is_empty() {
            warn!(key, "empty stored value, clearing");
            self.backend.remove(key);
            return None;
        }
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(key, %error, "corrupt stored value, clearing");
                self.backend.remove(key);
                // One bad key often means neighbours are bad too.
                self.clear_all_corrupted_data();
                None
            }
        }
    }

    fn write_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.backend.set(key, &raw)
    }

    /// Load the task collection. Returns an empty sequence when nothing is
    /// stored or the stored value is unusable; never an error.
    pub fn load_tasks(&mut self) -> Vec<Task> {
        let now = Utc::now();
        match self.read_value(KEY_TASKS) {
            Some(Value::Array(values)) => validate::tasks_from_values(&values, now),
            Some(_) => {
                warn!("stored tasks value is not an array, clearing");
                self.backend.remove(KEY_TASKS);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Validate and persist the task collection, then arm the auto-save
    /// pass. A write failure is logged and the data stays memory-only for
    /// this session.
    pub fn save_tasks(&mut self, tasks: &[Task]) {
        let cleaned = validate::clean_tasks(tasks);
        if cleaned.len() != tasks.len() {
            warn!(
                dropped = tasks.len() - cleaned.len(),
                "dropping invalid tasks before save"
            );
        }
        if let Err(error) = self.write_json(KEY_TASKS, &cleaned) {
            warn!(%error, "saving tasks failed, keeping in-memory copy only");
        }
        self.auto_save();
    }

    /// Load preferences, coercing invalid fields to defaults.
    pub fn load_preferences(&mut self) -> UserPreferences {
        match self.read_value(KEY_PREFERENCES) {
            Some(value) => validate::preferences_from_value(&value),
            None => UserPreferences::default(),
        }
    }

    /// Persist preferences and arm the auto-save pass.
    pub fn save_preferences(&mut self, preferences: &UserPreferences) {
        if let Err(error) = self.write_json(KEY_PREFERENCES, preferences) {
            warn!(%error, "saving preferences failed, keeping in-memory copy only");
        }
        self.auto_save();
    }

    fn stored_version(&mut self) -> String {
        self.read_value(KEY_SCHEMA_VERSION)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "0.0.0".to_string())
    }

    /// Whether the stored schema tag differs from the current version. A
    /// missing tag counts as a mismatch.
    pub fn needs_migration(&mut self) -> bool {
        self.stored_version() != CURRENT_SCHEMA_VERSION
    }

    /// Reload both collections through the validating loaders (repairing
    /// their shape) and rewrite them under the current version tag.
    pub fn migrate_data(&mut self) -> Result<MigrationOutcome, StorageError> {
        let stored = self.stored_version();
        if stored == CURRENT_SCHEMA_VERSION {
            return Ok(MigrationOutcome { migrated: false });
        }
        info!(from = %stored, to = CURRENT_SCHEMA_VERSION, "migrating stored data");

        let tasks = self.load_tasks();
        let preferences = self.load_preferences();
        self.write_json(KEY_TASKS, &validate::clean_tasks(&tasks))?;
        self.write_json(KEY_PREFERENCES, &preferences)?;
        self.write_json(KEY_SCHEMA_VERSION, &CURRENT_SCHEMA_VERSION)?;
        Ok(MigrationOutcome { migrated: true })
    }

    /// Serialize a full snapshot (tasks, preferences, schema version,
    /// modification timestamp) suitable for download or backup.
    pub fn export_data(&mut self) -> Result<String, StorageError> {
        let document = BackupDocument {
            tasks: self.load_tasks(),
            preferences: self.load_preferences(),
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            last_modified: Utc::now().timestamp_millis(),
        };
        let raw = serde_json::to_string_pretty(&document).map_err(|source| {
            StorageError::Serialize {
                key: "export".to_string(),
                source,
            }
        })?;
        if let Err(error) = self.write_json(KEY_LAST_BACKUP, &document.last_modified) {
            warn!(%error, "could not record last-backup marker");
        }
        self.force_save();
        Ok(raw)
    }

    /// Parse and commit a backup document. The document must contain both
    /// `tasks` and `preferences`; validation runs before any write, so a
    /// rejected document leaves storage untouched.
    pub fn import_data(&mut self, data: &str) -> Result<(), StorageError> {
        let value: Value = serde_json::from_str(data)
            .map_err(|e| StorageError::Format(e.to_string()))?;
        let (tasks, preferences) = validate::backup_from_value(&value, Utc::now())?;

        self.write_json(KEY_TASKS, &tasks)?;
        self.write_json(KEY_PREFERENCES, &preferences)?;
        self.write_json(KEY_SCHEMA_VERSION, &CURRENT_SCHEMA_VERSION)?;
        self.force_save();
        info!(tasks = tasks.len(), "imported backup document");
        Ok(())
    }

    /// Remove every key this application owns.
    pub fn clear_all_data(&mut self) {
        for key in [KEY_TASKS, KEY_PREFERENCES, KEY_SCHEMA_VERSION, KEY_LAST_BACKUP] {
            self.backend.remove(key);
        }
        info!("cleared all stored data");
    }

    /// Best-effort sweep over every key in this application's namespace:
    /// any value that fails to parse is deleted, so a single malformed
    /// record cannot block loading of healthy ones.
    pub fn clear_all_corrupted_data(&mut self) {
        for key in self.backend.keys() {
            if !key.starts_with(KEY_PREFIX) {
                continue;
            }
            let Some(raw) = self.backend.get(&key) else {
                continue;
            };
            if serde_json::from_str::<Value>(&raw).is_err() {
                warn!(key = %key, "removing corrupted key");
                self.backend.remove(&key);
            }
        }
    }

    /// Arm the debounced auto-save pass, superseding any pending one.
    pub fn auto_save(&mut self) {
        if self.auto_save_enabled {
            self.debounce.schedule();
        }
    }

    /// Run the pending auto-save pass if its quiet period has elapsed.
    /// Returns whether a pass ran.
    pub fn poll_auto_save(&mut self) -> bool {
        if self.debounce.fire_if_due() {
            self.run_save_pass();
            true
        } else {
            false
        }
    }

    /// Bypass the debounce window and run the save pass immediately. Used
    /// for explicit user actions such as export and settings changes.
    pub fn force_save(&mut self) {
        self.debounce.cancel();
        self.run_save_pass();
    }

    /// Consolidation pass: re-read both collections through the validators,
    /// rewrite them, and stamp the schema version.
    fn run_save_pass(&mut self) {
        debug!("running storage save pass");
        let tasks = self.load_tasks();
        let preferences = self.load_preferences();
        if let Err(error) = self.write_json(KEY_TASKS, &tasks) {
            warn!(%error, "save pass could not write tasks");
        }
        if let Err(error) = self.write_json(KEY_PREFERENCES, &preferences) {
            warn!(%error, "save pass could not write preferences");
        }
        if let Err(error) = self.write_json(KEY_SCHEMA_VERSION, &CURRENT_SCHEMA_VERSION) {
            warn!(%error, "save pass could not write schema version");
        }
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Category, Priority};
    use crate::store::materialize_draft;
    use crate::task::TaskDraft;

    fn service() -> StorageService<MemoryBackend> {
        StorageService::with_delay(MemoryBackend::new(), Duration::ZERO)
    }

    fn task(id: &str, title: &str) -> Task {
        let draft = TaskDraft {
            title: title.to_string(),
            priority: Priority::High,
            category: Category::Work,
            tags: vec!["alpha".into()],
            ..TaskDraft::default()
        };
        materialize_draft(draft, id.to_string(), Utc::now())
    }

    #[test]
    fn load_tasks_returns_empty_when_nothing_stored() {
        assert!(service().load_tasks().is_empty());
    }

    #[test]
    fn corrupt_tasks_value_is_removed_and_treated_as_no_data() {
        let mut svc = service();
        svc.backend_mut()
            .set(KEY_TASKS, "{definitely not json")
            .unwrap();
        assert!(svc.load_tasks().is_empty());
        assert!(svc.backend().get(KEY_TASKS).is_none());
    }

    #[test]
    fn save_and_load_round_trips_tasks() {
        let mut svc = service();
        let tasks = vec![task("a", "First"), task("b", "Second")];
        svc.save_tasks(&tasks);
        assert_eq!(svc.load_tasks(), tasks);
    }

    #[test]
    fn save_tasks_drops_records_without_title() {
        let mut svc = service();
        let mut bad = task("b", "placeholder");
        bad.title = "  ".into();
        svc.save_tasks(&[task("a", "Keep me"), bad]);
        let loaded = svc.load_tasks();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "a");
    }

    #[test]
    fn preferences_default_when_absent_and_round_trip() {
        let mut svc = service();
        assert_eq!(svc.load_preferences(), UserPreferences::default());

        let prefs = UserPreferences {
            theme: Theme::Dark,
            view_mode: ViewMode::Grid,
            last_active_view: View::Tasks,
            last_active_sub_view: Some(SubView::Completed),
            ..UserPreferences::default()
        };
        svc.save_preferences(&prefs);
        assert_eq!(svc.load_preferences(), prefs);
    }

    #[test]
    fn migration_runs_once_and_stamps_the_version() {
        let mut svc = service();
        svc.save_tasks(&[task("a", "Survivor")]);
        assert!(svc.needs_migration(), "no tag counts as mismatch");

        let outcome = svc.migrate_data().unwrap();
        assert!(outcome.migrated);
        assert!(!svc.needs_migration());
        assert_eq!(svc.load_tasks().len(), 1);

        let outcome = svc.migrate_data().unwrap();
        assert!(!outcome.migrated);
    }

    #[test]
    fn export_import_round_trips_tasks_and_preferences() {
        let mut svc = service();
        let tasks = vec![task("a", "First"), task("b", "Second")];
        svc.save_tasks(&tasks);
        let prefs = UserPreferences {
            theme: Theme::Light,
            ..UserPreferences::default()
        };
        svc.save_preferences(&prefs);

        let document = svc.export_data().unwrap();

        let mut fresh = service();
        fresh.import_data(&document).unwrap();
        assert_eq!(fresh.load_tasks(), tasks);
        assert_eq!(fresh.load_preferences(), prefs);
        assert!(!fresh.needs_migration());
    }

    #[test]
    fn import_rejects_document_missing_preferences() {
        let mut svc = service();
        let err = svc.import_data(r#"{ "tasks": [] }"#).unwrap_err();
        assert!(matches!(err, StorageError::Format(_)));
        assert!(svc.backend().get(KEY_TASKS).is_none(), "storage untouched");
    }

    #[test]
    fn import_rejects_unparsable_input() {
        let mut svc = service();
        assert!(matches!(
            svc.import_data("not json at all"),
            Err(StorageError::Format(_))
        ));
    }

    #[test]
    fn corrupted_key_sweep_removes_only_bad_namespaced_keys() {
        let mut svc = service();
        svc.backend_mut().set(KEY_TASKS, "[broken").unwrap();
        svc.backend_mut().set(KEY_PREFERENCES, "{}").unwrap();
        svc.backend_mut().set("unrelated_app", "also broken{").unwrap();

        svc.clear_all_corrupted_data();

        assert!(svc.backend().get(KEY_TASKS).is_none());
        assert!(svc.backend().get(KEY_PREFERENCES).is_some());
        assert!(svc.backend().get("unrelated_app").is_some());
    }

    #[test]
    fn clear_all_data_removes_every_known_key() {
        let mut svc = service();
        svc.save_tasks(&[task("a", "First")]);
        svc.save_preferences(&UserPreferences::default());
        svc.force_save();
        svc.clear_all_data();
        for key in [KEY_TASKS, KEY_PREFERENCES, KEY_SCHEMA_VERSION, KEY_LAST_BACKUP] {
            assert!(svc.backend().get(key).is_none(), "{key} should be gone");
        }
    }

    #[test]
    fn auto_save_pass_fires_after_quiet_period_and_stamps_version() {
        let mut svc = service();
        svc.save_tasks(&[task("a", "First")]);
        assert!(svc.poll_auto_save(), "zero-delay debounce is due at once");
        assert!(!svc.poll_auto_save(), "a pass disarms the timer");
        assert!(!svc.needs_migration());
    }

    #[test]
    fn disabling_auto_save_cancels_the_pending_pass() {
        let mut svc = service();
        svc.save_tasks(&[task("a", "First")]);
        svc.set_auto_save(false);
        assert!(!svc.poll_auto_save());
        svc.save_tasks(&[task("a", "First")]);
        assert!(!svc.poll_auto_save());
    }

    #[test]
    fn debouncer_reschedule_supersedes_and_flush_disarms() {
        let mut debounce = Debouncer::new(Duration::from_secs(60));
        debounce.schedule();
        debounce.schedule();
        assert!(debounce.pending());
        assert!(!debounce.fire_if_due(), "quiet period not elapsed");
        assert!(debounce.flush());
        assert!(!debounce.pending());
        assert!(!debounce.flush());
    }

    #[test]
    fn file_backend_round_trips_and_lists_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FileBackend::new(dir.path()).unwrap();
        backend.set(KEY_TASKS, "[]").unwrap();
        backend.set(KEY_SCHEMA_VERSION, "\"1.0.0\"").unwrap();

        assert_eq!(backend.get(KEY_TASKS).as_deref(), Some("[]"));
        let mut keys = backend.keys();
        keys.sort();
        assert_eq!(keys, vec![KEY_SCHEMA_VERSION, KEY_TASKS]);

        backend.remove(KEY_TASKS);
        assert!(backend.get(KEY_TASKS).is_none());
    }

    #[test]
    fn file_backed_service_survives_a_corrupted_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{KEY_TASKS}.json")), "oops").unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();
        let mut svc = StorageService::with_delay(backend, Duration::ZERO);
        assert!(svc.load_tasks().is_empty());
        assert!(svc.backend().get(KEY_TASKS).is_none());
    }
}
