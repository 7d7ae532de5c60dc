//! # TaskFlow core
//!
//! Local-first task management core: a reducer-style store over a validated,
//! versioned key-value persistence layer, with pure view derivation.
//!
//! ## Key pieces
//!
//! - **Task store** ([`TaskStore`]): single source of truth for the task
//!   collection and view/filter/sort state. All mutation routes through it;
//!   every mutation persists and recomputes derived stats.
//! - **Persistence adapter** ([`StorageService`]): validating, schema-
//!   versioned storage over a pluggable [`StorageBackend`] (in-memory or
//!   file-per-key), with corruption recovery, migration, debounced
//!   auto-save, and portable export/import.
//! - **Derivation engine** ([`engine`]): pure filtering, sorting, and
//!   aggregate statistics over the collection.
//! - **Recurrence expander** ([`expand_instances`]): bounded generation of
//!   future instances from a recurring template task.
//! - **Quick-add parser** ([`parse_quick_add`]): best-effort natural
//!   language heuristics for rapid task capture.
//!
//! ## Quick start
//!
//! ```no_run
//! use taskflow::{FileBackend, StorageService, TaskDraft, TaskStore};
//!
//! # fn main() -> Result<(), taskflow::StorageError> {
//! let backend = FileBackend::new("/tmp/taskflow")?;
//! let mut store = TaskStore::init(StorageService::new(backend));
//!
//! store.add_task(TaskDraft {
//!     title: "Write release notes".into(),
//!     ..TaskDraft::default()
//! });
//! println!("{} open tasks", store.stats().pending);
//! # Ok(())
//! # }
//! ```
//!
//! Initialization never fails: unreadable or corrupted persisted data
//! degrades to a bundled sample dataset and default preferences, so the
//! application always reaches a usable state.

pub mod engine;
pub mod error;
pub mod fields;
pub mod quickadd;
pub mod recurrence;
pub mod sample;
pub mod storage;
pub mod store;
pub mod task;
pub mod validate;

pub use error::StorageError;
pub use fields::{
    Category, CreationMode, Priority, RecurrenceKind, SortKey, Status, SubView, Theme, View,
    ViewMode,
};
pub use quickadd::parse_quick_add;
pub use recurrence::{expand_instances, DEFAULT_INSTANCE_COUNT};
pub use storage::{
    BackupDocument, Debouncer, FileBackend, MemoryBackend, MigrationOutcome, StorageBackend,
    StorageService, UserPreferences, CURRENT_SCHEMA_VERSION,
};
pub use store::TaskStore;
pub use task::{
    DateRange, RecurringPattern, Task, TaskDraft, TaskFilter, TaskPatch, TaskStats,
};
