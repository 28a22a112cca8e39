//! Template persistence keyed by host.
//!
//! Stores keep one record per template id and a non-unique host index.
//! `query_by_host` returns templates in ascending id order, which is also
//! registration order since ids are allocated monotonically.

use crate::template::{AdTemplate, TemplateDraft, TemplateId};
use crate::util::AdSkipResult;

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryTemplateStore;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteTemplateStore, SCHEMA_VERSION};

/// Persistence operations used by registration and matching.
pub trait TemplateStore {
    /// Inserts or overwrites `template` under its id.
    fn put(&mut self, template: AdTemplate) -> AdSkipResult<TemplateId>;

    /// Allocates a fresh id for `draft` and stores it.
    fn insert(&mut self, draft: TemplateDraft) -> AdSkipResult<AdTemplate>;

    /// Fetches a single template.
    fn get(&self, id: TemplateId) -> AdSkipResult<Option<AdTemplate>>;

    /// All templates whose host equals `host` exactly.
    fn query_by_host(&self, host: &str) -> AdSkipResult<Vec<AdTemplate>>;

    /// Changes only the skip duration of an existing template.
    ///
    /// Fails with [`crate::AdSkipError::NotFound`] for unknown ids and
    /// [`crate::AdSkipError::InvalidDuration`] for non-positive durations.
    fn update_duration(&mut self, id: TemplateId, duration_ms: i64) -> AdSkipResult<()>;

    /// Removes every template for `host` and returns how many were removed.
    fn delete_by_host(&mut self, host: &str) -> AdSkipResult<usize>;
}
