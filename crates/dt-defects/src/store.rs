//! ---
//! dt_section: "02-defect-domain"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Defect persistence seam and in-memory backend."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use std::collections::HashMap;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::comment::Comment;
use crate::defect::{Defect, DefectId};
use crate::error::StoreError;

/// Persistence backend for defects and their comments.
///
/// Read-modify-write of a stored defect goes through [`DefectStore::update`],
/// which backends must run atomically; the service performs no locking of its
/// own.
pub trait DefectStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<Defect>, StoreError>;
    /// Insert or replace a defect.
    fn put(&self, defect: Defect) -> Result<(), StoreError>;
    /// Replace a defect with `apply(current)` as one atomic step. Returns the
    /// stored result, or `None` when the defect does not exist.
    fn update(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&Defect) -> Defect,
    ) -> Result<Option<Defect>, StoreError>;
    /// Remove a defect and its comments.
    fn remove(&self, id: &str) -> Result<Option<Defect>, StoreError>;
    /// All defects in insertion order.
    fn list(&self) -> Result<Vec<Defect>, StoreError>;
    /// Attach a comment. Returns `false`, storing nothing, when the defect
    /// does not exist at the time of the insert.
    fn add_comment(&self, comment: Comment) -> Result<bool, StoreError>;
    /// Comments for a defect, oldest first.
    fn comments(&self, defect_id: &str) -> Result<Vec<Comment>, StoreError>;
}

/// In-memory store used by tests and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryDefectStore {
    defects: RwLock<IndexMap<DefectId, Defect>>,
    comments: RwLock<HashMap<DefectId, Vec<Comment>>>,
}

impl InMemoryDefectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with existing records.
    pub fn with_defects(defects: impl IntoIterator<Item = Defect>) -> Self {
        let store = Self::new();
        store
            .defects
            .write()
            .extend(defects.into_iter().map(|d| (d.id.clone(), d)));
        store
    }
}

impl DefectStore for InMemoryDefectStore {
    fn get(&self, id: &str) -> Result<Option<Defect>, StoreError> {
        Ok(self.defects.read().get(id).cloned())
    }

    fn put(&self, defect: Defect) -> Result<(), StoreError> {
        self.defects.write().insert(defect.id.clone(), defect);
        Ok(())
    }

    fn update(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&Defect) -> Defect,
    ) -> Result<Option<Defect>, StoreError> {
        let mut defects = self.defects.write();
        let Some(slot) = defects.get_mut(id) else {
            return Ok(None);
        };
        *slot = apply(slot);
        Ok(Some(slot.clone()))
    }

    fn remove(&self, id: &str) -> Result<Option<Defect>, StoreError> {
        // Lock order: defects, then comments.
        let mut defects = self.defects.write();
        let removed = defects.shift_remove(id);
        if removed.is_some() {
            self.comments.write().remove(id);
        }
        Ok(removed)
    }

    fn list(&self) -> Result<Vec<Defect>, StoreError> {
        Ok(self.defects.read().values().cloned().collect())
    }

    fn add_comment(&self, comment: Comment) -> Result<bool, StoreError> {
        let defects = self.defects.read();
        if !defects.contains_key(&comment.defect_id) {
            return Ok(false);
        }
        self.comments
            .write()
            .entry(comment.defect_id.clone())
            .or_default()
            .push(comment);
        Ok(true)
    }

    fn comments(&self, defect_id: &str) -> Result<Vec<Comment>, StoreError> {
        Ok(self
            .comments
            .read()
            .get(defect_id)
            .cloned()
            .unwrap_or_default())
    }
}
