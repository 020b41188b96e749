//! Row selection that stays consistent with a changing dataset.
//!
//! The selection is a set of ids interpreted against whatever dataset the
//! caller renders. Datasets change underneath it (filtering, refetch,
//! deletion), so every dataset-aware operation prunes ids that no longer
//! exist before deciding anything else.

use super::types::{ConsoleError, ConsoleResult, Entity, EntityId};
use std::collections::BTreeSet;
use tracing::debug;

/// Selected row ids for one table
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    selected: BTreeSet<EntityId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`.
    ///
    /// The id does not have to be in the current dataset; the next
    /// reconciliation drops it if it never shows up.
    pub fn toggle(&mut self, id: EntityId) -> ConsoleResult<bool> {
        if !id.is_usable() {
            return Err(ConsoleError::UnusableId);
        }

        if !self.selected.remove(&id) {
            self.selected.insert(id);
            return Ok(true);
        }
        Ok(false)
    }

    /// Toggle the row at `index` in `dataset`
    pub fn toggle_at<E: Entity>(&mut self, index: usize, dataset: &[E]) -> ConsoleResult<bool> {
        let entity = dataset.get(index).ok_or(ConsoleError::IndexOutOfBounds {
            index,
            len: dataset.len(),
        })?;

        let id = entity.usable_id().ok_or(ConsoleError::UnusableId)?;
        self.toggle(id)
    }

    /// Select every row of `dataset`, or clear everything if all rows already are.
    ///
    /// Calling it twice on the same dataset leaves the selection empty. An empty
    /// dataset leaves the selection alone.
    pub fn select_all<E: Entity>(&mut self, dataset: &[E]) {
        self.reconcile(dataset);

        if dataset.is_empty() {
            return;
        }

        if self.all_selected(dataset) {
            self.selected.clear();
        } else {
            self.selected = dataset_ids(dataset);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Deselect `id` if it is selected
    pub fn remove(&mut self, id: &EntityId) -> bool {
        self.selected.remove(id)
    }

    /// Drop every selected id that `dataset` no longer contains.
    /// Returns how many ids were pruned.
    pub fn reconcile<E: Entity>(&mut self, dataset: &[E]) -> usize {
        let valid = dataset_ids(dataset);
        let before = self.selected.len();
        self.selected.retain(|id| valid.contains(id));

        let pruned = before - self.selected.len();
        if pruned > 0 {
            debug!("Pruned {} stale selections", pruned);
        }
        pruned
    }

    /// True when the selection is non-empty and equals the dataset's id set
    pub fn all_selected<E: Entity>(&self, dataset: &[E]) -> bool {
        !self.selected.is_empty() && self.selected == dataset_ids(dataset)
    }

    /// Dataset rows whose id is selected, in dataset order
    pub fn selected_entities<'a, E: Entity>(&self, dataset: &'a [E]) -> Vec<&'a E> {
        dataset
            .iter()
            .filter(|entity| {
                entity
                    .usable_id()
                    .is_some_and(|id| self.selected.contains(&id))
            })
            .collect()
    }

    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_ids(&self) -> &BTreeSet<EntityId> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

fn dataset_ids<E: Entity>(dataset: &[E]) -> BTreeSet<EntityId> {
    dataset.iter().filter_map(Entity::usable_id).collect()
}
