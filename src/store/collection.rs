//! In-memory record collection with atomic conditional mutation.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};
use crate::notify::Logger;

/// Decision returned by a [`Collection::resolve`] closure.
#[derive(Debug)]
pub enum Resolution<T> {
    /// Replace the record with the given draft.
    Replace(T),
    /// Remove the record permanently.
    Remove,
}

/// What a [`Collection::resolve`] call did, carrying the final record.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Record was replaced; holds the new value.
    Updated(T),
    /// Record was removed; holds the last value it had.
    Removed(T),
}

/// A named, thread-safe record map keyed by id.
///
/// All writers take the map's write lock for exactly the duration of one
/// check-and-mutate, so every guarded transition is atomic with respect to
/// every other. A closure that returns an error writes nothing: mutation
/// happens on a draft clone that is only committed on success.
#[derive(Debug)]
pub struct Collection<T> {
    entity: &'static str,
    records: RwLock<HashMap<Uuid, T>>,
}

impl<T: Clone> Collection<T> {
    /// Create an empty collection for the named entity kind.
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Entity kind this collection stores, e.g. `"tour"`.
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    fn read_guard(&self) -> CoreResult<RwLockReadGuard<'_, HashMap<Uuid, T>>> {
        self.records.read().map_err(|_| self.poisoned())
    }

    fn write_guard(&self) -> CoreResult<RwLockWriteGuard<'_, HashMap<Uuid, T>>> {
        self.records.write().map_err(|_| self.poisoned())
    }

    /// A writer panicked while holding the lock. The map may be mid-mutation,
    /// so every subsequent access fails rather than serving torn state.
    fn poisoned(&self) -> CoreError {
        Logger::error("STORE_LOCK_POISONED", &[("entity", self.entity)]);
        CoreError::Internal(format!("{} store lock poisoned", self.entity))
    }

    /// Insert a new record. Fails with `Conflict` if the id already exists.
    pub fn insert(&self, id: Uuid, record: T) -> CoreResult<()> {
        let mut map = self.write_guard()?;
        if map.contains_key(&id) {
            return Err(CoreError::Conflict(format!(
                "{} {} already exists",
                self.entity, id
            )));
        }
        map.insert(id, record);
        Ok(())
    }

    /// Admission-controlled insert.
    ///
    /// `admit` inspects the full record map under the same write lock that
    /// performs the insert. This is the count-and-insert-as-one-operation
    /// primitive: no other caller can observe the pre-insert population
    /// between the check and the write.
    pub fn insert_admitted<F>(&self, id: Uuid, record: T, admit: F) -> CoreResult<()>
    where
        F: FnOnce(&HashMap<Uuid, T>) -> CoreResult<()>,
    {
        let mut map = self.write_guard()?;
        if map.contains_key(&id) {
            return Err(CoreError::Conflict(format!(
                "{} {} already exists",
                self.entity, id
            )));
        }
        admit(&map)?;
        map.insert(id, record);
        Ok(())
    }

    /// Read a record by id (clone-out).
    pub fn get(&self, id: Uuid) -> CoreResult<T> {
        let map = self.read_guard()?;
        map.get(&id)
            .cloned()
            .ok_or(CoreError::not_found(self.entity, id))
    }

    /// Guarded read-modify-write.
    ///
    /// `apply` receives a draft clone of the current record. If it returns
    /// an error the record is left untouched; if it succeeds the draft
    /// replaces the record before the lock is released. The committed value
    /// is returned.
    pub fn update<F>(&self, id: Uuid, apply: F) -> CoreResult<T>
    where
        F: FnOnce(&mut T) -> CoreResult<()>,
    {
        let mut map = self.write_guard()?;
        let current = map
            .get(&id)
            .ok_or(CoreError::not_found(self.entity, id))?;
        let mut draft = current.clone();
        apply(&mut draft)?;
        map.insert(id, draft.clone());
        Ok(draft)
    }

    /// Guarded update-or-remove.
    ///
    /// `decide` inspects the current record and chooses to replace or remove
    /// it; either way the decision and the write are one atomic step. Used
    /// where the outcome of an operation depends on the state it finds
    /// (e.g. a deletion request that deletes immediately or parks the record
    /// for confirmation).
    pub fn resolve<F>(&self, id: Uuid, decide: F) -> CoreResult<Outcome<T>>
    where
        F: FnOnce(&T) -> CoreResult<Resolution<T>>,
    {
        let mut map = self.write_guard()?;
        let current = map
            .get(&id)
            .ok_or(CoreError::not_found(self.entity, id))?;
        match decide(current)? {
            Resolution::Replace(draft) => {
                map.insert(id, draft.clone());
                Ok(Outcome::Updated(draft))
            }
            Resolution::Remove => {
                // Presence was just checked under this lock.
                let removed = map
                    .remove(&id)
                    .ok_or_else(|| CoreError::Internal(format!("{} {} vanished", self.entity, id)))?;
                Ok(Outcome::Removed(removed))
            }
        }
    }

    /// Snapshot of all records matching a predicate.
    pub fn filter<F>(&self, pred: F) -> CoreResult<Vec<T>>
    where
        F: Fn(&T) -> bool,
    {
        let map = self.read_guard()?;
        Ok(map.values().filter(|r| pred(r)).cloned().collect())
    }

    /// Number of records currently stored.
    pub fn len(&self) -> CoreResult<usize> {
        Ok(self.read_guard()?.len())
    }

    /// Whether the collection holds no records.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.read_guard()?.is_empty())
    }
}
