use std::sync::{Mutex, MutexGuard};

use crate::runtime::error::ServiceError;
use crate::runtime::model::{DataState, HasKey};

/// Conversion between a domain entity `D` and its storage record `S`.
pub trait Projection<S, D> {
    fn to_storage(&self, domain: &D) -> S;
    fn to_domain(&self, storage: &S) -> D;
}

/// Unit of work over one kind of storage record. Changes are staged with
/// `apply_changes` and become visible on `save`.
#[allow(async_fn_in_trait)]
pub trait DatabaseRepository {
    type Record: HasKey + Clone;

    fn apply_changes(&self, record: Self::Record, state: DataState) -> Result<(), ServiceError>;

    /// Commits staged changes and returns how many were applied.
    async fn save(&self) -> Result<usize, ServiceError>;

    async fn get_all(&self) -> Result<Vec<Self::Record>, ServiceError>;

    async fn get_by_condition<F>(&self, predicate: F) -> Result<Vec<Self::Record>, ServiceError>
    where
        F: Fn(&Self::Record) -> bool;
}

#[derive(Debug)]
struct Tables<S> {
    rows: Vec<S>,
    pending: Vec<(S, DataState)>,
}

/// Process-local repository, used where no database is attached.
#[derive(Debug)]
pub struct InMemoryRepository<S> {
    tables: Mutex<Tables<S>>,
}

impl<S> Default for InMemoryRepository<S> {
    fn default() -> Self {
        InMemoryRepository {
            tables: Mutex::new(Tables {
                rows: Vec::new(),
                pending: Vec::new(),
            }),
        }
    }
}

impl<S> InMemoryRepository<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<S>) -> Self {
        InMemoryRepository {
            tables: Mutex::new(Tables {
                rows,
                pending: Vec::new(),
            }),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables<S>> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: HasKey + Clone> DatabaseRepository for InMemoryRepository<S> {
    type Record = S;

    fn apply_changes(&self, record: S, state: DataState) -> Result<(), ServiceError> {
        self.tables().pending.push((record, state));
        Ok(())
    }

    async fn save(&self) -> Result<usize, ServiceError> {
        let mut tables = self.tables();
        let pending = std::mem::take(&mut tables.pending);
        let mut applied = 0;
        for (record, state) in pending {
            let key = record.key();
            let existing = tables.rows.iter().position(|r| r.key() == key);
            match (state, existing) {
                (DataState::Unchanged, _) => continue,
                (DataState::Deleted, Some(i)) => {
                    tables.rows.remove(i);
                }
                (DataState::Deleted, None) => continue,
                (DataState::Inserted | DataState::Updated, Some(i)) => tables.rows[i] = record,
                (DataState::Inserted | DataState::Updated, None) => tables.rows.push(record),
            }
            applied += 1;
        }
        Ok(applied)
    }

    async fn get_all(&self) -> Result<Vec<S>, ServiceError> {
        Ok(self.tables().rows.clone())
    }

    async fn get_by_condition<F>(&self, predicate: F) -> Result<Vec<S>, ServiceError>
    where
        F: Fn(&S) -> bool,
    {
        Ok(self.tables().rows.iter().filter(|r| predicate(r)).cloned().collect())
    }
}
