//! In-memory motorcycle store.
//!
//! The store holds an immutable [`Dataset`] behind an `Arc`. Readers clone the
//! `Arc` and work on that snapshot; [`MotorcycleStore::load`] builds and
//! validates a complete replacement before swapping the pointer, so a reader
//! never observes a partially loaded dataset.

use crate::error::{Error, Result};
use motostream_core::types::{Motorcycle, MotorcycleId};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

#[derive(Debug, Default)]
struct Dataset {
    by_id: HashMap<MotorcycleId, Motorcycle>,
    // Ascending id order, fixed at load time.
    ordered: Vec<Motorcycle>,
}

#[derive(Debug, Default)]
pub struct MotorcycleStore {
    current: RwLock<Arc<Dataset>>,
}

impl MotorcycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store already holding `records`.
    pub fn with_records(records: HashMap<MotorcycleId, Motorcycle>) -> Result<Self> {
        let store = Self::new();
        store.load(records)?;
        Ok(store)
    }

    /// Replaces the whole dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDataset`] if a key does not match the `id` of
    /// the record it maps to. The previous dataset stays visible in that case.
    pub fn load(&self, records: HashMap<MotorcycleId, Motorcycle>) -> Result<()> {
        if let Some((key, moto)) = records.iter().find(|(key, moto)| **key != moto.id) {
            return Err(Error::InvalidDataset {
                reason: format!("key {key} maps to motorcycle {}", moto.id),
            });
        }

        let mut ordered: Vec<Motorcycle> = records.values().cloned().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));
        let dataset = Arc::new(Dataset {
            by_id: records,
            ordered,
        });

        *self.current.write() = dataset;
        Ok(())
    }

    /// Looks up a single motorcycle. Unknown ids yield `None`.
    pub fn get(&self, id: &MotorcycleId) -> Option<Motorcycle> {
        self.snapshot().by_id.get(id).cloned()
    }

    /// Returns a copy of every motorcycle.
    ///
    /// The copy is detached from the store: a later [`load`](Self::load) does
    /// not affect it.
    pub fn list(&self) -> Vec<Motorcycle> {
        self.snapshot().ordered.clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&self.current.read())
    }
}
