use std::collections::HashMap;

use crate::models::AssetRecord;

/// Normalized asset records keyed by id.
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    records: HashMap<String, AssetRecord>,
}

impl EntityStore {
    pub fn get(&self, id: &str) -> Option<&AssetRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Last write wins.
    pub(crate) fn upsert(&mut self, record: AssetRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub(crate) fn upsert_many(&mut self, records: impl IntoIterator<Item = AssetRecord>) {
        for record in records {
            self.upsert(record);
        }
    }

    pub(crate) fn update<F>(&mut self, id: &str, apply: F) -> bool
    where
        F: FnOnce(&mut AssetRecord),
    {
        match self.records.get_mut(id) {
            Some(record) => {
                apply(record);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<AssetRecord> {
        self.records.remove(id)
    }
}
