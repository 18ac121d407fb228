//! Activity list with write-through persistence
//!
//! Holds at most [`MAX_ACTIVITIES`] entries. Every mutation serializes the whole
//! list under [`STORAGE_KEY`]; the in-memory list only changes once that write
//! has succeeded.

use crate::db::{Activity, KeyValueStore};
use crate::error::{Error, Result};

pub const MAX_ACTIVITIES: usize = 3;
pub const STORAGE_KEY: &str = "activities";

pub struct ActivityStore<S: KeyValueStore> {
    storage: S,
    activities: Vec<Activity>,
}

impl<S: KeyValueStore> ActivityStore<S> {
    /// Restore the list from storage. Absent or malformed data gives an empty list.
    pub fn open(storage: S) -> Self {
        let activities = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => decode(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Could not read stored activities: {}", e);
                Vec::new()
            }
        };
        Self { storage, activities }
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.activities.len() >= MAX_ACTIVITIES
    }

    /// Append a suggestion as a new activity with an empty reflection
    pub fn save(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Err(Error::NothingToSave);
        }
        if self.is_full() {
            return Err(Error::ActivityLimit { max: MAX_ACTIVITIES });
        }
        let mut next = self.activities.clone();
        next.push(Activity::new(text));
        self.commit(next)
    }

    pub fn update_reflection(&mut self, index: usize, value: &str) -> Result<()> {
        self.check_index(index)?;
        let mut next = self.activities.clone();
        next[index].reflection = value.to_string();
        self.commit(next)
    }

    /// Remove an entry; later entries shift down one position
    pub fn delete(&mut self, index: usize) -> Result<Activity> {
        self.check_index(index)?;
        let mut next = self.activities.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        Ok(removed)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.activities.len() {
            return Err(Error::ActivityIndex {
                index,
                len: self.activities.len(),
            });
        }
        Ok(())
    }

    fn commit(&mut self, next: Vec<Activity>) -> Result<()> {
        let raw = serde_json::to_string(&next)?;
        self.storage.set(STORAGE_KEY, &raw)?;
        log::debug!("Persisted {} activities", next.len());
        self.activities = next;
        Ok(())
    }
}

fn decode(raw: &str) -> Vec<Activity> {
    match serde_json::from_str::<Vec<Activity>>(raw) {
        Ok(mut list) => {
            if list.len() > MAX_ACTIVITIES {
                log::warn!(
                    "Stored activity list has {} entries, keeping the first {}",
                    list.len(),
                    MAX_ACTIVITIES
                );
                list.truncate(MAX_ACTIVITIES);
            }
            list
        }
        Err(e) => {
            log::warn!("Ignoring malformed stored activities: {}", e);
            Vec::new()
        }
    }
}
