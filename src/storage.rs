// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::Fallible;
use crate::types::date::Date;
use crate::types::flipped::FlippedSet;

/// A durable key-value slot for flip state.
pub trait FlipStore {
    /// Read the payload stored under `key`, if any.
    fn read(&self, key: &str) -> Fallible<Option<String>>;

    /// Replace the payload stored under `key`.
    fn write(&self, key: &str, payload: &str) -> Fallible<()>;
}

/// A store that forgets everything when dropped.
#[derive(Default)]
pub struct MemoryStore {
    slots: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlipStore for MemoryStore {
    fn read(&self, key: &str) -> Fallible<Option<String>> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, payload: &str) -> Fallible<()> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

/// Serialize a flipped set as a JSON list of indices.
pub fn encode(flipped: &FlippedSet) -> String {
    let indices: Vec<usize> = flipped.iter().collect();
    // A list of integers always serializes.
    serde_json::to_string(&indices).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a payload written by [`encode`]. Anything unreadable is an empty set.
pub fn decode(payload: &str) -> FlippedSet {
    match serde_json::from_str::<Vec<usize>>(payload) {
        Ok(indices) => indices.into_iter().collect(),
        Err(e) => {
            log::warn!("Discarding malformed flip state {payload:?}: {e}");
            FlippedSet::new()
        }
    }
}

/// Load the flipped set under `key`. `None` if nothing is saved or the store
/// cannot be read; a corrupt payload is an empty set.
pub fn load(store: &impl FlipStore, key: &str) -> Option<FlippedSet> {
    match store.read(key) {
        Ok(Some(payload)) => Some(decode(&payload)),
        Ok(None) => {
            log::debug!("No saved flip state under {key}.");
            None
        }
        Err(e) => {
            log::warn!("Failed to read flip state under {key}: {e}");
            None
        }
    }
}

/// The slot holding the first date of the sequence that the indices under
/// `key` were saved against.
pub fn frame_key(key: &str) -> String {
    format!("{key}-start")
}

/// Read the saved frame start for `key`. Missing or unreadable is `None`.
pub fn load_frame(store: &impl FlipStore, key: &str) -> Option<Date> {
    let key = frame_key(key);
    match store.read(&key) {
        Ok(Some(value)) => match Date::parse(&value) {
            Ok(date) => Some(date),
            Err(e) => {
                log::warn!("Discarding malformed frame start {value:?}: {e}");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::warn!("Failed to read {key}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl FlipStore for BrokenStore {
        fn read(&self, _key: &str) -> Fallible<Option<String>> {
            crate::error::fail("storage unavailable")
        }

        fn write(&self, _key: &str, _payload: &str) -> Fallible<()> {
            crate::error::fail("storage unavailable")
        }
    }

    #[test]
    fn test_encode() {
        let set: FlippedSet = [5, 0].into_iter().collect();
        assert_eq!(encode(&set), "[0,5]");
        assert_eq!(encode(&FlippedSet::new()), "[]");
    }

    #[test]
    fn test_decode() {
        let set = decode("[0, 5]");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 5]);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(decode("").is_empty());
        assert!(decode("not json").is_empty());
        assert!(decode("{\"a\": 1}").is_empty());
        assert!(decode("[1, -2]").is_empty());
        assert!(decode("[1.5]").is_empty());
    }

    #[test]
    fn test_load_missing_slot() {
        let store = MemoryStore::new();
        assert!(load(&store, "flipped-x").is_none());
        assert!(load_frame(&store, "flipped-x").is_none());
    }

    #[test]
    fn test_load_unavailable_store() {
        assert!(load(&BrokenStore, "flipped-x").is_none());
        assert!(load_frame(&BrokenStore, "flipped-x").is_none());
    }

    #[test]
    fn test_load_corrupt_slot_is_empty() -> Fallible<()> {
        let store = MemoryStore::new();
        store.write("flipped-x", "oops")?;
        assert_eq!(load(&store, "flipped-x"), Some(FlippedSet::new()));
        Ok(())
    }

    #[test]
    fn test_load_frame() -> Fallible<()> {
        let store = MemoryStore::new();
        store.write(&frame_key("flipped-x"), "2026-01-10")?;
        store.write(&frame_key("flipped-y"), "soon")?;
        assert_eq!(
            load_frame(&store, "flipped-x"),
            Some(Date::parse("2026-01-10")?)
        );
        assert!(load_frame(&store, "flipped-y").is_none());
        Ok(())
    }

    #[test]
    fn test_memory_store_keys_are_separate() -> Fallible<()> {
        let store = MemoryStore::new();
        store.write("a", "[1]")?;
        store.write("b", "[2]")?;
        assert_eq!(store.read("a")?, Some("[1]".to_string()));
        assert_eq!(store.read("b")?, Some("[2]".to_string()));
        Ok(())
    }
}
