//! Boundary to the host's content store.
//!
//! Durable storage belongs to the embedding application; the controller
//! only hands it the reconciled state after each full snapshot.

use crate::error::StoreError;
use crate::state::ContentState;
use std::collections::HashMap;

pub trait ContentStore: Send {
    fn load(&self, template_id: &str) -> Result<Option<ContentState>, StoreError>;

    fn save(&mut self, state: &ContentState) -> Result<(), StoreError>;
}

/// Keeps state in memory; counts saves so callers can observe them
#[derive(Debug, Default)]
pub struct MemoryStore {
    states: HashMap<String, ContentState>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with state already present for its template
    pub fn with_state(mut self, state: ContentState) -> Self {
        self.states.insert(state.template_id.clone(), state);
        self
    }

    pub fn saves(&self) -> usize {
        self.saves
    }

    pub fn get(&self, template_id: &str) -> Option<&ContentState> {
        self.states.get(template_id)
    }
}

impl ContentStore for MemoryStore {
    fn load(&self, template_id: &str) -> Result<Option<ContentState>, StoreError> {
        Ok(self.states.get(template_id).cloned())
    }

    fn save(&mut self, state: &ContentState) -> Result<(), StoreError> {
        self.states.insert(state.template_id.clone(), state.clone());
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_replaces_by_template() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load("bakery").unwrap(), None);

        let mut state = ContentState::new("bakery");
        store.save(&state).unwrap();
        state.revision = 2;
        store.save(&state).unwrap();

        assert_eq!(store.load("bakery").unwrap().map(|s| s.revision), Some(2));
        assert_eq!(store.saves(), 2);
    }
}
