use crate::error::Result;
use crate::storage::KeyValueStore;
use crate::types::{NamesSnapshot, Participant};
use std::collections::HashSet;

pub const AVAILABLE_KEY: &str = "available-names";
pub const DRAWN_KEY: &str = "drawn-names";

/// Reads and writes the pool/history pair as two JSON-encoded string arrays.
pub struct NamesStore<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> NamesStore<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Load both lists. Absent keys are empty lists. Stored data that breaks
    /// the registry invariants is repaired: blank entries are dropped, and a
    /// name appearing more than once (ignoring case) keeps only its first
    /// occurrence, with the drawn list taking precedence over the pool.
    pub async fn load(&self) -> Result<NamesSnapshot> {
        let available = self.load_list(AVAILABLE_KEY).await?;
        let drawn = self.load_list(DRAWN_KEY).await?;

        let raw_len = available.len() + drawn.len();
        let mut seen = HashSet::new();
        let drawn = dedupe(drawn, &mut seen);
        let available = dedupe(available, &mut seen);

        let snapshot = NamesSnapshot { available, drawn };
        if snapshot.total() != raw_len {
            tracing::warn!(
                "Dropped {} blank or duplicate stored names",
                raw_len - snapshot.total()
            );
        }

        Ok(snapshot)
    }

    /// Both keys are always written together, even if only one list changed.
    pub async fn save(&self, available: &[Participant], drawn: &[Participant]) -> Result<()> {
        let available = serde_json::to_string(available)?;
        let drawn = serde_json::to_string(drawn)?;

        self.store
            .set_many(&[(AVAILABLE_KEY, available), (DRAWN_KEY, drawn)])
            .await
    }

    async fn load_list(&self, key: &str) -> Result<Vec<String>> {
        match self.store.get(key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }
}

fn dedupe(raw: Vec<String>, seen: &mut HashSet<String>) -> Vec<Participant> {
    raw.iter()
        .filter_map(|name| Participant::parse(name).ok())
        .filter(|p| seen.insert(p.fold_key()))
        .collect()
}
