use crate::error::{Result, SorteioError};
use crate::storage::{KeyValueStore, NamesStore};
use crate::types::{NamesSnapshot, Participant};
use std::sync::Arc;

/// Owns the pool of names still to be drawn and the history of names
/// already drawn.
///
/// Invariants kept after every call:
/// - no name appears twice across pool and history (ignoring case);
/// - every mutation is written through to the store before the call returns.
///
/// Store failures never surface as errors here. If the initial load fails the
/// registry runs in memory for the rest of the session and stops writing, so
/// whatever is stored is left untouched.
pub struct NameRegistry {
    store: Arc<dyn KeyValueStore>,
    available: Vec<Participant>,
    drawn: Vec<Participant>,
    writable: bool,
}

impl NameRegistry {
    /// Hydrate from `store`. Missing keys mean a first run.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let loaded = NamesStore::new(store.as_ref()).load().await;

        let (snapshot, writable) = match loaded {
            Ok(snapshot) => (snapshot, true),
            Err(e) => {
                tracing::warn!("Could not load saved names, running in memory: {}", e);
                (NamesSnapshot::default(), false)
            }
        };

        tracing::info!(
            "Loaded {} available and {} drawn names",
            snapshot.available.len(),
            snapshot.drawn.len()
        );

        Self {
            store,
            available: snapshot.available,
            drawn: snapshot.drawn,
            writable,
        }
    }

    pub fn available(&self) -> &[Participant] {
        &self.available
    }

    pub fn drawn(&self) -> &[Participant] {
        &self.drawn
    }

    pub fn snapshot(&self) -> NamesSnapshot {
        NamesSnapshot {
            available: self.available.clone(),
            drawn: self.drawn.clone(),
        }
    }

    /// False once the registry has fallen back to in-memory operation.
    pub fn is_persistent(&self) -> bool {
        self.writable
    }

    /// Append a new name to the pool.
    ///
    /// A name still in the history is a duplicate too: it only returns to the
    /// pool through [`reset_all`](Self::reset_all).
    pub async fn add(&mut self, raw: &str) -> Result<Participant> {
        let participant = Participant::parse(raw)?;

        if self
            .available
            .iter()
            .chain(self.drawn.iter())
            .any(|p| p.matches(&participant))
        {
            return Err(SorteioError::DuplicateName {
                name: participant.to_string(),
            });
        }

        self.available.push(participant.clone());
        self.persist().await;

        tracing::info!("Added '{}' ({} available)", participant, self.available.len());
        Ok(participant)
    }

    pub async fn remove(&mut self, index: usize) -> Result<Participant> {
        if index >= self.available.len() {
            return Err(SorteioError::IndexOutOfRange {
                index,
                len: self.available.len(),
            });
        }

        let removed = self.available.remove(index);
        self.persist().await;

        tracing::info!("Removed '{}' from the pool", removed);
        Ok(removed)
    }

    /// Put every drawn name back at the end of the pool, in draw order.
    pub async fn reset_all(&mut self) {
        let returned = self.drawn.len();
        self.available.append(&mut self.drawn);
        self.persist().await;

        tracing::info!(
            "Reset: {} names returned, {} available",
            returned,
            self.available.len()
        );
    }

    /// Move the first pool entry matching `pick` to the end of the history.
    ///
    /// Returns false, leaving both lists unchanged, when no such entry is in
    /// the pool anymore.
    pub async fn commit_pick(&mut self, pick: &Participant) -> bool {
        let Some(pos) = self.available.iter().position(|p| p.matches(pick)) else {
            return false;
        };

        let moved = self.available.remove(pos);
        self.drawn.push(moved);
        self.persist().await;
        true
    }

    async fn persist(&self) {
        if !self.writable {
            return;
        }

        if let Err(e) = NamesStore::new(self.store.as_ref())
            .save(&self.available, &self.drawn)
            .await
        {
            tracing::warn!("Failed to save names, keeping changes in memory: {}", e);
        }
    }
}

impl std::fmt::Debug for NameRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameRegistry")
            .field("available", &self.available)
            .field("drawn", &self.drawn)
            .field("writable", &self.writable)
            .finish()
    }
}
