//! Sorteio core - participant registry, persistence and sound cues
//!
//! This library keeps the pool of names still to be drawn and the history of
//! names already drawn, persists both through a pluggable key-value store,
//! and defines the sound cue catalogue used around a draw.

pub mod cue;
pub mod error;
pub mod registry;
pub mod storage;
pub mod types;

#[cfg(feature = "audio")]
pub use cue::AudioCueDispatcher;
pub use cue::{Cue, CueDispatcher, CuePlayback, MutedCueDispatcher, TimedCueDispatcher};
pub use error::{Result, SorteioError};
pub use registry::NameRegistry;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use types::{NamesSnapshot, Participant};
