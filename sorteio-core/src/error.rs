use thiserror::Error;

pub type Result<T> = std::result::Result<T, SorteioError>;

#[derive(Error, Debug)]
pub enum SorteioError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name already in the pool: {name}")]
    DuplicateName { name: String },

    #[error("No name at position {index} (pool has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Cue '{cue}' failed to play: {reason}")]
    CuePlaybackFailed { cue: String, reason: String },

    #[error("Cue playback was interrupted")]
    CueInterrupted,

    #[error("Unknown cue: {0}")]
    UnknownCue(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio output unavailable: {0}")]
    AudioUnavailable(String),
}

impl SorteioError {
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::PersistenceUnavailable(msg.into())
    }

    pub fn cue_failed(cue: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CuePlaybackFailed {
            cue: cue.into(),
            reason: reason.into(),
        }
    }

    /// Validation errors caused by user input; shown as transient messages.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::EmptyName | Self::DuplicateName { .. } | Self::IndexOutOfRange { .. }
        )
    }
}
