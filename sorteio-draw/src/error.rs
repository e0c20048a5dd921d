use thiserror::Error;

pub type Result<T> = std::result::Result<T, DrawError>;

#[derive(Error, Debug)]
pub enum DrawError {
    #[error("Sorteio core error: {0}")]
    Core(#[from] sorteio_core::SorteioError),

    #[error("A draw is already in progress")]
    DrawInProgress,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Draw aborted: {0}")]
    Aborted(String),
}

impl DrawError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Errors the presentation layer shows as a transient message.
    pub fn is_user_input(&self) -> bool {
        match self {
            DrawError::Core(e) => e.is_user_input(),
            DrawError::DrawInProgress => true,
            _ => false,
        }
    }
}
