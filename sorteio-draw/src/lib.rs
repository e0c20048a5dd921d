//! Timed name draw for Sorteio
//!
//! A draw shuffles the displayed name while the drumroll cue plays, then
//! commits one uniformly random pick from the pool as it was when the draw
//! started and moves it to the history.

pub mod config;
pub mod desk;
pub mod engine;
pub mod error;
pub mod session;

pub use config::DrawConfig;
pub use desk::DrawDesk;
pub use engine::{DrawEngine, DrawStart, DrawTicket};
pub use error::{DrawError, Result};
pub use session::{CandidateSet, DrawResult, DrawSession, DrawState};
