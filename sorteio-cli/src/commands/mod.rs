pub mod cues;
pub mod draw;
pub mod names;

pub use cues::{handle_cues, handle_play};
pub use draw::handle_draw;
pub use names::{handle_add, handle_list, handle_remove, handle_reset, handle_status};
