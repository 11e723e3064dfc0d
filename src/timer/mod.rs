pub mod state;
pub mod ticker;

pub use state::{TimerSnapshot, TimerState, TimerStatus};
pub use ticker::DisplayTicker;
