pub mod engine;
pub mod events;
mod projects;

pub use engine::TimeTracker;
pub use events::TrackerEvent;
