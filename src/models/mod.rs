pub mod app_state;
pub mod project;
pub mod session;

pub use app_state::AppState;
pub use project::{Project, ProjectSummary};
pub use session::WorkSession;
