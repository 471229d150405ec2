pub mod state;
pub mod tracker;

pub use state::{JobSnapshot, TrackerPhase};
pub use tracker::{JobTracker, DEFAULT_POLL_INTERVAL};
