//! Address monitoring module
//!
//! The engine does the per-cycle work; the registry owns the single
//! live instance; observers fan events out to subscribers.

pub mod engine;
pub mod events;
pub mod registry;

pub use engine::{DetectedTransaction, MonitorEngine, MonitorStatus};
pub use events::Observers;
pub use registry::MonitorRegistry;
