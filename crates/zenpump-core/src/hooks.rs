//! Collaborators the controller drives at stage boundaries.
//!
//! All calls are advisory: the controller does not consume return values
//! beyond logging a failed save.

use crate::error::Result;
use crate::timer::RoutineConfig;

/// Title shown when the whole sequence completes.
pub const FINISHED_TITLE: &str = "All done";

/// Stage-change banner (modal, desktop notification, stderr line, ...).
pub trait StageNotifier: Send + Sync {
    fn show(&self, title: &str);
    fn hide(&self);
}

/// Persists the routine a run was started with.
pub trait RoutineStore: Send + Sync {
    fn save_routine(&self, routine: &RoutineConfig) -> Result<()>;
}

/// Notifier that ignores every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl StageNotifier for NoopNotifier {
    fn show(&self, _title: &str) {}
    fn hide(&self) {}
}
