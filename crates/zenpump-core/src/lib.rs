//! # Zenpump Core Library
//!
//! Core logic for a staged countdown sequencer: a user runs a repeating
//! three-stage routine (A, B, C for N rounds), each stage optionally followed
//! by a short alarm. The CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Sequence Builder**: expands a [`RoutineConfig`] into a flat [`Sequence`]
//! - **Scheduler**: a wall-clock-deadline state machine; the caller invokes
//!   `poll()` periodically and late polls never accumulate drift
//! - **Controller**: start/pause/resume/reset on top of the scheduler, driving
//!   alert and notification collaborators at stage boundaries
//! - **Driver**: the single tokio polling loop behind the controller
//! - **Storage**: TOML configuration and the SQLite production log
//!
//! ## Key Components
//!
//! - [`Scheduler`]: drift-corrected state machine
//! - [`SequenceController`]: orchestration facade
//! - [`AudioService`]: lazily acquired alert backend
//! - [`Config`]: application configuration management
//! - [`Database`]: production log persistence

pub mod alerts;
pub mod error;
pub mod events;
pub mod hooks;
pub mod storage;
pub mod timer;

pub use alerts::{AlertPlan, AlertPlayer, AudioService};
pub use error::{ConfigError, CoreError, DatabaseError, SequenceError, ValidationError};
pub use events::{Event, Snapshot};
pub use hooks::{RoutineStore, StageNotifier};
pub use storage::{Config, Database, ProductionRecord};
pub use timer::{
    build_sequence, RoutineConfig, Scheduler, SchedulerState, Sequence, SequenceController,
    SequenceDriver, SoundId, StageConfig, Task,
};
