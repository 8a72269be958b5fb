mod builder;
mod clock;
mod controller;
mod driver;
mod routine;
mod scheduler;
mod task;

pub use builder::build_sequence;
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::SequenceController;
pub use driver::{SequenceDriver, DEFAULT_POLL_INTERVAL};
pub use routine::{RoutineConfig, StageConfig};
pub use scheduler::{now_ms, RunState, Scheduler, SchedulerEvent, SchedulerState};
pub use task::{Sequence, SoundId, Task};
