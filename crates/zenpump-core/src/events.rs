use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SchedulerState, Task};

/// Every state change in the controller produces an Event.
/// Renderers consume [`Snapshot`]s; collaborators are driven by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SequenceStarted {
        tasks: usize,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    Paused {
        stage_remaining_secs: u64,
        total_remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Resumed {
        stage_remaining_secs: u64,
        total_remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Tick {
        index: usize,
        stage_remaining_secs: u64,
        total_remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A task boundary was crossed and `task` has begun.
    StageChanged {
        index: usize,
        task: Task,
        at: DateTime<Utc>,
    },
    Finished {
        at: DateTime<Utc>,
    },
    Reset {
        at: DateTime<Utc>,
    },
}

/// Placeholder for start/ETA labels when no run is active.
pub const UNSET_LABEL: &str = "--:--";

/// Everything a renderer needs after a poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: SchedulerState,
    pub current_index: usize,
    pub sequence_len: usize,
    /// Label of the current task, empty when idle.
    pub current_label: String,
    pub stage_remaining_secs: u64,
    pub total_remaining_secs: u64,
    pub total_secs: u64,
    pub finished: bool,
    /// 0.0 .. 100.0 progress across the whole sequence.
    pub progress_pct: f64,
    /// `"{index+1} / {len}"`, or `"0 / 0"` without a sequence.
    pub step_label: String,
    pub start_label: String,
    pub eta_label: String,
    pub at: DateTime<Utc>,
}

impl Snapshot {
    pub fn idle() -> Self {
        Self {
            state: SchedulerState::Idle,
            current_index: 0,
            sequence_len: 0,
            current_label: String::new(),
            stage_remaining_secs: 0,
            total_remaining_secs: 0,
            total_secs: 0,
            finished: false,
            progress_pct: 0.0,
            step_label: "0 / 0".into(),
            start_label: UNSET_LABEL.into(),
            eta_label: UNSET_LABEL.into(),
            at: Utc::now(),
        }
    }
}

/// Format seconds as `mm:ss`. Minutes are not wrapped at 60.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
