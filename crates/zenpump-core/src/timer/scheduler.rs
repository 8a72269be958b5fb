//! Drift-corrected scheduler.
//!
//! Remaining time is always derived from an absolute deadline and the time
//! passed to [`Scheduler::poll`], never by decrementing a counter per call.
//! A caller that polls late (suspended process, throttled timer) therefore
//! sees the true remaining time instead of a value that drifted behind.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!         Finished          (any state) -> Idle via reset()
//! ```
//!
//! At most one task boundary is crossed per `poll`. Late polling never skips
//! a `StageChanged` event; the next poll catches up.

use serde::{Deserialize, Serialize};

use super::task::{Sequence, Task};
use crate::error::SequenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Outcome of a single poll while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Current task still has time left.
    Tick {
        stage_remaining_secs: u64,
        total_remaining_secs: u64,
    },
    /// The previous task expired and `task` (at `index`) has begun.
    StageChanged {
        index: usize,
        task: Task,
        total_remaining_secs: u64,
    },
    /// The last task expired. Emitted exactly once per run.
    Finished,
}

/// State of the active run. Exists only between `start` and `reset`.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    sequence: Sequence,
    current_index: usize,
    /// Absolute deadline (epoch ms) of the current task. `None` unless running.
    stage_deadline_ms: Option<u64>,
    /// Absolute deadline (epoch ms) of the whole sequence. `None` unless running.
    total_deadline_ms: Option<u64>,
    /// Last observed remaining time. Authoritative while paused.
    stage_remaining_ms: u64,
    total_remaining_ms: u64,
    running: bool,
    finished: bool,
}

impl RunState {
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.sequence.get(self.current_index)
    }

    pub fn stage_deadline_ms(&self) -> Option<u64> {
        self.stage_deadline_ms
    }

    pub fn total_deadline_ms(&self) -> Option<u64> {
        self.total_deadline_ms
    }

    pub fn stage_remaining_secs(&self) -> u64 {
        ceil_secs(self.stage_remaining_ms)
    }

    pub fn total_remaining_secs(&self) -> u64 {
        ceil_secs(self.total_remaining_ms)
    }

    pub fn total_secs(&self) -> u64 {
        self.sequence.total_secs()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Owns the position in a sequence and advances it against wall-clock deadlines.
///
/// All time inputs are epoch milliseconds supplied by the caller, which keeps
/// the scheduler free of any clock of its own.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    run: Option<RunState>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { run: None }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SchedulerState {
        match &self.run {
            None => SchedulerState::Idle,
            Some(run) if run.finished => SchedulerState::Finished,
            Some(run) if run.running => SchedulerState::Running,
            Some(_) => SchedulerState::Paused,
        }
    }

    pub fn run_state(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin running `sequence` at `now_ms`.
    ///
    /// Valid from Idle or Finished. Fails with `EmptySequence` when the
    /// sequence has no tasks.
    pub fn start(&mut self, sequence: Sequence, now_ms: u64) -> Result<(), SequenceError> {
        let state = self.state();
        if matches!(state, SchedulerState::Running | SchedulerState::Paused) {
            return Err(SequenceError::InvalidStateTransition {
                from: state,
                action: "start",
            });
        }
        let first = sequence.get(0).ok_or(SequenceError::EmptySequence)?;

        let stage_ms = first.duration_ms();
        let total_ms = sequence.total_secs().saturating_mul(1000);
        tracing::info!(
            tasks = sequence.len(),
            total_secs = sequence.total_secs(),
            "sequence started"
        );
        self.run = Some(RunState {
            sequence,
            current_index: 0,
            stage_deadline_ms: Some(now_ms.saturating_add(stage_ms)),
            total_deadline_ms: Some(now_ms.saturating_add(total_ms)),
            stage_remaining_ms: stage_ms,
            total_remaining_ms: total_ms,
            running: true,
            finished: false,
        });
        Ok(())
    }

    /// Freeze remaining time and clear both deadlines.
    pub fn pause(&mut self, now_ms: u64) -> Result<(), SequenceError> {
        let state = self.state();
        let run = match self.run.as_mut() {
            Some(run) if state == SchedulerState::Running => run,
            _ => {
                return Err(SequenceError::InvalidStateTransition {
                    from: state,
                    action: "pause",
                })
            }
        };
        run.stage_remaining_ms = remaining_ms(run.stage_deadline_ms, now_ms);
        run.total_remaining_ms = remaining_ms(run.total_deadline_ms, now_ms);
        run.stage_deadline_ms = None;
        run.total_deadline_ms = None;
        run.running = false;
        tracing::debug!(
            index = run.current_index,
            stage_remaining_ms = run.stage_remaining_ms,
            "sequence paused"
        );
        Ok(())
    }

    /// Recompute deadlines from the frozen remaining time.
    pub fn resume(&mut self, now_ms: u64) -> Result<(), SequenceError> {
        let state = self.state();
        let run = match self.run.as_mut() {
            Some(run) if state == SchedulerState::Paused => run,
            _ => {
                return Err(SequenceError::InvalidStateTransition {
                    from: state,
                    action: "resume",
                })
            }
        };
        run.stage_deadline_ms = Some(now_ms.saturating_add(run.stage_remaining_ms));
        run.total_deadline_ms = Some(now_ms.saturating_add(run.total_remaining_ms));
        run.running = true;
        tracing::debug!(index = run.current_index, "sequence resumed");
        Ok(())
    }

    /// Discard the run and return to Idle. Idempotent.
    pub fn reset(&mut self) {
        if self.run.take().is_some() {
            tracing::info!("sequence reset");
        }
    }

    /// Advance against the wall clock. No-op (returns `None`) unless Running.
    pub fn poll(&mut self, now_ms: u64) -> Option<SchedulerEvent> {
        let run = self.run.as_mut().filter(|r| r.running)?;

        run.stage_remaining_ms = remaining_ms(run.stage_deadline_ms, now_ms);
        run.total_remaining_ms = remaining_ms(run.total_deadline_ms, now_ms);

        let stage_remaining_secs = ceil_secs(run.stage_remaining_ms);
        if stage_remaining_secs > 0 {
            return Some(SchedulerEvent::Tick {
                stage_remaining_secs,
                total_remaining_secs: ceil_secs(run.total_remaining_ms),
            });
        }

        let next_index = run.current_index + 1;
        match run.sequence.get(next_index).cloned() {
            Some(next) => {
                // The next task's clock starts at the poll that expired the
                // previous one.
                run.current_index = next_index;
                run.stage_remaining_ms = next.duration_ms();
                run.stage_deadline_ms = Some(now_ms.saturating_add(run.stage_remaining_ms));
                tracing::debug!(index = next_index, label = next.label(), "stage changed");
                Some(SchedulerEvent::StageChanged {
                    index: next_index,
                    task: next,
                    total_remaining_secs: ceil_secs(run.total_remaining_ms),
                })
            }
            None => {
                run.stage_remaining_ms = 0;
                run.total_remaining_ms = 0;
                run.stage_deadline_ms = None;
                run.total_deadline_ms = None;
                run.running = false;
                run.finished = true;
                tracing::info!(tasks = run.sequence.len(), "sequence finished");
                Some(SchedulerEvent::Finished)
            }
        }
    }
}

fn remaining_ms(deadline_ms: Option<u64>, now_ms: u64) -> u64 {
    deadline_ms.map_or(0, |d| d.saturating_sub(now_ms))
}

fn ceil_secs(ms: u64) -> u64 {
    ms.div_ceil(1000)
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::task::SoundId;

    const T0: u64 = 1_700_000_000_000;

    fn timer(label: &str, secs: u64) -> Task {
        Task::Timer { label: label.into(), duration_secs: secs }
    }

    fn alarm(label: &str, secs: u64) -> Task {
        Task::Alarm { label: label.into(), duration_secs: secs, sound: SoundId::Bell }
    }

    #[test]
    fn start_empty_fails_and_stays_idle() {
        let mut s = Scheduler::new();
        assert_eq!(s.start(Sequence::default(), T0), Err(SequenceError::EmptySequence));
        assert_eq!(s.state(), SchedulerState::Idle);
    }

    #[test]
    fn start_sets_deadlines() {
        let mut s = Scheduler::new();
        s.start(Sequence::new(vec![timer("A", 5), alarm("A complete", 2)]), T0).unwrap();
        let run = s.run_state().unwrap();
        assert_eq!(run.stage_deadline_ms(), Some(T0 + 5_000));
        assert_eq!(run.total_deadline_ms(), Some(T0 + 7_000));
        assert_eq!(run.total_remaining_secs(), 7);
        assert_eq!(s.state(), SchedulerState::Running);
    }

    #[test]
    fn tick_rounds_up_partial_seconds() {
        let mut s = Scheduler::new();
        s.start(Sequence::new(vec![timer("A", 5)]), T0).unwrap();
        assert_eq!(
            s.poll(T0 + 1_200),
            Some(SchedulerEvent::Tick { stage_remaining_secs: 4, total_remaining_secs: 4 })
        );
    }

    #[test]
    fn late_poll_crosses_one_boundary() {
        let mut s = Scheduler::new();
        s.start(Sequence::new(vec![timer("A", 5), alarm("A complete", 1), timer("B", 3)]), T0)
            .unwrap();

        let event = s.poll(T0 + 7_000).unwrap();
        assert_eq!(
            event,
            SchedulerEvent::StageChanged { index: 1, task: alarm("A complete", 1), total_remaining_secs: 2 }
        );
        // The alarm restarts its own clock at the late poll.
        assert_eq!(s.run_state().unwrap().stage_deadline_ms(), Some(T0 + 8_000));
    }

    #[test]
    fn late_poll_on_last_task_finishes_once() {
        let mut s = Scheduler::new();
        s.start(Sequence::new(vec![timer("A", 5)]), T0).unwrap();
        assert_eq!(s.poll(T0 + 7_000), Some(SchedulerEvent::Finished));
        let run = s.run_state().unwrap();
        assert_eq!(run.stage_remaining_secs(), 0);
        assert_eq!(run.total_remaining_secs(), 0);
        assert_eq!(run.stage_deadline_ms(), None);
        assert_eq!(s.state(), SchedulerState::Finished);
        assert_eq!(s.poll(T0 + 8_000), None);
    }

    #[test]
    fn zero_length_tasks_each_get_an_event() {
        let mut s = Scheduler::new();
        s.start(Sequence::new(vec![timer("A", 0), timer("B", 0), timer("C", 0)]), T0).unwrap();
        let events: Vec<_> = (0..4).filter_map(|_| s.poll(T0)).collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], SchedulerEvent::StageChanged { index: 1, .. }));
        assert!(matches!(events[1], SchedulerEvent::StageChanged { index: 2, .. }));
        assert_eq!(events[2], SchedulerEvent::Finished);
    }

    #[test]
    fn pause_freezes_and_resume_rebases() {
        let mut s = Scheduler::new();
        s.start(Sequence::new(vec![timer("A", 10)]), T0).unwrap();
        s.pause(T0 + 3_500).unwrap();
        let run = s.run_state().unwrap();
        assert_eq!(run.stage_deadline_ms(), None);
        assert_eq!(run.total_deadline_ms(), None);
        assert_eq!(run.stage_remaining_secs(), 7);

        // Time spent paused does not count.
        assert_eq!(s.poll(T0 + 60_000), None);
        s.resume(T0 + 60_000).unwrap();
        assert_eq!(s.run_state().unwrap().stage_deadline_ms(), Some(T0 + 66_500));
        assert_eq!(
            s.poll(T0 + 61_000),
            Some(SchedulerEvent::Tick { stage_remaining_secs: 6, total_remaining_secs: 6 })
        );
    }

    #[test]
    fn invalid_transitions_leave_state_unchanged() {
        let mut s = Scheduler::new();
        assert_eq!(
            s.pause(T0),
            Err(SequenceError::InvalidStateTransition { from: SchedulerState::Idle, action: "pause" })
        );
        s.start(Sequence::new(vec![timer("A", 1)]), T0).unwrap();
        assert!(s.resume(T0).is_err());
        assert!(s.start(Sequence::new(vec![timer("B", 1)]), T0).is_err());
        assert_eq!(s.run_state().unwrap().current_task(), Some(&timer("A", 1)));
        assert_eq!(s.state(), SchedulerState::Running);

        s.poll(T0 + 1_000);
        assert_eq!(s.state(), SchedulerState::Finished);
        assert!(s.pause(T0 + 1_000).is_err());
        assert!(s.resume(T0 + 1_000).is_err());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut s = Scheduler::new();
        s.reset();
        assert!(s.run_state().is_none());
        s.start(Sequence::new(vec![timer("A", 1)]), T0).unwrap();
        s.reset();
        s.reset();
        assert_eq!(s.state(), SchedulerState::Idle);
        assert!(s.run_state().is_none());
    }
}
