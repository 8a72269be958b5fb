//! Sequence controller.
//!
//! Orchestrates the [`Scheduler`] in response to user intent (toggle, reset)
//! and forwards boundary events to the alert player and stage notifier.
//! The controller has no timer of its own: something must call
//! [`SequenceController::poll`] periodically while it is running, see
//! [`crate::timer::SequenceDriver`].

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use super::builder::build_sequence;
use super::clock::{Clock, SystemClock};
use super::routine::RoutineConfig;
use super::scheduler::{Scheduler, SchedulerEvent, SchedulerState};
use super::task::Task;
use crate::alerts::AlertPlayer;
use crate::error::SequenceError;
use crate::events::{Event, Snapshot, UNSET_LABEL};
use crate::hooks::{RoutineStore, StageNotifier, FINISHED_TITLE};

pub struct SequenceController {
    /// Source configuration; edits apply to the next run only.
    config: RoutineConfig,
    /// Copy of the configuration the active run was built from.
    active: Option<RoutineConfig>,
    scheduler: Scheduler,
    clock: Arc<dyn Clock>,
    player: Arc<dyn AlertPlayer>,
    notifier: Arc<dyn StageNotifier>,
    store: Option<Arc<dyn RoutineStore>>,
    started_at_ms: Option<u64>,
    eta_ms: Option<u64>,
}

impl SequenceController {
    pub fn new(
        config: RoutineConfig,
        player: Arc<dyn AlertPlayer>,
        notifier: Arc<dyn StageNotifier>,
    ) -> Self {
        Self {
            config,
            active: None,
            scheduler: Scheduler::new(),
            clock: Arc::new(SystemClock),
            player,
            notifier,
            store: None,
            started_at_ms: None,
            eta_ms: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn RoutineStore>) -> Self {
        self.store = Some(store);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &RoutineConfig {
        &self.config
    }

    /// Replace the source configuration. A running sequence is unaffected.
    pub fn set_config(&mut self, config: RoutineConfig) {
        self.config = config;
    }

    pub fn snapshot(&self) -> Snapshot {
        let Some(run) = self.scheduler.run_state() else {
            return Snapshot::idle();
        };
        let total_secs = run.total_secs();
        let total_remaining_secs = run.total_remaining_secs();
        let progress_pct = if total_secs == 0 {
            0.0
        } else {
            let done = total_secs.saturating_sub(total_remaining_secs) as f64;
            (done / total_secs as f64 * 100.0).clamp(0.0, 100.0)
        };
        let len = run.sequence().len();
        Snapshot {
            state: self.scheduler.state(),
            current_index: run.current_index(),
            sequence_len: len,
            current_label: run.current_task().map(|t| t.label().to_string()).unwrap_or_default(),
            stage_remaining_secs: run.stage_remaining_secs(),
            total_remaining_secs,
            total_secs,
            finished: run.is_finished(),
            progress_pct,
            step_label: format!("{} / {}", (run.current_index() + 1).min(len), len),
            start_label: clock_label(self.started_at_ms),
            eta_label: clock_label(self.eta_ms),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Main button: pause when running, resume when paused, otherwise build
    /// a fresh sequence from the current configuration and start it.
    ///
    /// Returns `None` when nothing changed (the configuration yields no tasks).
    pub fn toggle(&mut self) -> Option<Event> {
        match self.scheduler.state() {
            SchedulerState::Running => self.pause().ok(),
            SchedulerState::Paused => self.resume().ok(),
            SchedulerState::Idle | SchedulerState::Finished => self.begin(),
        }
    }

    pub fn pause(&mut self) -> Result<Event, SequenceError> {
        self.scheduler.pause(self.clock.now_ms())?;
        Ok(self.remaining_event(true))
    }

    pub fn resume(&mut self) -> Result<Event, SequenceError> {
        self.scheduler.resume(self.clock.now_ms())?;
        Ok(self.remaining_event(false))
    }

    /// Back to Idle with every derived display field unset.
    pub fn reset_all(&mut self) -> Event {
        self.scheduler.reset();
        self.active = None;
        self.started_at_ms = None;
        self.eta_ms = None;
        self.notifier.hide();
        Event::Reset { at: Utc::now() }
    }

    /// Advance the scheduler and apply the resulting side effects.
    pub fn poll(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let at = Utc::now();
        let index = self.scheduler.run_state().map_or(0, |r| r.current_index());

        match self.scheduler.poll(now)? {
            SchedulerEvent::Tick {
                stage_remaining_secs,
                total_remaining_secs,
            } => Some(Event::Tick {
                index,
                stage_remaining_secs,
                total_remaining_secs,
                at,
            }),
            SchedulerEvent::StageChanged { index, task, .. } => {
                self.on_stage_changed(&task);
                Some(Event::StageChanged { index, task, at })
            }
            SchedulerEvent::Finished => {
                self.notifier.show(FINISHED_TITLE);
                Some(Event::Finished { at })
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin(&mut self) -> Option<Event> {
        let routine = self.config.clone().normalized();
        let sequence = build_sequence(&routine);
        let now = self.clock.now_ms();
        let (tasks, total_secs) = (sequence.len(), sequence.total_secs());

        if let Err(e) = self.scheduler.start(sequence, now) {
            tracing::debug!(error = %e, "start ignored");
            return None;
        }

        if let Some(store) = &self.store {
            if let Err(e) = store.save_routine(&routine) {
                tracing::warn!(error = %e, "failed to save routine");
            }
        }
        self.notifier.hide();
        self.active = Some(routine);
        self.started_at_ms = Some(now);
        self.eta_ms = Some(now.saturating_add(total_secs.saturating_mul(1000)));

        Some(Event::SequenceStarted {
            tasks,
            total_secs,
            at: Utc::now(),
        })
    }

    fn on_stage_changed(&self, task: &Task) {
        match task {
            Task::Alarm {
                label,
                duration_secs,
                sound,
            } => {
                let volume = self
                    .active
                    .as_ref()
                    .map_or(self.config.volume_percent, |r| r.volume_percent);
                self.player.play_alert(*sound, *duration_secs, volume);
                self.notifier.show(label);
            }
            Task::Timer { .. } => self.notifier.hide(),
        }
    }

    fn remaining_event(&self, paused: bool) -> Event {
        let (stage_remaining_secs, total_remaining_secs) = self
            .scheduler
            .run_state()
            .map_or((0, 0), |r| (r.stage_remaining_secs(), r.total_remaining_secs()));
        let at = Utc::now();
        if paused {
            Event::Paused {
                stage_remaining_secs,
                total_remaining_secs,
                at,
            }
        } else {
            Event::Resumed {
                stage_remaining_secs,
                total_remaining_secs,
                at,
            }
        }
    }
}

/// `HH:MM` in local time, or the unset sentinel.
fn clock_label(epoch_ms: Option<u64>) -> String {
    epoch_ms
        .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms as i64))
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| UNSET_LABEL.to_string())
}
