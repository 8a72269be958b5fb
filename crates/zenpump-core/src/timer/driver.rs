//! Polling loop for a [`SequenceController`].
//!
//! At most one loop exists at a time. Every command tears the loop down before
//! touching the controller and spawns a fresh one only if the controller is
//! running afterwards, so pause/reset never see a stray late poll and resume
//! never ends up with two overlapping loops.
//!
//! Commands that spawn must be called from within a tokio runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::controller::SequenceController;
use crate::events::{Event, Snapshot};

/// Default cadence of the polling loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct SequenceDriver {
    controller: Arc<Mutex<SequenceController>>,
    interval: Duration,
    poll_task: Option<JoinHandle<()>>,
    /// Bumped on every teardown; a loop that sees a newer value exits.
    generation: Arc<AtomicU64>,
    snapshots: watch::Sender<Snapshot>,
}

impl SequenceDriver {
    pub fn new(controller: SequenceController) -> Self {
        Self::with_interval(controller, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(controller: SequenceController, interval: Duration) -> Self {
        let (snapshots, _) = watch::channel(controller.snapshot());
        Self {
            controller: Arc::new(Mutex::new(controller)),
            interval: interval.max(Duration::from_millis(1)),
            poll_task: None,
            generation: Arc::new(AtomicU64::new(0)),
            snapshots,
        }
    }

    /// Receive a snapshot after every poll and command.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Lock the controller, e.g. to edit its configuration.
    pub fn controller(&self) -> MutexGuard<'_, SequenceController> {
        lock(&self.controller)
    }

    pub fn is_polling(&self) -> bool {
        self.poll_task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn toggle(&mut self) -> Option<Event> {
        self.command(SequenceController::toggle)
    }

    pub fn reset_all(&mut self) -> Event {
        self.command(SequenceController::reset_all)
    }

    /// Stop polling without touching the controller.
    pub fn shutdown(&mut self) {
        self.stop_loop();
    }

    fn command<T>(&mut self, f: impl FnOnce(&mut SequenceController) -> T) -> T {
        self.stop_loop();
        let (out, running) = {
            let mut ctl = lock(&self.controller);
            let out = f(&mut ctl);
            self.snapshots.send_replace(ctl.snapshot());
            (out, ctl.is_running())
        };
        if running {
            self.spawn_loop();
        }
        out
    }

    fn stop_loop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }

    fn spawn_loop(&mut self) {
        let controller = Arc::clone(&self.controller);
        let generation = Arc::clone(&self.generation);
        let snapshots = self.snapshots.clone();
        let period = self.interval;
        let mine = generation.load(Ordering::SeqCst);

        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                // Publish under the lock: once a command holds it, this loop
                // can no longer overwrite the command's snapshot.
                let (event, running) = {
                    let mut ctl = lock(&controller);
                    if generation.load(Ordering::SeqCst) != mine {
                        return;
                    }
                    let event = ctl.poll();
                    snapshots.send_replace(ctl.snapshot());
                    (event, ctl.is_running())
                };
                if let Some(Event::StageChanged { index, task, .. }) = &event {
                    tracing::debug!(index, label = task.label(), "poll crossed stage boundary");
                }
                if !running {
                    return;
                }
            }
        }));
    }
}

impl Drop for SequenceDriver {
    fn drop(&mut self) {
        self.stop_loop();
    }
}

fn lock(controller: &Mutex<SequenceController>) -> MutexGuard<'_, SequenceController> {
    controller.lock().unwrap_or_else(PoisonError::into_inner)
}
