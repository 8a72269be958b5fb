use serde::{Deserialize, Serialize};

/// Alert timbre played when an alarm task begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundId {
    Bell,
    Wood,
    Alert,
}

impl SoundId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundId::Bell => "bell",
            SoundId::Wood => "wood",
            SoundId::Alert => "alert",
        }
    }
}

impl std::fmt::Display for SoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One schedulable unit of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Task {
    /// Plain countdown.
    Timer { label: String, duration_secs: u64 },
    /// Short alert period signalling a stage transition.
    /// `duration_secs` is always at least 1 when produced by the builder.
    Alarm {
        label: String,
        duration_secs: u64,
        sound: SoundId,
    },
}

impl Task {
    pub fn label(&self) -> &str {
        match self {
            Task::Timer { label, .. } | Task::Alarm { label, .. } => label,
        }
    }

    pub fn duration_secs(&self) -> u64 {
        match self {
            Task::Timer { duration_secs, .. } | Task::Alarm { duration_secs, .. } => *duration_secs,
        }
    }

    /// Duration in milliseconds, saturating on overflow.
    pub fn duration_ms(&self) -> u64 {
        self.duration_secs().saturating_mul(1000)
    }

    pub fn is_alarm(&self) -> bool {
        matches!(self, Task::Alarm { .. })
    }
}

/// Ordered, immutable list of tasks for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence {
    tasks: Vec<Task>,
}

impl Sequence {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Sum of every task's duration in seconds.
    pub fn total_secs(&self) -> u64 {
        self.tasks
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.duration_secs()))
    }
}

impl From<Vec<Task>> for Sequence {
    fn from(tasks: Vec<Task>) -> Self {
        Self::new(tasks)
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
