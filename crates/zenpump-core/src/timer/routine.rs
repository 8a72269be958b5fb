//! Stage and routine configuration.
//!
//! A routine is always exactly three stages (A, B, C) repeated for a number of
//! rounds. Values here are already typed; coercion of raw user input happens at
//! the boundary that produces them, see [`RoutineConfig::normalized`].

use serde::{Deserialize, Serialize};

use super::task::SoundId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Display label. Alarm tasks are labelled `"{label} complete"`.
    pub label: String,
    /// Timer length in minutes. Zero drops the stage (timer and alarm).
    #[serde(default)]
    pub duration_minutes: u32,
    /// Trailing alarm length in seconds. Zero means no alarm.
    #[serde(default)]
    pub alarm_seconds: u32,
    #[serde(default = "default_sound")]
    pub sound: SoundId,
    /// Only honoured on stage A.
    #[serde(default)]
    pub only_first_round: bool,
}

fn default_sound() -> SoundId {
    SoundId::Bell
}

impl StageConfig {
    pub fn new(label: impl Into<String>, duration_minutes: u32, alarm_seconds: u32, sound: SoundId) -> Self {
        Self {
            label: label.into(),
            duration_minutes,
            alarm_seconds,
            sound,
            only_first_round: false,
        }
    }

    pub fn only_first_round(mut self, only_first: bool) -> Self {
        self.only_first_round = only_first;
        self
    }
}

/// Full routine: three stages, round count and alert volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineConfig {
    #[serde(default = "default_stage_a")]
    pub stage_a: StageConfig,
    #[serde(default = "default_stage_b")]
    pub stage_b: StageConfig,
    #[serde(default = "default_stage_c")]
    pub stage_c: StageConfig,
    #[serde(default = "default_total_rounds")]
    pub total_rounds: u32,
    #[serde(default = "default_volume")]
    pub volume_percent: u8,
}

fn default_stage_a() -> StageConfig {
    StageConfig::new("A", 2, 3, SoundId::Bell).only_first_round(true)
}
fn default_stage_b() -> StageConfig {
    StageConfig::new("B", 15, 5, SoundId::Alert)
}
fn default_stage_c() -> StageConfig {
    StageConfig::new("C", 5, 3, SoundId::Wood)
}
fn default_total_rounds() -> u32 {
    2
}
fn default_volume() -> u8 {
    50
}

impl Default for RoutineConfig {
    fn default() -> Self {
        Self {
            stage_a: default_stage_a(),
            stage_b: default_stage_b(),
            stage_c: default_stage_c(),
            total_rounds: default_total_rounds(),
            volume_percent: default_volume(),
        }
    }
}

impl RoutineConfig {
    /// Stages in execution order.
    pub fn stages(&self) -> [&StageConfig; 3] {
        [&self.stage_a, &self.stage_b, &self.stage_c]
    }

    /// Coerce out-of-range values to safe ones: at least one round, volume at
    /// most 100.
    pub fn normalized(mut self) -> Self {
        self.total_rounds = self.total_rounds.max(1);
        self.volume_percent = self.volume_percent.min(100);
        self
    }
}
