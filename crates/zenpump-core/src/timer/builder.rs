//! Expands a [`RoutineConfig`] into a flat [`Sequence`].
//!
//! Order within a round is always A, B, C. Stage A is skipped after the first
//! round when `only_first_round` is set. A stage with zero minutes contributes
//! nothing, not even its alarm.

use super::routine::{RoutineConfig, StageConfig};
use super::task::{Sequence, Task};

/// Build the task sequence for one full run. Pure and deterministic.
///
/// The result may be empty when every stage has zero minutes; callers must
/// treat that as "cannot start".
pub fn build_sequence(config: &RoutineConfig) -> Sequence {
    let mut tasks = Vec::new();

    for round in 0..config.total_rounds {
        let a = &config.stage_a;
        if round == 0 || !a.only_first_round {
            push_stage(&mut tasks, a);
        }
        push_stage(&mut tasks, &config.stage_b);
        push_stage(&mut tasks, &config.stage_c);
    }

    Sequence::new(tasks)
}

fn push_stage(tasks: &mut Vec<Task>, stage: &StageConfig) {
    if stage.duration_minutes == 0 {
        return;
    }
    tasks.push(Task::Timer {
        label: stage.label.clone(),
        duration_secs: u64::from(stage.duration_minutes) * 60,
    });
    if stage.alarm_seconds > 0 {
        tasks.push(Task::Alarm {
            label: format!("{} complete", stage.label),
            duration_secs: u64::from(stage.alarm_seconds),
            sound: stage.sound,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::task::SoundId;

    fn config(a: StageConfig, b: StageConfig, c: StageConfig, rounds: u32) -> RoutineConfig {
        RoutineConfig {
            stage_a: a,
            stage_b: b,
            stage_c: c,
            total_rounds: rounds,
            volume_percent: 50,
        }
    }

    #[test]
    fn single_stage_two_rounds() {
        let cfg = config(
            StageConfig::new("A", 0, 3, SoundId::Wood),
            StageConfig::new("B", 1, 2, SoundId::Bell),
            StageConfig::new("C", 0, 0, SoundId::Alert),
            2,
        );
        let seq = build_sequence(&cfg);
        let timer = Task::Timer { label: "B".into(), duration_secs: 60 };
        let alarm = Task::Alarm { label: "B complete".into(), duration_secs: 2, sound: SoundId::Bell };
        assert_eq!(seq.tasks(), &[timer.clone(), alarm.clone(), timer, alarm]);
        assert_eq!(seq.total_secs(), 124);
    }

    #[test]
    fn only_first_round_keeps_a_once_before_b() {
        let cfg = config(
            StageConfig::new("A", 2, 0, SoundId::Bell).only_first_round(true),
            StageConfig::new("B", 1, 0, SoundId::Bell),
            StageConfig::new("C", 1, 0, SoundId::Bell),
            3,
        );
        let seq = build_sequence(&cfg);
        let labels: Vec<&str> = seq.iter().map(Task::label).collect();
        assert_eq!(labels, ["A", "B", "C", "B", "C", "B", "C"]);
    }

    #[test]
    fn a_repeats_when_not_only_first() {
        let cfg = config(
            StageConfig::new("A", 2, 1, SoundId::Bell),
            StageConfig::new("B", 0, 0, SoundId::Bell),
            StageConfig::new("C", 0, 0, SoundId::Bell),
            2,
        );
        let seq = build_sequence(&cfg);
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.iter().filter(|t| t.is_alarm()).count(), 2);
    }

    #[test]
    fn zero_minutes_drops_alarm_too() {
        let cfg = config(
            StageConfig::new("A", 0, 10, SoundId::Bell),
            StageConfig::new("B", 0, 10, SoundId::Bell),
            StageConfig::new("C", 1, 0, SoundId::Bell),
            1,
        );
        let seq = build_sequence(&cfg);
        assert_eq!(seq.tasks(), &[Task::Timer { label: "C".into(), duration_secs: 60 }]);
    }

    #[test]
    fn all_zero_yields_empty() {
        let cfg = config(
            StageConfig::new("A", 0, 3, SoundId::Bell),
            StageConfig::new("B", 0, 3, SoundId::Bell),
            StageConfig::new("C", 0, 3, SoundId::Bell),
            5,
        );
        assert!(build_sequence(&cfg).is_empty());
    }

    #[test]
    fn build_is_deterministic() {
        let cfg = RoutineConfig::default();
        assert_eq!(build_sequence(&cfg), build_sequence(&cfg));
    }

    #[test]
    fn default_routine_shape() {
        let seq = build_sequence(&RoutineConfig::default());
        // A(+alarm) once, then B(+alarm) C(+alarm) for two rounds.
        assert_eq!(seq.len(), 2 + 4 + 4);
        assert_eq!(seq.total_secs(), (120 + 3) + 2 * ((900 + 5) + (300 + 3)));
    }
}
