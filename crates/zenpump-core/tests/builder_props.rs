//! Property tests for the sequence builder.

use proptest::prelude::*;
use zenpump_core::{build_sequence, RoutineConfig, SoundId, StageConfig, Task};

fn sound() -> impl Strategy<Value = SoundId> {
    prop_oneof![Just(SoundId::Bell), Just(SoundId::Wood), Just(SoundId::Alert)]
}

fn stage(label: &'static str) -> impl Strategy<Value = StageConfig> {
    (0u32..4, 0u32..6, sound(), any::<bool>()).prop_map(move |(min, alarm, sound, only_first)| {
        StageConfig::new(label, min, alarm, sound).only_first_round(only_first)
    })
}

fn routine() -> impl Strategy<Value = RoutineConfig> {
    (stage("A"), stage("B"), stage("C"), 1u32..5, 0u8..=100).prop_map(|(a, b, c, rounds, volume)| {
        RoutineConfig {
            stage_a: a,
            stage_b: b,
            stage_c: c,
            total_rounds: rounds,
            volume_percent: volume,
        }
    })
}

proptest! {
    #[test]
    fn build_is_deterministic(cfg in routine()) {
        prop_assert_eq!(build_sequence(&cfg), build_sequence(&cfg));
    }

    #[test]
    fn total_is_sum_of_durations(cfg in routine()) {
        let seq = build_sequence(&cfg);
        let sum: u64 = seq.iter().map(Task::duration_secs).sum();
        prop_assert_eq!(seq.total_secs(), sum);
    }

    #[test]
    fn alarms_are_never_zero_and_follow_their_timer(cfg in routine()) {
        let seq = build_sequence(&cfg);
        for (i, task) in seq.iter().enumerate() {
            if let Task::Alarm { label, duration_secs, .. } = task {
                prop_assert!(*duration_secs >= 1);
                prop_assert!(i > 0);
                let prev = seq.get(i - 1).unwrap();
                prop_assert!(!prev.is_alarm());
                prop_assert_eq!(label, &format!("{} complete", prev.label()));
            }
        }
    }

    #[test]
    fn zero_minute_stages_contribute_nothing(cfg in routine()) {
        let seq = build_sequence(&cfg);
        for stage in cfg.stages() {
            if stage.duration_minutes == 0 {
                prop_assert!(seq.iter().all(|t| !t.label().starts_with(stage.label.as_str())));
            }
        }
    }

    #[test]
    fn b_and_c_appear_every_round(cfg in routine()) {
        let seq = build_sequence(&cfg);
        for stage in [&cfg.stage_b, &cfg.stage_c] {
            let timers = seq.iter().filter(|t| !t.is_alarm() && t.label() == stage.label).count();
            let expected = if stage.duration_minutes > 0 { cfg.total_rounds as usize } else { 0 };
            prop_assert_eq!(timers, expected);
        }
    }
}
