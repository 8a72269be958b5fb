use zenpump_core::events::format_clock;
use zenpump_core::{build_sequence, Config, Task};

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let sequence = build_sequence(&config.routine.clone().normalized());

    if json {
        let out = serde_json::json!({
            "tasks": sequence,
            "total_secs": sequence.total_secs(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if sequence.is_empty() {
        println!("(empty) every stage is 0 minutes");
        return Ok(());
    }
    for (i, task) in sequence.iter().enumerate() {
        let kind = match task {
            Task::Timer { .. } => "timer".to_string(),
            Task::Alarm { sound, .. } => format!("alarm/{sound}"),
        };
        println!(
            "{:>3}. {:<12} {:<24} {}",
            i + 1,
            kind,
            task.label(),
            format_clock(task.duration_secs())
        );
    }
    println!(
        "total: {} ({} min)",
        format_clock(sequence.total_secs()),
        sequence.total_secs().div_ceil(60)
    );
    Ok(())
}
