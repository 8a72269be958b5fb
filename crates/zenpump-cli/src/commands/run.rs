//! Live runner: drives a routine in the terminal.
//!
//! Status goes to stdout as a single rewritten line, stage banners to stderr.
//! Alert beats ring the terminal bell from a helper thread so playback never
//! blocks the polling loop.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use zenpump_core::alerts::{AlertBackend, AlertPlan, AlertPlayer, AudioService, SoundId};
use zenpump_core::events::format_clock;
use zenpump_core::hooks::StageNotifier;
use zenpump_core::storage::{AlertsConfig, FileRoutineStore};
use zenpump_core::{Config, SchedulerState, SequenceController, SequenceDriver, Snapshot};

/// Rings `\x07` once per beat.
struct TerminalBell;

impl AlertBackend for TerminalBell {
    fn play(&mut self, plan: &AlertPlan) {
        if plan.is_silent() {
            return;
        }
        let offsets: Vec<f32> = plan.beats.iter().map(|b| b.offset_secs).collect();
        std::thread::spawn(move || {
            let mut elapsed = 0.0f32;
            for offset in offsets {
                if offset > elapsed {
                    std::thread::sleep(Duration::from_secs_f32(offset - elapsed));
                    elapsed = offset;
                }
                eprint!("\x07");
                let _ = std::io::stderr().flush();
            }
        });
    }
}

/// Backend for terminals where the bell is disabled: logs the plan only.
struct QuietBackend;

impl AlertBackend for QuietBackend {
    fn play(&mut self, plan: &AlertPlan) {
        tracing::info!(sound = %plan.sound, beats = plan.beats.len(), "alert");
    }
}

/// Player used when alerts are disabled entirely.
struct MutedPlayer;

impl AlertPlayer for MutedPlayer {
    fn play_alert(&self, _sound: SoundId, _duration_secs: u64, _volume_percent: u8) {}
}

struct StderrNotifier;

impl StageNotifier for StderrNotifier {
    fn show(&self, title: &str) {
        eprintln!("\n>> {title}");
    }

    fn hide(&self) {}
}

fn audio_service(alerts: &AlertsConfig) -> AudioService {
    let bell = alerts.terminal_bell;
    AudioService::new(move || {
        let backend: Box<dyn AlertBackend> = if bell {
            Box::new(TerminalBell)
        } else {
            Box::new(QuietBackend)
        };
        Some(backend)
    })
}

pub fn run(interval_ms: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let interval = Duration::from_millis(interval_ms.unwrap_or(config.runner.poll_interval_ms));

    let audio = Arc::new(audio_service(&config.alerts));
    let player: Arc<dyn AlertPlayer> = if config.alerts.enabled {
        audio.clone()
    } else {
        Arc::new(MutedPlayer)
    };
    let controller = SequenceController::new(config.routine.clone(), player, Arc::new(StderrNotifier))
        .with_store(Arc::new(FileRoutineStore::new(Config::path()?)));

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(drive(SequenceDriver::with_interval(controller, interval)));
    audio.shutdown();
    result
}

async fn drive(mut driver: SequenceDriver) -> Result<(), Box<dyn std::error::Error>> {
    if driver.toggle().is_none() {
        println!("Nothing to run: every stage is 0 minutes.");
        return Ok(());
    }
    eprintln!("commands: p = pause/resume, r = reset, q = quit");

    let mut snapshots = driver.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = snapshots.borrow_and_update().clone();
                print_status(&snap)?;
                if snap.finished {
                    println!();
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line?.as_deref().map(str::trim) {
                    None => stdin_open = false,
                    Some("q") => break,
                    Some("p") => {
                        driver.toggle();
                    }
                    Some("r") => {
                        driver.reset_all();
                        println!("\nreset; press p to start again");
                    }
                    Some("") => {}
                    Some(other) => eprintln!("unknown command: {other}"),
                }
            }
        }
    }

    driver.shutdown();
    Ok(())
}

fn print_status(snap: &Snapshot) -> std::io::Result<()> {
    let name = match snap.state {
        SchedulerState::Finished => "Finished",
        SchedulerState::Idle => "READY",
        _ => snap.current_label.as_str(),
    };
    let timer = if snap.finished {
        "DONE".to_string()
    } else {
        format_clock(snap.stage_remaining_secs)
    };
    let paused = if snap.state == SchedulerState::Paused { " (paused)" } else { "" };
    let mut out = std::io::stdout().lock();
    write!(
        out,
        "\r{name:<20} {timer:>6}{paused} | step {} | left {} | {:>3.0}% | start {} eta {}   ",
        snap.step_label,
        format_clock(snap.total_remaining_secs),
        snap.progress_pct,
        snap.start_label,
        snap.eta_label,
    )?;
    out.flush()
}
