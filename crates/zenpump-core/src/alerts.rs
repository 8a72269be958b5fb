//! Alert planning and the audio service boundary.
//!
//! The sequencer only decides *when* an alert fires and *which* sound it uses.
//! [`AlertPlan`] turns that decision into concrete beats and a vibration
//! pattern; an [`AlertBackend`] (terminal bell, audio device, ...) renders it.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

pub use crate::timer::SoundId;

/// Length of each vibration pulse in milliseconds.
pub const VIBRATION_PULSE_MS: u32 = 300;
/// Each beat is cut this many seconds after its onset.
pub const BEAT_STOP_SECS: f32 = 0.9;
/// Gain the decay ramp ends at.
pub const DECAY_FLOOR_GAIN: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
}

/// Timbre of one alert beat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertVoice {
    pub waveform: Waveform,
    pub frequency_hz: f32,
    /// Seconds for the gain to fall to [`DECAY_FLOOR_GAIN`].
    pub decay_secs: f32,
}

impl AlertVoice {
    pub fn for_sound(sound: SoundId) -> Self {
        match sound {
            SoundId::Bell => Self {
                waveform: Waveform::Sine,
                frequency_hz: 880.0,
                decay_secs: 0.8,
            },
            SoundId::Wood => Self {
                waveform: Waveform::Triangle,
                frequency_hz: 300.0,
                decay_secs: 0.4,
            },
            SoundId::Alert => Self {
                waveform: Waveform::Square,
                frequency_hz: 440.0,
                decay_secs: 0.5,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Onset relative to the start of the alert.
    pub offset_secs: f32,
    pub stop_secs: f32,
    pub gain: f32,
}

/// Fully resolved alert: one beat per second plus a vibration pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPlan {
    pub sound: SoundId,
    pub voice: AlertVoice,
    pub beats: Vec<Beat>,
    /// Pulse lengths in ms; never empty.
    pub vibration_ms: Vec<u32>,
}

impl AlertPlan {
    pub fn new(sound: SoundId, duration_secs: u64, volume_percent: u8) -> Self {
        let gain = f32::from(volume_percent.min(100)) / 100.0;
        let beats = (0..duration_secs)
            .map(|i| {
                let offset_secs = i as f32;
                Beat {
                    offset_secs,
                    stop_secs: offset_secs + BEAT_STOP_SECS,
                    gain,
                }
            })
            .collect();
        let pulses = duration_secs.max(1) as usize;
        Self {
            sound,
            voice: AlertVoice::for_sound(sound),
            beats,
            vibration_ms: vec![VIBRATION_PULSE_MS; pulses],
        }
    }

    pub fn is_silent(&self) -> bool {
        self.beats.iter().all(|b| b.gain == 0.0)
    }
}

/// Receives alert requests from the controller. Fire-and-forget: the caller
/// neither waits for playback nor retries.
pub trait AlertPlayer: Send + Sync {
    fn play_alert(&self, sound: SoundId, duration_secs: u64, volume_percent: u8);
}

/// A device that can render an [`AlertPlan`].
pub trait AlertBackend: Send {
    fn play(&mut self, plan: &AlertPlan);

    /// Release the device. Called once from [`AudioService::shutdown`].
    fn close(&mut self) {}
}

type BackendFactory = Box<dyn Fn() -> Option<Box<dyn AlertBackend>> + Send + Sync>;

/// Process-wide audio resource.
///
/// The backend is acquired lazily on the first alert and kept until
/// [`shutdown`](Self::shutdown). When the factory cannot provide a device the
/// alert is dropped and acquisition is retried on the next one.
pub struct AudioService {
    factory: BackendFactory,
    backend: Mutex<Option<Box<dyn AlertBackend>>>,
}

impl AudioService {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Option<Box<dyn AlertBackend>> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            backend: Mutex::new(None),
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.backend
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Close and drop the backend, if one was acquired.
    pub fn shutdown(&self) {
        let mut slot = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut backend) = slot.take() {
            backend.close();
            tracing::debug!("audio backend closed");
        }
    }
}

impl AlertPlayer for AudioService {
    fn play_alert(&self, sound: SoundId, duration_secs: u64, volume_percent: u8) {
        let mut slot = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = (self.factory)();
            if slot.is_none() {
                tracing::warn!(%sound, "no audio backend available, alert dropped");
                return;
            }
        }
        let plan = AlertPlan::new(sound, duration_secs, volume_percent);
        if let Some(backend) = slot.as_mut() {
            backend.play(&plan);
        }
    }
}

impl std::fmt::Debug for AudioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioService")
            .field("acquired", &self.is_acquired())
            .finish()
    }
}
