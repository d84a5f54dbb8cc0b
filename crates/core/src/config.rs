use serde::{Deserialize, Serialize};

/// Microphone capture settings requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioCaptureOptions {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for AudioCaptureOptions {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
            sample_rate: 48_000,
        }
    }
}

/// Capture and transport settings for one session.
///
/// The controller holds this by value and never hands out a mutable
/// reference, so a session sees exactly the settings it was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Publish the local microphone as soon as the session connects.
    pub audio: bool,
    /// Publish the local camera as soon as the session connects.
    pub video: bool,
    pub audio_capture_defaults: AudioCaptureOptions,
    /// Only forward streams that a subscriber is actively consuming.
    pub dynacast: bool,
    /// Adapt received stream quality to network conditions.
    pub adaptive_stream: bool,
    /// Release the capture device when a local track is unpublished.
    pub stop_local_track_on_unpublish: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            audio: false,
            video: false,
            audio_capture_defaults: AudioCaptureOptions::default(),
            dynacast: true,
            adaptive_stream: true,
            stop_local_track_on_unpublish: true,
        }
    }
}
