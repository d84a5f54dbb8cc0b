//! The widget's audio output surface.

use std::sync::Mutex;
use tracing::info;
use webagent_core::{AudioRenderer, RemoteAudioTrack};

/// Keeps track of the remote audio the session has handed over for playback.
///
/// Decoding and output are the transport's job; this surface only owns which
/// tracks are currently live.
#[derive(Default)]
pub struct PlaybackSurface {
    tracks: Mutex<Vec<RemoteAudioTrack>>,
}

impl PlaybackSurface {
    pub fn active_tracks(&self) -> Vec<RemoteAudioTrack> {
        self.tracks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AudioRenderer for PlaybackSurface {
    fn attach(&self, track: &RemoteAudioTrack) {
        let mut tracks = self
            .tracks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if tracks.iter().all(|t| t.sid != track.sid) {
            info!(sid = %track.sid, participant = %track.participant, "Playing remote audio");
            tracks.push(track.clone());
        }
    }

    fn detach(&self, track_sid: &str) {
        let mut tracks = self
            .tracks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        tracks.retain(|t| t.sid != track_sid);
        info!(sid = %track_sid, remaining = tracks.len(), "Stopped remote audio");
    }
}
