use serde::Serialize;

/// A remote audio track the transport has subscribed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteAudioTrack {
    pub sid: String,
    pub participant: String,
}

/// The surface that plays remote audio.
pub trait AudioRenderer: Send + Sync {
    fn attach(&self, track: &RemoteAudioTrack);
    fn detach(&self, track_sid: &str);
}
