//! The session controller: credential, connection lifecycle, close signal.
//!
//! A controller drives exactly one session attempt through
//! `Idle → FetchingCredential → Connecting → Connected → Disconnected`.
//! There is no retry and no reconnection; the UI starts over by mounting a new
//! controller.

use crate::{
    config::ConnectionConfig,
    credential::{Credential, CredentialSource},
    error::SessionError,
    listener::{CommandChannelListener, ListenerHandle},
    navigator::Navigator,
    renderer::AudioRenderer,
    transport::{RealtimeTransport, RoomEvent},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};

/// Observable lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    FetchingCredential,
    Connecting,
    Connected,
    Disconnected,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, FetchingCredential)
                | (FetchingCredential, Connecting)
                | (Connecting, Connected)
                | (FetchingCredential | Connecting | Connected, Disconnected)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Disconnected
    }
}

/// Where to connect and as whom.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Identity sent to the token endpoint.
    pub identity: String,
    /// Realtime server address.
    pub server_url: String,
    pub connection: ConnectionConfig,
}

impl SessionSettings {
    pub fn new(identity: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            server_url: server_url.into(),
            connection: ConnectionConfig::default(),
        }
    }
}

/// Requests the UI can make of a running controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCommand {
    SetMicrophoneEnabled(bool),
    Unmount,
}

/// The UI's close callback. It can run at most once.
struct CloseSignal(Option<Box<dyn FnOnce() + Send + Sync>>);

impl CloseSignal {
    fn fire(&mut self) {
        if let Some(close) = self.0.take() {
            info!("Closing widget");
            close();
        }
    }
}

enum Phase {
    Connecting,
    Connected(ListenerHandle),
}

/// Owns one session attempt and everything it holds.
pub struct SessionController {
    settings: SessionSettings,
    credentials: Arc<dyn CredentialSource>,
    transport: Arc<dyn RealtimeTransport>,
    navigator: Arc<dyn Navigator>,
    renderer: Arc<dyn AudioRenderer>,
    on_close: CloseSignal,
    /// Present from a successful fetch until the session ends.
    credential: Option<Credential>,
    state: watch::Sender<SessionState>,
}

impl SessionController {
    pub fn new(
        settings: SessionSettings,
        credentials: Arc<dyn CredentialSource>,
        transport: Arc<dyn RealtimeTransport>,
        navigator: Arc<dyn Navigator>,
        renderer: Arc<dyn AudioRenderer>,
        on_close: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            settings,
            credentials,
            transport,
            navigator,
            renderer,
            on_close: CloseSignal(Some(Box::new(on_close))),
            credential: None,
            state,
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Spawns the session onto the current tokio runtime.
    pub fn mount(self) -> ControllerHandle {
        let (commands, commands_rx) = mpsc::channel(8);
        let state = self.subscribe_state();
        let task = tokio::spawn(self.run(commands_rx));
        ControllerHandle {
            commands,
            state,
            task,
        }
    }

    /// Runs the session to completion.
    ///
    /// Returns `Ok(())` when the UI unmounted the widget (an `Unmount` command
    /// or every command sender dropped); the close signal is not invoked in
    /// that case. Every other ending invokes the close signal once and is
    /// returned as an error.
    #[instrument(
        name = "widget_session",
        skip_all,
        fields(identity = %self.settings.identity, server_url = %self.settings.server_url)
    )]
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<ControllerCommand>,
    ) -> Result<(), SessionError> {
        transition(&self.state, SessionState::FetchingCredential);
        let fetched = tokio::select! {
            result = self.credentials.fetch_credential(&self.settings.identity) => Some(result),
            _ = unmounted(&mut commands) => None,
        };
        let credential = match fetched {
            None => {
                info!("Unmounted while fetching credential");
                self.discard();
                return Ok(());
            }
            Some(Err(e)) => {
                error!(kind = ?e.kind(), error = %e, "Error fetching session token");
                return Err(self.fail(e.into()));
            }
            Some(Ok(credential)) => credential,
        };

        transition(&self.state, SessionState::Connecting);
        let credential = &*self.credential.insert(credential);
        let connected = tokio::select! {
            result = self.transport.connect(&self.settings.server_url, credential, &self.settings.connection) => Some(result),
            _ = unmounted(&mut commands) => None,
        };
        let (mut session, mut events) = match connected {
            None => {
                info!("Unmounted while connecting");
                self.discard();
                return Ok(());
            }
            Some(Err(e)) => {
                error!(error = ?e, "Failed to connect to realtime server");
                return Err(self.fail(SessionError::TransportConnect(e)));
            }
            Some(Ok(connected)) => connected,
        };

        let listener = CommandChannelListener::new(self.navigator.clone());
        let mut phase = Phase::Connecting;
        let mut tracks: Vec<String> = Vec::new();

        let ending = loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    None | Some(ControllerCommand::Unmount) => {
                        info!("Widget unmounted, leaving session");
                        break None;
                    }
                    Some(ControllerCommand::SetMicrophoneEnabled(enabled)) => {
                        if matches!(phase, Phase::Connected(_)) {
                            if let Err(e) = session.set_microphone_enabled(enabled).await {
                                warn!(enabled, error = ?e, "Failed to toggle microphone");
                            }
                        } else {
                            warn!(enabled, "Ignoring microphone request before the session is connected");
                        }
                    }
                },
                event = events.recv() => match event {
                    Some(RoomEvent::Connected) => {
                        if let Phase::Connecting = phase {
                            phase = Phase::Connected(listener.attach());
                            transition(&self.state, SessionState::Connected);
                        } else {
                            debug!("Ignoring repeated connected event");
                        }
                    }
                    Some(RoomEvent::DataReceived { payload, topic, participant }) => match &phase {
                        Phase::Connected(handle) => {
                            debug!(?topic, ?participant, len = payload.len(), "Received data message");
                            handle.handle_payload(&payload);
                        }
                        Phase::Connecting => {
                            debug!("Dropping data message received before the session connected");
                        }
                    },
                    Some(RoomEvent::TrackSubscribed(track)) => {
                        if tracks.contains(&track.sid) {
                            debug!(sid = %track.sid, "Track already rendered");
                        } else if matches!(phase, Phase::Connected(_)) {
                            info!(sid = %track.sid, participant = %track.participant, "Rendering remote audio track");
                            self.renderer.attach(&track);
                            tracks.push(track.sid);
                        } else {
                            debug!(sid = %track.sid, "Not rendering track before the session connected");
                        }
                    }
                    Some(RoomEvent::TrackUnsubscribed { sid }) => {
                        if let Some(pos) = tracks.iter().position(|t| *t == sid) {
                            tracks.swap_remove(pos);
                            self.renderer.detach(&sid);
                        }
                    }
                    Some(RoomEvent::Disconnected { reason }) => {
                        info!(?reason, "Realtime session disconnected");
                        break Some(SessionError::TransportDisconnected { reason });
                    }
                    Some(RoomEvent::Error(message)) => {
                        error!(%message, "Realtime transport error");
                        break Some(SessionError::Transport(message));
                    }
                    None => {
                        warn!("Transport event stream ended without a disconnect event");
                        break Some(SessionError::TransportDisconnected { reason: None });
                    }
                },
            }
        };

        // Detach the listener before any teardown I/O so nothing else is dispatched.
        drop(phase);
        drop(events);
        for sid in tracks.drain(..) {
            self.renderer.detach(&sid);
        }
        if let Err(e) = session.disconnect().await {
            warn!(error = ?e, "Error while leaving realtime session");
        }

        match ending {
            None => {
                self.discard();
                Ok(())
            }
            Some(err) => Err(self.fail(err)),
        }
    }

    /// Ends the attempt without telling the UI; the UI already knows.
    fn discard(&mut self) {
        self.credential = None;
        transition(&self.state, SessionState::Disconnected);
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        self.discard();
        self.on_close.fire();
        err
    }
}

fn transition(state: &watch::Sender<SessionState>, next: SessionState) {
    let previous = state.send_replace(next);
    debug_assert!(
        previous.can_transition_to(next),
        "illegal session transition {previous:?} -> {next:?}"
    );
    info!(from = ?previous, to = ?next, "Session state changed");
}

/// Resolves once the UI asks to unmount, ignoring requests that need a live session.
async fn unmounted(commands: &mut mpsc::Receiver<ControllerCommand>) {
    loop {
        match commands.recv().await {
            None | Some(ControllerCommand::Unmount) => return,
            Some(ControllerCommand::SetMicrophoneEnabled(enabled)) => {
                warn!(enabled, "Ignoring microphone request before the session is connected");
            }
        }
    }
}

/// The UI's grip on a mounted controller. Dropping it unmounts the widget.
pub struct ControllerHandle {
    commands: mpsc::Sender<ControllerCommand>,
    state: watch::Receiver<SessionState>,
    task: JoinHandle<Result<(), SessionError>>,
}

impl ControllerHandle {
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Waits until the session reaches `target` or ends, returning the state reached.
    pub async fn wait_for_state(&mut self, target: SessionState) -> SessionState {
        let reached = match self
            .state
            .wait_for(|s| *s == target || s.is_terminal())
            .await
        {
            Ok(state) => Some(*state),
            Err(_) => None,
        };
        reached.unwrap_or_else(|| *self.state.borrow())
    }

    pub async fn set_microphone_enabled(&self, enabled: bool) {
        if self
            .commands
            .send(ControllerCommand::SetMicrophoneEnabled(enabled))
            .await
            .is_err()
        {
            debug!("Session already ended, microphone request dropped");
        }
    }

    /// Tears the session down and waits for the controller to finish.
    pub async fn unmount(self) -> Result<(), SessionError> {
        let Self { commands, task, .. } = self;
        let _ = commands.send(ControllerCommand::Unmount).await;
        task.await?
    }

    /// Waits for the session to end on its own.
    pub async fn finished(self) -> Result<(), SessionError> {
        let Self { commands, task, .. } = self;
        let result = task.await;
        drop(commands);
        result?
    }
}
