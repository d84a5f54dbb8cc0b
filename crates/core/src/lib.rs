//! Core session logic for the voice agent widget.
//!
//! The widget talks to a remote voice agent over a real-time media session.
//! This crate owns everything between "the UI mounted the widget" and "the UI
//! should close it": fetching the access credential, driving the connection
//! lifecycle, and executing the navigation commands the agent pushes over the
//! data channel. Concrete transports and host surfaces plug in through the
//! traits in [`transport`], [`navigator`] and [`renderer`].

pub mod command;
pub mod config;
pub mod controller;
pub mod credential;
pub mod error;
pub mod listener;
pub mod navigator;
pub mod renderer;
pub mod transport;

pub use command::InboundCommand;
pub use config::{AudioCaptureOptions, ConnectionConfig};
pub use controller::{ControllerHandle, SessionController, SessionSettings, SessionState};
pub use credential::{Credential, CredentialSource, HttpCredentialFetcher};
pub use error::{CredentialFetchError, FetchFailureKind, MalformedCommand, SessionError};
pub use listener::{CommandChannelListener, ListenerHandle};
pub use navigator::Navigator;
pub use renderer::{AudioRenderer, RemoteAudioTrack};
pub use transport::{RealtimeTransport, RoomEvent, RoomSession};
