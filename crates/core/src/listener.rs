//! Executes navigation commands received over the data channel.

use crate::{command::InboundCommand, navigator::Navigator};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Hands out [`ListenerHandle`]s bound to the host's navigator.
#[derive(Clone)]
pub struct CommandChannelListener {
    navigator: Arc<dyn Navigator>,
}

impl CommandChannelListener {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }

    /// Starts listening. Messages are processed only through the returned
    /// handle, and dropping it stops processing.
    pub fn attach(&self) -> ListenerHandle {
        info!("Data message listener registered");
        ListenerHandle {
            navigator: self.navigator.clone(),
        }
    }
}

/// A live subscription to one session's data channel.
///
/// The session controller stores the handle inside its `Connected` phase, so
/// leaving that phase on any path drops it.
pub struct ListenerHandle {
    navigator: Arc<dyn Navigator>,
}

impl ListenerHandle {
    /// Decodes one data channel payload and executes it if recognized.
    ///
    /// Nothing here is fatal to the session: malformed payloads and navigator
    /// failures are logged and dropped.
    pub fn handle_payload(&self, payload: &[u8]) {
        let command = match InboundCommand::decode(payload) {
            Ok(command) => command,
            Err(e) => {
                error!(error = %e, len = payload.len(), "Error processing data message");
                return;
            }
        };
        self.dispatch(command);
    }

    fn dispatch(&self, command: InboundCommand) {
        match command {
            InboundCommand::OpenUrl { url } => {
                info!(%url, "Opening URL in new context");
                if let Err(e) = self.navigator.open_in_new_context(&url) {
                    warn!(%url, error = ?e, "Failed to open URL");
                }
            }
            InboundCommand::NavigateToSection { url, section } => {
                info!(%url, section = ?section, "Navigating to section");
                if let Err(e) = self.navigator.replace_location(&url) {
                    warn!(%url, error = ?e, "Failed to navigate");
                }
            }
            InboundCommand::Unrecognized { kind, action } => {
                debug!(kind = ?kind, action = ?action, "Ignoring unrecognized data message");
            }
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        info!("Cleaning up data message listener");
    }
}
