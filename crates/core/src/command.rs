//! Decoding of control messages the agent pushes over the data channel.

use crate::error::MalformedCommand;
use serde::Deserialize;
use serde_json::Value;

/// Raw wire shape: `{type, action?, url?, section?}`. Unknown fields are
/// ignored so the agent can add fields without breaking older widgets.
#[derive(Deserialize, Debug)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    action: Option<String>,
    url: Option<String>,
    section: Option<String>,
}

/// A decoded data channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCommand {
    /// Open `url` in a new, independent browsing context.
    OpenUrl { url: String },
    /// Replace the current page with `url`. `section` is informational only.
    NavigateToSection {
        url: String,
        section: Option<String>,
    },
    /// Well-formed JSON that does not describe a supported command.
    Unrecognized {
        kind: Option<String>,
        action: Option<String>,
    },
}

impl InboundCommand {
    /// Decodes a UTF-8 JSON payload.
    ///
    /// Only bytes that are not UTF-8 JSON produce an error. A missing `url`, an
    /// unknown `type`, an unknown `action` or a top-level value that is not an
    /// object all decode to [`InboundCommand::Unrecognized`].
    pub fn decode(payload: &[u8]) -> Result<Self, MalformedCommand> {
        let text = std::str::from_utf8(payload)?;
        // Struct deserialization also accepts arrays positionally; commands must be objects.
        let value = match serde_json::from_str::<Value>(text)? {
            value @ Value::Object(_) => value,
            _ => {
                return Ok(Self::Unrecognized {
                    kind: None,
                    action: None,
                });
            }
        };
        let envelope: Envelope = serde_json::from_value(value)?;
        Ok(Self::from_envelope(envelope))
    }

    fn from_envelope(envelope: Envelope) -> Self {
        let Envelope {
            kind,
            action,
            url,
            section,
        } = envelope;

        match (kind.as_deref(), action.as_deref(), url) {
            (Some("navigate"), Some("open_url"), Some(url)) => Self::OpenUrl { url },
            (Some("navigate"), Some("navigate_to_section"), Some(url)) => {
                Self::NavigateToSection { url, section }
            }
            _ => Self::Unrecognized { kind, action },
        }
    }
}
