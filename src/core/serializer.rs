//! Envelope encoding for the wire

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::category::Category;
use crate::core::envelope::{ChatMessage, Emote, Envelope, GenericEnvelope, Notification};
use crate::error::{RelayError, Result};

/// Serialized text shared by every recipient of one broadcast
pub type Payload = Arc<str>;

/// Wire contract chosen once per deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// Self-describing record per event kind
    #[default]
    Named,
    /// `{"type", "stringValues", "intValues", "boolValues"}`
    Generic,
}

impl FromStr for WireFormat {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "named" => Ok(WireFormat::Named),
            "generic" => Ok(WireFormat::Generic),
            other => Err(RelayError::ConfigError(format!(
                "unknown wire format '{}', expected 'named' or 'generic'",
                other
            ))),
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireFormat::Named => f.write_str("named"),
            WireFormat::Generic => f.write_str("generic"),
        }
    }
}

/// Stateless JSON encoder bound to a wire format
#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer {
    format: WireFormat,
}

impl Serializer {
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Encode an envelope in this deployment's format. Named envelopes are
    /// converted to their generic layout in generic mode, and generic
    /// envelopes are read back into their named record in named mode.
    pub fn encode(&self, envelope: &Envelope) -> Result<Payload> {
        let json = match (self.format, envelope) {
            (WireFormat::Generic, Envelope::Generic(generic)) => serde_json::to_string(generic),
            (WireFormat::Generic, named) => serde_json::to_string(&named.to_generic()),
            (WireFormat::Named, Envelope::Generic(generic)) => {
                let named = generic
                    .to_named()
                    .map_err(|e| RelayError::Serialization(e.to_string()))?;
                return self.encode(&named);
            }
            (WireFormat::Named, Envelope::Chat(chat)) => serde_json::to_string(chat),
            (WireFormat::Named, Envelope::Notification(notification)) => {
                serde_json::to_string(notification)
            }
            (WireFormat::Named, Envelope::EmoteWall(emote)) => serde_json::to_string(emote),
        }
        .map_err(|e| RelayError::Serialization(e.to_string()))?;

        Ok(Payload::from(json))
    }

    /// Parse a payload produced by [`Serializer::encode`] for `category`
    pub fn decode(&self, category: Category, payload: &str) -> Result<Envelope> {
        match self.format {
            WireFormat::Generic => {
                let generic: GenericEnvelope = serde_json::from_str(payload)?;
                if generic.category() != category {
                    return Err(RelayError::MessageParseError(format!(
                        "expected {} payload, got {}",
                        category,
                        generic.category()
                    )));
                }
                Ok(Envelope::Generic(generic))
            }
            WireFormat::Named => {
                let envelope = match category {
                    Category::Chat => {
                        Envelope::Chat(serde_json::from_str::<ChatMessage>(payload)?)
                    }
                    Category::Notification => {
                        Envelope::Notification(serde_json::from_str::<Notification>(payload)?)
                    }
                    Category::EmoteWall => {
                        Envelope::EmoteWall(serde_json::from_str::<Emote>(payload)?)
                    }
                };
                Ok(envelope)
            }
        }
    }
}
