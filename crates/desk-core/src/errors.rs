//! Decode failure taxonomy for inbound frames.
//!
//! Every failure here is non-fatal by design: the dispatcher logs the error,
//! discards the frame, and leaves connection and session state untouched.

use thiserror::Error;

/// Why an inbound frame could not be turned into a typed message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame was not valid JSON, or a known variant failed shape
    /// validation.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The frame parsed as JSON but carried no `type` discriminator.
    #[error("frame has no `type` field")]
    MissingType,

    /// The `type` discriminator is not one we know. Forward-compatible:
    /// future server message types must never crash the client.
    #[error("unknown message type `{0}`")]
    UnknownType(String),
}

impl ProtocolError {
    /// Whether this frame should be dropped silently (unknown future type)
    /// rather than logged as a protocol violation.
    #[must_use]
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_is_flagged() {
        assert!(ProtocolError::UnknownType("market_halt".into()).is_unknown_type());
        assert!(!ProtocolError::MissingType.is_unknown_type());
        assert!(!ProtocolError::Malformed("bad".into()).is_unknown_type());
    }

    #[test]
    fn display_includes_type_name() {
        let e = ProtocolError::UnknownType("market_halt".into());
        assert!(e.to_string().contains("market_halt"));
    }
}
