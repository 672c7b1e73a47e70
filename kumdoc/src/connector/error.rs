//! Error types for the connector module

use std::fmt;
use thiserror::Error;

/// Lifecycle state of a [`Connector`](super::Connector)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectorState {
    /// No channel
    #[default]
    Disconnected,
    /// Waiting for a peer that will connect to our key
    Listening,
    /// Connected to a listening peer
    Connected,
    /// Flushing outbound frames before teardown
    Draining,
}

impl ConnectorState {
    /// Whether frames may be sent and received in this state
    pub fn is_active(self) -> bool {
        matches!(self, Self::Listening | Self::Connected)
    }
}

impl fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Listening => write!(f, "listening"),
            Self::Connected => write!(f, "connected"),
            Self::Draining => write!(f, "draining"),
        }
    }
}

/// Errors raised by the connector and its transports
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("No reply before the deadline")]
    Timeout,

    #[error("Call cancelled")]
    Cancelled,

    #[error("Peer closed the channel")]
    Disconnected,

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: ConnectorState,
    },

    #[error("No request from the peer is waiting for a reply")]
    NoPendingRequest,

    #[error("No process is listening for key {0}")]
    NoPeer(u32),

    #[error("Key {0} is already being listened for")]
    KeyInUse(u32),

    #[error("Malformed frame: {0}")]
    Codec(#[from] serde_json::Error),
}
