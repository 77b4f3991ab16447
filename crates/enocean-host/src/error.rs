//! Error types for host operations.
//!
//! Flow errors from [`enocean_core`] pass through unchanged; the host adds
//! failures of its own bookkeeping and of discovery sources.

use enocean_core::FlowId;

/// Result type alias for host operations.
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors that can occur while hosting setup flows.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A flow rejected a start or step.
    #[error("Flow error: {0}")]
    Core(#[from] enocean_core::Error),

    /// No flow with this ID is in progress.
    #[error("Flow not found: {0}")]
    FlowNotFound(FlowId),

    /// The discovery source stopped delivering devices.
    #[error("Discovery source closed")]
    DiscoveryClosed,

    /// USB enumeration failed.
    #[error("USB error: {message}")]
    Usb { message: String },
}

impl HostError {
    /// Create a new USB error.
    pub fn usb(message: impl Into<String>) -> Self {
        Self::Usb {
            message: message.into(),
        }
    }
}

#[cfg(feature = "hardware-usb")]
impl From<rusb::Error> for HostError {
    fn from(err: rusb::Error) -> Self {
        Self::usb(err.to_string())
    }
}
