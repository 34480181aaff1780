use core::fmt;

/// Errors of the LED strip stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripError {
    /// The pixel buffer or the pulse frame could not be reserved
    AllocationError,
    /// Pixel index outside the strip
    IndexOutOfRange,
    /// RMT channel or output pin is already claimed
    ResourceUnavailable,
    /// Bit count, timing or family does not fit the channel
    InvalidConfiguration,
    /// Used before the channel was initialized or the protocol bound
    NotConfigured,
    /// The peripheral reported an error while emitting the frame
    TransmissionFailure,
}

impl StripError {
    /// Transient errors can be retried by pushing the current buffer again.
    pub const fn is_transient(self) -> bool {
        matches!(self, StripError::TransmissionFailure)
    }
}

impl fmt::Display for StripError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            StripError::AllocationError => "pixel memory cannot be reserved",
            StripError::IndexOutOfRange => "pixel index out of range",
            StripError::ResourceUnavailable => "channel or pin already claimed",
            StripError::InvalidConfiguration => "invalid channel configuration",
            StripError::NotConfigured => "protocol not configured",
            StripError::TransmissionFailure => "transmission failed",
        };
        f.write_str(message)
    }
}

impl core::error::Error for StripError {}
