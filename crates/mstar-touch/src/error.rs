//! Error types.
//!
//! Only [`Error`] ever reaches a caller of the device API: configuration
//! problems at attach and power failures on open/resume. Per-frame errors
//! ([`FrameError`]) are logged and the frame is dropped.

use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

pub use platform::ConfigError;

/// A raw frame that must not be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Buffer length does not match the profile.
    #[error("frame is {found} bytes, expected {expected}")]
    Length {
        /// Length required by the profile
        expected: usize,
        /// Length received
        found: usize,
    },
    /// Not a raw touch-data frame.
    #[error("mode byte {found:#04x}, expected {expected:#04x}")]
    ModeMismatch {
        /// Mode byte of the active profile
        expected: u8,
        /// Mode byte received
        found: u8,
    },
    /// Frame corrupted in transit.
    #[error("checksum {found:#04x}, computed {expected:#04x}")]
    ChecksumMismatch {
        /// Checksum computed over the frame
        expected: u8,
        /// Checksum byte received
        found: u8,
    },
}

/// Why one interrupt produced no input frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The bus read did not complete.
    #[error("bus read failed: {0}")]
    Transport(ErrorKind),
    /// The frame was read but rejected.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Power sequencing step, in `start` then `stop` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerStep {
    /// Supplies on
    EnableSupplies,
    /// Reset line asserted
    AssertReset,
    /// Reset line released
    DeassertReset,
    /// Interrupt gate opened
    EnableInterrupt,
    /// Interrupt gate closed
    DisableInterrupt,
    /// Supplies off
    DisableSupplies,
}

impl core::fmt::Display for PowerStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let step = match self {
            Self::EnableSupplies => "enable supplies",
            Self::AssertReset => "assert reset",
            Self::DeassertReset => "deassert reset",
            Self::EnableInterrupt => "enable interrupt",
            Self::DisableInterrupt => "disable interrupt",
            Self::DisableSupplies => "disable supplies",
        };
        f.write_str(step)
    }
}

/// A regulator, GPIO or interrupt-gate operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("power sequencing failed at {step}")]
pub struct PowerError {
    /// First step that failed
    pub step: PowerStep,
}

impl PowerError {
    pub(crate) const fn at(step: PowerStep) -> Self {
        Self { step }
    }
}

/// Errors returned by the device API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bad or missing configuration; the device was not created.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Power-up failed; the device stays stopped.
    #[error(transparent)]
    Power(#[from] PowerError),
    /// The interrupt gate could not be closed at attach.
    #[error("interrupt line could not be disabled")]
    Interrupt,
    /// The touch sink refused the device.
    #[error("input device registration failed")]
    Registration,
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_decode_error_messages() {
        let err = DecodeError::ModeMismatch {
            expected: 0x5A,
            found: 0x01,
        };
        assert_eq!(err.to_string(), "mode byte 0x01, expected 0x5a");

        let err = FrameError::from(DecodeError::ChecksumMismatch {
            expected: 0x10,
            found: 0x11,
        });
        assert_eq!(err.to_string(), "checksum 0x11, computed 0x10");
    }

    #[test]
    fn test_power_error_message() {
        let err = Error::from(PowerError::at(PowerStep::DeassertReset));
        assert_eq!(err.to_string(), "power sequencing failed at deassert reset");
    }
}
