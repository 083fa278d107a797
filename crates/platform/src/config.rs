//! Device configuration lookup
//!
//! Drivers read their board description once, at attach time, from a
//! [`PropertySource`]. On Linux-style boards this is the device-tree node of
//! the controller; on bare-metal boards it is usually a `static` table.
//!
//! Property names follow the upstream device-tree bindings so the same board
//! description can be shared between firmware and kernel builds.

use thiserror::Error;

/// Bus address of the controller (7-bit I²C address).
pub const PROP_REG: &str = "reg";
/// Horizontal resolution of the touch surface in controller units.
pub const PROP_SIZE_X: &str = "touchscreen-size-x";
/// Vertical resolution of the touch surface in controller units.
pub const PROP_SIZE_Y: &str = "touchscreen-size-y";

/// Largest valid 7-bit bus address.
const MAX_7BIT_ADDRESS: u32 = 0x7F;

/// Read-only access to a device description.
pub trait PropertySource {
    /// Model identifier ("compatible" string), e.g. `"mstar,msg2638"`.
    fn compatible(&self) -> Option<&str>;

    /// Read a `u32` property. `None` when the property is absent.
    fn read_u32(&self, name: &str) -> Option<u32>;
}

/// Configuration errors. All of them are fatal at attach time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No model identifier in the description.
    #[error("device description has no compatible string")]
    MissingCompatible,
    /// Model identifier present but not supported by the driver.
    #[error("unsupported device model")]
    UnknownModel,
    /// A required property is absent.
    #[error("missing property {0}")]
    MissingProperty(&'static str),
    /// A property is present but out of range.
    #[error("invalid value {value} for property {name}")]
    InvalidProperty {
        /// Property name
        name: &'static str,
        /// Value found
        value: u32,
    },
    /// Screen width or height is zero.
    #[error("invalid screen geometry {width}x{height}")]
    InvalidGeometry {
        /// Width read from configuration
        width: u32,
        /// Height read from configuration
        height: u32,
    },
}

/// Touch surface size, both dimensions non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScreenGeometry {
    width: u32,
    height: u32,
}

impl ScreenGeometry {
    /// Validate a width/height pair.
    pub const fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidGeometry { width, height });
        }
        Ok(Self { width, height })
    }

    /// Read `touchscreen-size-x` / `touchscreen-size-y`.
    ///
    /// A missing property counts as zero, so it is reported as
    /// [`ConfigError::InvalidGeometry`] like an explicit zero.
    pub fn from_properties<P: PropertySource + ?Sized>(props: &P) -> Result<Self, ConfigError> {
        let width = props.read_u32(PROP_SIZE_X).unwrap_or(0);
        let height = props.read_u32(PROP_SIZE_Y).unwrap_or(0);
        Self::new(width, height)
    }

    /// Width in controller units.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in controller units.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Largest reportable X coordinate.
    pub const fn x_max(&self) -> u32 {
        self.width.saturating_sub(1)
    }

    /// Largest reportable Y coordinate.
    pub const fn y_max(&self) -> u32 {
        self.height.saturating_sub(1)
    }
}

/// Read and validate the 7-bit bus address from `reg`.
pub fn bus_address<P: PropertySource + ?Sized>(props: &P) -> Result<u8, ConfigError> {
    let reg = props
        .read_u32(PROP_REG)
        .ok_or(ConfigError::MissingProperty(PROP_REG))?;
    if reg > MAX_7BIT_ADDRESS {
        return Err(ConfigError::InvalidProperty {
            name: PROP_REG,
            value: reg,
        });
    }
    u8::try_from(reg).map_err(|_| ConfigError::InvalidProperty {
        name: PROP_REG,
        value: reg,
    })
}
