//! Supported controller models and their timing/protocol constants.
//!
//! | Model   | Fingers | Raw mode | Chip on | Firmware on | Reset pulse      |
//! |---------|---------|----------|---------|-------------|------------------|
//! | msg2238 | 2       | `0x62`   | 10 ms   | 20 ms       | 10 000–11 000 µs |
//! | msg2638 | 5       | `0x5A`   | 15 ms   | 50 ms       | 10 000–11 000 µs |

/// Upper bound on `max_fingers` for any profile.
pub const MAX_FINGERS: usize = 10;

/// Bytes per finger record in a raw frame.
pub const FINGER_RECORD_LEN: usize = 4;

/// Mode byte + records + proximity byte + checksum byte, for [`MAX_FINGERS`].
pub const MAX_FRAME_LEN: usize = frame_len(MAX_FINGERS);

/// Raw frame length for `fingers` finger records.
pub const fn frame_len(fingers: usize) -> usize {
    FINGER_RECORD_LEN.saturating_mul(fingers).saturating_add(3)
}

/// Per-model constants. Selected once at attach time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceProfile {
    /// Finger records per frame (1..=10)
    pub max_fingers: u8,
    /// Mode byte tagging a raw touch-data frame
    pub expected_mode: u8,
    /// Settle time after the supplies come up
    pub power_on_delay_ms: u32,
    /// Boot time after reset is released
    pub firmware_boot_delay_ms: u32,
    /// Shortest acceptable reset pulse
    pub reset_pulse_min_us: u32,
    /// Longest acceptable reset pulse
    pub reset_pulse_max_us: u32,
}

impl DeviceProfile {
    /// Raw frame length for this profile.
    pub const fn frame_len(&self) -> usize {
        frame_len(self.max_fingers as usize)
    }

    /// Pick a reset pulse width inside the profile's range.
    ///
    /// `entropy` is reduced modulo the range width, so a uniform `entropy`
    /// gives a (near) uniform pulse.
    pub fn reset_pulse_us(&self, entropy: u32) -> u32 {
        let span = self
            .reset_pulse_max_us
            .saturating_sub(self.reset_pulse_min_us)
            .saturating_add(1);
        self.reset_pulse_min_us
            .saturating_add(entropy.checked_rem(span).unwrap_or(0))
    }
}

/// Supported controller models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Model {
    /// MStar msg2238 (2 fingers)
    Msg2238,
    /// MStar msg2638 (5 fingers)
    Msg2638,
}

const MSG2238: DeviceProfile = DeviceProfile {
    max_fingers: 2,
    expected_mode: 0x62,
    power_on_delay_ms: 10,
    firmware_boot_delay_ms: 20,
    reset_pulse_min_us: 10_000,
    reset_pulse_max_us: 11_000,
};

const MSG2638: DeviceProfile = DeviceProfile {
    max_fingers: 5,
    expected_mode: 0x5A,
    power_on_delay_ms: 15,
    firmware_boot_delay_ms: 50,
    reset_pulse_min_us: 10_000,
    reset_pulse_max_us: 11_000,
};

impl Model {
    /// Every supported model.
    pub const ALL: [Model; 2] = [Model::Msg2238, Model::Msg2638];

    /// Device-tree compatible string.
    pub const fn compatible(self) -> &'static str {
        match self {
            Self::Msg2238 => "mstar,msg2238",
            Self::Msg2638 => "mstar,msg2638",
        }
    }

    /// Look a model up by compatible string.
    pub fn from_compatible(compatible: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|model| model.compatible() == compatible)
    }

    /// Constants for this model.
    pub const fn profile(self) -> DeviceProfile {
        match self {
            Self::Msg2238 => MSG2238,
            Self::Msg2638 => MSG2638,
        }
    }
}

impl core::fmt::Display for Model {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Msg2238 => write!(f, "msg2238"),
            Self::Msg2638 => write!(f, "msg2638"),
        }
    }
}

// Every profile must fit the fixed frame buffer.
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
const _: () = {
    let mut i = 0;
    while i < Model::ALL.len() {
        let fingers = Model::ALL[i].profile().max_fingers as usize;
        assert!(fingers >= 1 && fingers <= MAX_FINGERS);
        i += 1;
    }
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_table_values() {
        let p = Model::Msg2238.profile();
        assert_eq!(p.max_fingers, 2);
        assert_eq!(p.expected_mode, 0x62);
        assert_eq!(p.power_on_delay_ms, 10);
        assert_eq!(p.firmware_boot_delay_ms, 20);
        assert_eq!((p.reset_pulse_min_us, p.reset_pulse_max_us), (10_000, 11_000));

        let p = Model::Msg2638.profile();
        assert_eq!(p.max_fingers, 5);
        assert_eq!(p.expected_mode, 0x5A);
        assert_eq!(p.power_on_delay_ms, 15);
        assert_eq!(p.firmware_boot_delay_ms, 50);
        assert_eq!((p.reset_pulse_min_us, p.reset_pulse_max_us), (10_000, 11_000));
    }

    #[test]
    fn test_from_compatible() {
        assert_eq!(Model::from_compatible("mstar,msg2238"), Some(Model::Msg2238));
        assert_eq!(Model::from_compatible("mstar,msg2638"), Some(Model::Msg2638));
        assert_eq!(Model::from_compatible("mstar,msg2138"), None);
        assert_eq!(Model::from_compatible(""), None);
    }

    #[test]
    fn test_frame_len() {
        assert_eq!(Model::Msg2238.profile().frame_len(), 11);
        assert_eq!(Model::Msg2638.profile().frame_len(), 23);
        assert_eq!(MAX_FRAME_LEN, 43);
    }

    #[test]
    fn test_reset_pulse_bounds() {
        let p = Model::Msg2238.profile();
        assert_eq!(p.reset_pulse_us(0), 10_000);
        assert_eq!(p.reset_pulse_us(1_000), 11_000);
        assert_eq!(p.reset_pulse_us(1_001), 10_000);
        assert!(p.reset_pulse_us(u32::MAX) <= 11_000);
    }

    #[test]
    fn test_degenerate_pulse_range() {
        let p = DeviceProfile {
            reset_pulse_min_us: 500,
            reset_pulse_max_us: 500,
            ..Model::Msg2638.profile()
        };
        assert_eq!(p.reset_pulse_us(12345), 500);
    }
}
