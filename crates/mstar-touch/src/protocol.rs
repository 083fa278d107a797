//! Raw touch-data frame codec.
//!
//! The controller answers every interrupt with one fixed-size frame:
//!
//! ```text
//! +------+----------------+-----+----------------+-----------+----------+
//! | mode | finger 0 (4 B) | ... | finger N-1     | proximity | checksum |
//! +------+----------------+-----+----------------+-----------+----------+
//!
//! finger record:  xy_hi | x_lo | y_lo | pressure
//!                 xy_hi = x[11:8] << 4 | y[11:8]
//! ```
//!
//! `checksum` is the two's complement of the byte sum of everything before
//! it. A record whose three position bytes are all `0xFF` is an empty slot;
//! that makes `(4095, 4095)` unrepresentable.
//!
//! Everything here is pure and allocation-free.

use heapless::Vec;

use crate::error::DecodeError;
use crate::profile::{DeviceProfile, FINGER_RECORD_LEN, MAX_FINGERS};

/// Position byte value marking an empty slot.
pub const INACTIVE: u8 = 0xFF;

/// Largest coordinate a record can carry (12 bits).
pub const COORD_MAX: u16 = 0x0FFF;

/// One finger, decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchPoint {
    /// Slot index (record position in the frame)
    pub slot: u8,
    /// Horizontal position, 0..=4095
    pub x: u16,
    /// Vertical position, 0..=4095
    pub y: u16,
}

/// Decoded fingers in ascending slot order.
pub type TouchPoints = Vec<TouchPoint, MAX_FINGERS>;

/// 4-byte per-slot record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FingerRecord {
    /// High nibbles: X in bits 4..7, Y in bits 0..3
    pub xy_hi: u8,
    /// X low byte
    pub x_lo: u8,
    /// Y low byte
    pub y_lo: u8,
    /// Pressure as reported by the controller (not interpreted)
    pub pressure: u8,
}

impl FingerRecord {
    /// Parse a record.
    pub const fn from_bytes(bytes: [u8; FINGER_RECORD_LEN]) -> Self {
        let [xy_hi, x_lo, y_lo, pressure] = bytes;
        Self {
            xy_hi,
            x_lo,
            y_lo,
            pressure,
        }
    }

    /// Serialise a record.
    pub const fn to_bytes(self) -> [u8; FINGER_RECORD_LEN] {
        [self.xy_hi, self.x_lo, self.y_lo, self.pressure]
    }

    /// Empty slot record.
    pub const fn inactive(pressure: u8) -> Self {
        Self {
            xy_hi: INACTIVE,
            x_lo: INACTIVE,
            y_lo: INACTIVE,
            pressure,
        }
    }

    /// Record for a finger at `(x, y)`. Coordinates are truncated to 12 bits.
    #[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
    pub const fn contact(x: u16, y: u16, pressure: u8) -> Self {
        let x = x & COORD_MAX;
        let y = y & COORD_MAX;
        Self {
            xy_hi: (((x >> 4) & 0xF0) | ((y >> 8) & 0x0F)) as u8,
            x_lo: x as u8,
            y_lo: y as u8,
            pressure,
        }
    }

    /// Whether this record marks an empty slot. Pressure is ignored.
    pub const fn is_inactive(&self) -> bool {
        self.xy_hi == INACTIVE && self.x_lo == INACTIVE && self.y_lo == INACTIVE
    }

    /// Finger position, `None` for an empty slot.
    #[allow(clippy::arithmetic_side_effects)] // shifts of masked nibbles stay below 0x1000
    pub const fn position(&self) -> Option<(u16, u16)> {
        if self.is_inactive() {
            return None;
        }
        let hi = self.xy_hi as u16;
        let x = ((hi & 0xF0) << 4) | self.x_lo as u16;
        let y = ((hi & 0x0F) << 8) | self.y_lo as u16;
        Some((x, y))
    }
}

/// Length-checked view over a raw frame.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    mode: u8,
    records: &'a [u8],
    proximity: u8,
    checksum: u8,
    covered: &'a [u8],
}

impl<'a> RawFrame<'a> {
    /// Split `bytes` into fields. Fails unless the length matches `profile`.
    pub fn new(bytes: &'a [u8], profile: &DeviceProfile) -> Result<Self, DecodeError> {
        let length_error = DecodeError::Length {
            expected: profile.frame_len(),
            found: bytes.len(),
        };
        if bytes.len() != profile.frame_len() {
            return Err(length_error);
        }
        let (&checksum, covered) = bytes.split_last().ok_or(length_error)?;
        let (&mode, rest) = covered.split_first().ok_or(length_error)?;
        let (&proximity, records) = rest.split_last().ok_or(length_error)?;
        Ok(Self {
            mode,
            records,
            proximity,
            checksum,
            covered,
        })
    }

    /// Frame type tag.
    pub fn mode(&self) -> u8 {
        self.mode
    }

    /// Finger records in slot order.
    pub fn records(&self) -> impl Iterator<Item = FingerRecord> + 'a {
        self.records
            .chunks_exact(FINGER_RECORD_LEN)
            .filter_map(|chunk| <[u8; FINGER_RECORD_LEN]>::try_from(chunk).ok())
            .map(FingerRecord::from_bytes)
    }

    /// Proximity byte (carried, not interpreted).
    pub fn proximity(&self) -> u8 {
        self.proximity
    }

    /// Checksum byte as received.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Bytes covered by the checksum (everything but the checksum byte).
    pub fn covered(&self) -> &'a [u8] {
        self.covered
    }
}

/// Two's complement of the byte sum, truncated to 8 bits.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |sum, byte| sum.wrapping_add(*byte))
        .wrapping_neg()
}

/// Validate and decode one raw frame.
///
/// The frame is rejected as a whole on a wrong length, a foreign mode byte
/// or a bad checksum; no partial point list is ever returned.
pub fn decode(buffer: &[u8], profile: &DeviceProfile) -> Result<TouchPoints, DecodeError> {
    let frame = RawFrame::new(buffer, profile)?;

    if frame.mode() != profile.expected_mode {
        return Err(DecodeError::ModeMismatch {
            expected: profile.expected_mode,
            found: frame.mode(),
        });
    }

    let expected = checksum(frame.covered());
    if expected != frame.checksum() {
        return Err(DecodeError::ChecksumMismatch {
            expected,
            found: frame.checksum(),
        });
    }

    let mut points = TouchPoints::new();
    for (slot, record) in (0u8..).zip(frame.records().take(MAX_FINGERS)) {
        if let Some((x, y)) = record.position() {
            // Cannot overflow: at most MAX_FINGERS records are visited.
            let _ = points.push(TouchPoint { slot, x, y });
        }
    }
    Ok(points)
}

/// Build a valid frame for `points` into `out`; returns the frame length.
///
/// Slots without a point are written as empty records. Points whose slot is
/// outside the profile are ignored. Used by host-side emulation.
pub fn encode(
    points: &[TouchPoint],
    profile: &DeviceProfile,
    proximity: u8,
    out: &mut [u8],
) -> Result<usize, DecodeError> {
    let len = profile.frame_len();
    let found = out.len();
    let frame = out.get_mut(..len).ok_or(DecodeError::Length {
        expected: len,
        found,
    })?;

    let (mode, rest) = frame.split_first_mut().ok_or(DecodeError::Length {
        expected: len,
        found: 0,
    })?;
    *mode = profile.expected_mode;

    let mut records = rest.chunks_exact_mut(FINGER_RECORD_LEN);
    for (slot, chunk) in (0u8..).zip(records.by_ref().take(usize::from(profile.max_fingers))) {
        let record = points
            .iter()
            .find(|point| point.slot == slot)
            .map_or(FingerRecord::inactive(0), |point| {
                FingerRecord::contact(point.x, point.y, 0)
            });
        chunk.copy_from_slice(&record.to_bytes());
    }

    let tail = records.into_remainder();
    if let [prox, _checksum] = tail {
        *prox = proximity;
    }
    let sum = checksum(frame.get(..len.saturating_sub(1)).unwrap_or(&[]));
    if let Some(last) = frame.last_mut() {
        *last = sum;
    }
    Ok(len)
}
