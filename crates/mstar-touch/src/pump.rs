//! Per-interrupt frame handling: one read, one decode, one sync.

use embedded_hal::i2c::Error as _;
use embedded_hal_async::i2c::I2c;
use platform::{SlotState, TouchSink};

use crate::error::{DecodeError, FrameError};
use crate::profile::{DeviceProfile, MAX_FRAME_LEN};
use crate::protocol;

/// Reads frames from the controller and feeds them to a [`TouchSink`].
///
/// Owns the frame buffer, so no allocation happens per interrupt. Only
/// slots carrying a contact are reported; the sink is expected to release
/// slots missing from a frame (see [`platform::DropUnusedSlots`]).
pub struct EventPump<B, K> {
    address: u8,
    profile: DeviceProfile,
    buf: [u8; MAX_FRAME_LEN],
    bus: B,
    sink: K,
}

impl<B: I2c, K: TouchSink> EventPump<B, K> {
    /// Create a pump reading from `address` on `bus`.
    pub fn new(bus: B, sink: K, address: u8, profile: DeviceProfile) -> Self {
        Self {
            address,
            profile,
            buf: [0; MAX_FRAME_LEN],
            bus,
            sink,
        }
    }

    /// 7-bit bus address of the controller.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The sink frames are reported to.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Give back the bus and the sink.
    pub fn release(self) -> (B, K) {
        (self.bus, self.sink)
    }

    /// Handle one "frame ready" interrupt.
    ///
    /// Returns the number of contacts reported. On error nothing reaches
    /// the sink; the error is logged here and needs no further handling.
    pub async fn handle_interrupt(&mut self) -> Result<usize, FrameError> {
        let len = self.profile.frame_len();
        let frame = self.buf.get_mut(..len).ok_or(DecodeError::Length {
            expected: len,
            found: MAX_FRAME_LEN,
        })?;

        if let Err(err) = self.bus.read(self.address, frame).await {
            let kind = err.kind();
            warn!("touch frame read failed: {}", kind);
            return Err(FrameError::Transport(kind));
        }

        let points = match protocol::decode(frame, &self.profile) {
            Ok(points) => points,
            Err(err @ DecodeError::ModeMismatch { .. }) => {
                trace!("ignoring frame: {}", err);
                return Err(err.into());
            }
            Err(err) => {
                warn!("dropping touch frame: {}", err);
                return Err(err.into());
            }
        };

        for point in points.iter() {
            self.sink.report_slot(
                point.slot,
                SlotState::Contact {
                    x: point.x,
                    y: point.y,
                },
            );
        }
        self.sink.sync_frame();
        Ok(points.len())
    }
}
