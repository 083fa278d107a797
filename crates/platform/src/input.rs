//! Multi-touch input abstraction
//!
//! A [`TouchSink`] is the consumer side of a touch controller: the input
//! subsystem on Linux, a UI event queue on bare metal. Drivers report slot
//! states for one scan and then commit them with [`TouchSink::sync_frame`].

/// State of one contact slot within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    /// No finger in this slot.
    Released,
    /// Finger down at the given position (controller units).
    Contact {
        /// Horizontal position
        x: u16,
        /// Vertical position
        y: u16,
    },
}

/// What a driver announces when it registers with a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchCapabilities {
    /// Human readable device name
    pub name: &'static str,
    /// Physical path
    pub phys: &'static str,
    /// Number of contact slots
    pub slots: u8,
    /// Largest X coordinate
    pub x_max: u32,
    /// Largest Y coordinate
    pub y_max: u32,
    /// Touchscreen (true) rather than touchpad
    pub direct: bool,
    /// The driver only reports active slots; the sink must release the rest
    /// at every frame sync.
    pub drop_unused: bool,
    /// Contact size reported with every `Contact`, for both the touch-major
    /// and width-major axes. `None` when the axes are not declared.
    pub touch_major: Option<u8>,
}

/// Slot-based multi-touch event consumer.
pub trait TouchSink {
    /// Error type
    type Error: core::fmt::Debug;

    /// Announce the device. Called once, before any report.
    fn register(&mut self, caps: &TouchCapabilities) -> Result<(), Self::Error>;

    /// Update one slot for the frame being built.
    fn report_slot(&mut self, slot: u8, state: SlotState);

    /// Commit every slot update since the previous sync as one frame.
    fn sync_frame(&mut self);
}

/// Adds "drop unused" semantics to a sink that lacks them.
///
/// Slots that were in contact in the previous frame but were not reported in
/// contact in this one are released just before the inner sync. Slots 32 and
/// above are passed through untracked.
pub struct DropUnusedSlots<K> {
    inner: K,
    previous: u32,
    current: u32,
}

impl<K> DropUnusedSlots<K> {
    /// Wrap a sink.
    pub const fn new(inner: K) -> Self {
        Self {
            inner,
            previous: 0,
            current: 0,
        }
    }

    /// Borrow the wrapped sink.
    pub fn inner(&self) -> &K {
        &self.inner
    }

    /// Unwrap the sink.
    pub fn into_inner(self) -> K {
        self.inner
    }
}

fn slot_bit(slot: u8) -> u32 {
    1u32.checked_shl(u32::from(slot)).unwrap_or(0)
}

impl<K: TouchSink> TouchSink for DropUnusedSlots<K> {
    type Error = K::Error;

    fn register(&mut self, caps: &TouchCapabilities) -> Result<(), Self::Error> {
        self.previous = 0;
        self.current = 0;
        self.inner.register(caps)
    }

    fn report_slot(&mut self, slot: u8, state: SlotState) {
        match state {
            SlotState::Contact { .. } => self.current |= slot_bit(slot),
            SlotState::Released => self.current &= !slot_bit(slot),
        }
        self.inner.report_slot(slot, state);
    }

    fn sync_frame(&mut self) {
        let stale = self.previous & !self.current;
        for slot in 0..u32::BITS {
            if stale & 1u32.wrapping_shl(slot) != 0 {
                if let Ok(slot) = u8::try_from(slot) {
                    self.inner.report_slot(slot, SlotState::Released);
                }
            }
        }
        self.previous = self.current;
        self.current = 0;
        self.inner.sync_frame();
    }
}
