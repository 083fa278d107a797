//! GPIO and interrupt abstraction layer
//!
//! Provides the two control lines a touch controller needs besides its bus:
//! a reset output with board-defined polarity, and a gated "frame ready"
//! interrupt.

use core::future::Future;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::{OutputPin, PinState};

/// Electrical level that puts the controller into reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetPolarity {
    /// Reset while the pin is low (the common wiring).
    #[default]
    ActiveLow,
    /// Reset while the pin is high.
    ActiveHigh,
}

impl ResetPolarity {
    /// Pin level for a logical reset state.
    pub const fn level(self, asserted: bool) -> PinState {
        match (self, asserted) {
            (Self::ActiveLow, true) | (Self::ActiveHigh, false) => PinState::Low,
            (Self::ActiveLow, false) | (Self::ActiveHigh, true) => PinState::High,
        }
    }
}

/// Reset output with logical assert/deassert.
pub struct ResetLine<P> {
    pin: P,
    polarity: ResetPolarity,
}

impl<P: OutputPin> ResetLine<P> {
    /// Wrap an output pin. The pin level is left untouched.
    pub fn new(pin: P, polarity: ResetPolarity) -> Self {
        Self { pin, polarity }
    }

    /// Drive the logical reset state.
    pub fn set(&mut self, asserted: bool) -> Result<(), P::Error> {
        self.pin.set_state(self.polarity.level(asserted))
    }

    /// Hold the controller in reset.
    pub fn assert(&mut self) -> Result<(), P::Error> {
        self.set(true)
    }

    /// Release the controller from reset.
    pub fn deassert(&mut self) -> Result<(), P::Error> {
        self.set(false)
    }

    /// Configured polarity.
    pub fn polarity(&self) -> ResetPolarity {
        self.polarity
    }

    /// Give the pin back.
    pub fn release(self) -> P {
        self.pin
    }
}

/// Gated "frame ready" interrupt.
///
/// Methods take `&self`: the gate is shared between the context that powers
/// the controller (enable/disable) and the task that services it (wait).
pub trait InterruptLine {
    /// Error type
    type Error: core::fmt::Debug;

    /// Start delivering notifications.
    fn enable(&self) -> Result<(), Self::Error>;

    /// Stop delivering notifications and drop any pending one.
    fn disable(&self) -> Result<(), Self::Error>;

    /// Whether notifications are currently delivered.
    fn is_enabled(&self) -> bool;

    /// Wait for the next notification.
    fn wait_for_frame(&self) -> impl Future<Output = ()>;
}

/// Software interrupt gate fed by the board's ISR or EXTI task.
///
/// Starts disabled: notifications raised before [`InterruptLine::enable`]
/// are discarded, so a controller that is still booting cannot trigger a
/// read.
pub struct IrqLine<M: RawMutex> {
    enabled: AtomicBool,
    pending: Signal<M, ()>,
}

impl<M: RawMutex> IrqLine<M> {
    /// Create a disabled gate.
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            pending: Signal::new(),
        }
    }

    /// Raise a notification (call from the interrupt handler).
    ///
    /// Returns `false` when the gate is disabled and the edge was discarded.
    pub fn notify(&self) -> bool {
        if !self.enabled.load(Ordering::Acquire) {
            return false;
        }
        self.pending.signal(());
        true
    }
}

impl<M: RawMutex> Default for IrqLine<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> InterruptLine for IrqLine<M> {
    type Error = core::convert::Infallible;

    fn enable(&self) -> Result<(), Self::Error> {
        // A notify that passed the gate check before the last disable may
        // have signalled after its reset.
        self.pending.reset();
        self.enabled.store(true, Ordering::Release);
        Ok(())
    }

    fn disable(&self) -> Result<(), Self::Error> {
        self.enabled.store(false, Ordering::Release);
        self.pending.reset();
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    async fn wait_for_frame(&self) {
        self.pending.wait().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use core::time::Duration;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};

    #[test]
    fn test_active_low_reset_levels() {
        let expectations = [
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ];
        let mut reset = ResetLine::new(PinMock::new(&expectations), ResetPolarity::ActiveLow);
        reset.assert().unwrap();
        reset.deassert().unwrap();
        reset.release().done();
    }

    #[test]
    fn test_active_high_reset_levels() {
        let expectations = [
            PinTransaction::set(State::High),
            PinTransaction::set(State::Low),
        ];
        let mut reset = ResetLine::new(PinMock::new(&expectations), ResetPolarity::ActiveHigh);
        reset.assert().unwrap();
        reset.deassert().unwrap();
        reset.release().done();
    }

    #[test]
    fn test_irq_line_starts_disabled() {
        let irq: IrqLine<NoopRawMutex> = IrqLine::new();
        assert!(!irq.is_enabled());
        assert!(!irq.notify(), "edge before enable must be discarded");
    }

    #[tokio::test]
    async fn test_irq_line_delivers_when_enabled() {
        let irq: IrqLine<NoopRawMutex> = IrqLine::new();
        irq.enable().unwrap();
        assert!(irq.notify());
        tokio::time::timeout(Duration::from_millis(100), irq.wait_for_frame())
            .await
            .expect("notification should be delivered");
    }

    #[tokio::test]
    async fn test_irq_line_disable_drops_pending() {
        let irq: IrqLine<NoopRawMutex> = IrqLine::new();
        irq.enable().unwrap();
        assert!(irq.notify());
        irq.disable().unwrap();
        let waited = tokio::time::timeout(Duration::from_millis(20), irq.wait_for_frame()).await;
        assert!(waited.is_err(), "pending edge must not survive disable");
    }

    /// An edge that slipped past the gate while it was being disabled does
    /// not fire after the next enable.
    #[tokio::test]
    async fn test_irq_line_enable_drops_late_edge() {
        let irq: IrqLine<NoopRawMutex> = IrqLine::new();
        irq.enable().unwrap();
        irq.disable().unwrap();
        // ISR checked the gate before disable, signals after it.
        irq.pending.signal(());

        irq.enable().unwrap();
        let waited = tokio::time::timeout(Duration::from_millis(20), irq.wait_for_frame()).await;
        assert!(waited.is_err(), "late edge must not survive re-enable");

        assert!(irq.notify());
        tokio::time::timeout(Duration::from_millis(100), irq.wait_for_frame())
            .await
            .unwrap();
    }
}
