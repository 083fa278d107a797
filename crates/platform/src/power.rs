//! Power rail abstraction
//!
//! Touch controllers usually have a core and an I/O rail that must be
//! switched together. [`SupplyBank`] is the "bulk regulator" view of those
//! rails; [`SwitchedSupplies`] implements it for boards that gate each rail
//! through a GPIO-controlled load switch.

use core::future::Future;

use embedded_hal::digital::OutputPin;
use thiserror::Error;

/// A set of supplies enabled and disabled as one unit.
pub trait SupplyBank {
    /// Error type
    type Error: core::fmt::Debug;

    /// Enable every supply. On error no supply is left enabled.
    fn enable_all(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    /// Disable every supply, continuing past failures.
    fn disable_all(&mut self) -> impl Future<Output = Result<(), Self::Error>>;
}

/// One rail in a [`SwitchedSupplies`] bank failed to switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("supply {name} (#{index}) failed to switch")]
pub struct SupplyError<E: core::fmt::Debug> {
    /// Position of the rail in the bank
    pub index: usize,
    /// Rail name
    pub name: &'static str,
    /// Pin error
    pub cause: E,
}

/// Rails gated by active-high load-switch enable pins.
///
/// Rails are enabled in array order and disabled in reverse order.
pub struct SwitchedSupplies<P, const N: usize> {
    switches: [(&'static str, P); N],
}

impl<P: OutputPin, const N: usize> SwitchedSupplies<P, N> {
    /// Build a bank from `(name, enable pin)` pairs.
    pub const fn new(switches: [(&'static str, P); N]) -> Self {
        Self { switches }
    }

    /// Rail names in enable order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.switches.iter().map(|(name, _)| *name)
    }

    /// Give the pins back.
    pub fn release(self) -> [(&'static str, P); N] {
        self.switches
    }

    fn roll_back(&mut self, enabled: usize) {
        for (_, pin) in self.switches.iter_mut().take(enabled).rev() {
            // Best effort: the enable error is the one worth reporting.
            let _ = pin.set_low();
        }
    }
}

impl<P: OutputPin, const N: usize> SupplyBank for SwitchedSupplies<P, N> {
    type Error = SupplyError<P::Error>;

    async fn enable_all(&mut self) -> Result<(), Self::Error> {
        for index in 0..N {
            let Some((name, pin)) = self.switches.get_mut(index) else {
                break;
            };
            let name = *name;
            if let Err(cause) = pin.set_high() {
                self.roll_back(index);
                return Err(SupplyError { index, name, cause });
            }
        }
        Ok(())
    }

    async fn disable_all(&mut self) -> Result<(), Self::Error> {
        let mut first = None;
        for (index, (name, pin)) in self.switches.iter_mut().enumerate().rev() {
            if let Err(cause) = pin.set_low() {
                first.get_or_insert(SupplyError {
                    index,
                    name: *name,
                    cause,
                });
            }
        }
        first.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{Call, CallLog, MockPin};
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};

    #[tokio::test]
    async fn test_switched_supplies_cycle() {
        let on_off = [
            PinTransaction::set(State::High),
            PinTransaction::set(State::Low),
        ];
        let mut supplies =
            SwitchedSupplies::new([("vdd", PinMock::new(&on_off)), ("vddio", PinMock::new(&on_off))]);
        supplies.enable_all().await.unwrap();
        supplies.disable_all().await.unwrap();
        for (_, mut pin) in supplies.release() {
            pin.done();
        }
    }

    #[tokio::test]
    async fn test_enable_order_and_reverse_disable() {
        let log = CallLog::new();
        let mut supplies = SwitchedSupplies::new([
            ("vdd", MockPin::new("vdd", &log)),
            ("vddio", MockPin::new("vddio", &log)),
        ]);
        supplies.enable_all().await.unwrap();
        supplies.disable_all().await.unwrap();
        assert_eq!(
            log.calls(),
            [
                Call::Pin("vdd", true),
                Call::Pin("vddio", true),
                Call::Pin("vddio", false),
                Call::Pin("vdd", false),
            ]
        );
    }

    #[tokio::test]
    async fn test_enable_failure_rolls_back() {
        let log = CallLog::new();
        let vddio = MockPin::new("vddio", &log);
        vddio.fail_next();
        let mut supplies =
            SwitchedSupplies::new([("vdd", MockPin::new("vdd", &log)), ("vddio", vddio)]);

        let err = supplies.enable_all().await.unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.name, "vddio");
        assert_eq!(
            log.calls(),
            [Call::Pin("vdd", true), Call::Pin("vdd", false)],
            "vdd must be switched back off"
        );
    }

    #[tokio::test]
    async fn test_disable_continues_past_failure() {
        let log = CallLog::new();
        let vddio = MockPin::new("vddio", &log);
        let mut supplies =
            SwitchedSupplies::new([("vdd", MockPin::new("vdd", &log)), ("vddio", vddio.clone())]);
        supplies.enable_all().await.unwrap();
        log.clear();

        vddio.fail_next();
        let err = supplies.disable_all().await.unwrap_err();
        assert_eq!(err.name, "vddio");
        assert_eq!(log.calls(), [Call::Pin("vdd", false)]);
    }
}
