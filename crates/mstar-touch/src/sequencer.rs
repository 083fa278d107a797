//! Controller power sequencing.
//!
//! ## Power-up
//! ```text
//! supplies on -> chip-on delay -> reset asserted -> pulse -> reset released
//!             -> firmware boot delay -> interrupt enabled
//! ```
//!
//! ## Power-down
//! ```text
//! interrupt disabled -> supplies off
//! ```
//!
//! The interrupt gate is the last thing opened and the first thing closed, so
//! the event pump never reads from a chip that is booting or losing power.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use platform::{InterruptLine, ResetLine, SupplyBank};

use crate::error::{PowerError, PowerStep};
use crate::profile::DeviceProfile;

const DEFAULT_SEED: u32 = 0x2545_F491;

/// Board resources driven by the [`PowerSequencer`].
pub struct PowerHandles<S, P, D> {
    /// Controller supply rails
    pub supplies: S,
    /// Reset GPIO
    pub reset: ResetLine<P>,
    /// Delay source (`embassy_time::Delay` on hardware)
    pub delay: D,
}

/// Symmetric start/stop over supplies, reset line and interrupt gate.
///
/// Callers serialise `start` and `stop`; the session controller does this
/// with its lock.
pub struct PowerSequencer<S, P, D> {
    profile: DeviceProfile,
    hw: PowerHandles<S, P, D>,
    seed: u32,
}

impl<S, P, D> PowerSequencer<S, P, D>
where
    S: SupplyBank,
    P: OutputPin,
    D: DelayNs,
{
    /// Create a sequencer for `profile`.
    pub fn new(profile: DeviceProfile, hw: PowerHandles<S, P, D>) -> Self {
        Self::with_seed(profile, hw, DEFAULT_SEED)
    }

    /// Create a sequencer with a specific reset-pulse seed (e.g. from a
    /// hardware RNG). A zero seed is replaced by a fixed non-zero one.
    pub fn with_seed(profile: DeviceProfile, hw: PowerHandles<S, P, D>, seed: u32) -> Self {
        Self {
            profile,
            hw,
            seed: if seed == 0 { DEFAULT_SEED } else { seed },
        }
    }

    /// Active profile.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Give the board resources back.
    pub fn release(self) -> PowerHandles<S, P, D> {
        self.hw
    }

    // xorshift32
    fn next_pulse_us(&mut self) -> u32 {
        let mut x = self.seed;
        x ^= x.wrapping_shl(13);
        x ^= x.wrapping_shr(17);
        x ^= x.wrapping_shl(5);
        self.seed = x;
        self.profile.reset_pulse_us(x)
    }

    /// Bring the controller up and open the interrupt gate.
    ///
    /// Stops at the first failing step. If the supplies were already on
    /// they are switched off again before returning.
    pub async fn start<Q: InterruptLine>(&mut self, irq: &Q) -> Result<(), PowerError> {
        self.hw
            .supplies
            .enable_all()
            .await
            .map_err(|_| PowerError::at(PowerStep::EnableSupplies))?;

        if let Err(err) = self.boot(irq).await {
            if self.hw.supplies.disable_all().await.is_err() {
                warn!("supplies left on after failed power-up");
            }
            return Err(err);
        }
        Ok(())
    }

    async fn boot<Q: InterruptLine>(&mut self, irq: &Q) -> Result<(), PowerError> {
        self.hw.delay.delay_ms(self.profile.power_on_delay_ms).await;

        self.hw
            .reset
            .assert()
            .map_err(|_| PowerError::at(PowerStep::AssertReset))?;
        let pulse = self.next_pulse_us();
        trace!("reset pulse {} us", pulse);
        self.hw.delay.delay_us(pulse).await;
        self.hw
            .reset
            .deassert()
            .map_err(|_| PowerError::at(PowerStep::DeassertReset))?;

        self.hw
            .delay
            .delay_ms(self.profile.firmware_boot_delay_ms)
            .await;

        irq.enable()
            .map_err(|_| PowerError::at(PowerStep::EnableInterrupt))
    }

    /// Close the interrupt gate, then switch the supplies off.
    ///
    /// Both steps always run; the first failure is returned.
    pub async fn stop<Q: InterruptLine>(&mut self, irq: &Q) -> Result<(), PowerError> {
        let gate = irq
            .disable()
            .map_err(|_| PowerError::at(PowerStep::DisableInterrupt));
        let supplies = self
            .hw
            .supplies
            .disable_all()
            .await
            .map_err(|_| PowerError::at(PowerStep::DisableSupplies));
        gate.and(supplies)
    }
}
