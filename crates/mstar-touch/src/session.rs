//! Open/close and suspend/resume bookkeeping.
//!
//! ```text
//! Stopped --open/resume--> Starting --ok--> Running --close/suspend--> Stopping --> Stopped
//!                             |
//!                             +--err--> Stopped
//! ```
//!
//! All four entry points take the same async lock, so at most one power
//! transition runs per device. The event pump never takes this lock.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use platform::{InterruptLine, SupplyBank};

use crate::error::PowerError;
use crate::sequencer::PowerSequencer;

/// Power state of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Unpowered, interrupt gate closed
    #[default]
    Stopped,
    /// Power-up in progress
    Starting,
    /// Producing frames
    Running,
    /// Power-down in progress
    Stopping,
}

struct Session<S, P, D> {
    sequencer: PowerSequencer<S, P, D>,
    state: DeviceState,
    /// A consumer holds the input device open.
    opened: bool,
    /// System sleep in progress.
    suspended: bool,
}

impl<S, P, D> Session<S, P, D>
where
    S: SupplyBank,
    P: OutputPin,
    D: DelayNs,
{
    async fn power_up<Q: InterruptLine>(&mut self, irq: &Q) -> Result<(), PowerError> {
        match self.state {
            DeviceState::Running => return Ok(()),
            DeviceState::Starting | DeviceState::Stopping => {
                // A previous transition was cancelled half-way.
                warn!("recovering from interrupted {} transition", self.state);
                if let Err(err) = self.sequencer.stop(irq).await {
                    warn!("teardown before restart: {}", err);
                }
            }
            DeviceState::Stopped => {}
        }

        self.state = DeviceState::Starting;
        match self.sequencer.start(irq).await {
            Ok(()) => {
                self.state = DeviceState::Running;
                info!("touchscreen powered up");
                Ok(())
            }
            Err(err) => {
                self.state = DeviceState::Stopped;
                error!("touchscreen power-up failed: {}", err);
                Err(err)
            }
        }
    }

    async fn power_down<Q: InterruptLine>(&mut self, irq: &Q) {
        if self.state == DeviceState::Stopped {
            return;
        }

        self.state = DeviceState::Stopping;
        if let Err(err) = self.sequencer.stop(irq).await {
            error!("touchscreen power-down failed: {}", err);
        }
        self.state = DeviceState::Stopped;
        info!("touchscreen powered down");
    }
}

/// Serialises open/close/suspend/resume for one device.
pub struct SessionController<M: RawMutex, S, P, D> {
    inner: Mutex<M, Session<S, P, D>>,
}

impl<M, S, P, D> SessionController<M, S, P, D>
where
    M: RawMutex,
    S: SupplyBank,
    P: OutputPin,
    D: DelayNs,
{
    /// Create a controller for a stopped, closed device.
    pub fn new(sequencer: PowerSequencer<S, P, D>) -> Self {
        Self {
            inner: Mutex::new(Session {
                sequencer,
                state: DeviceState::Stopped,
                opened: false,
                suspended: false,
            }),
        }
    }

    /// First consumer opened the input device.
    ///
    /// Powers the controller up unless it is already running or the system
    /// is suspended (then `resume` does it). A failed power-up leaves the
    /// device unopened.
    pub async fn open<Q: InterruptLine>(&self, irq: &Q) -> Result<(), PowerError> {
        let mut session = self.inner.lock().await;
        if session.suspended {
            debug!("open while suspended, deferring power-up");
            session.opened = true;
            return Ok(());
        }
        session.power_up(irq).await?;
        session.opened = true;
        Ok(())
    }

    /// Last consumer closed the input device. Errors are logged only.
    pub async fn close<Q: InterruptLine>(&self, irq: &Q) {
        let mut session = self.inner.lock().await;
        session.opened = false;
        session.power_down(irq).await;
    }

    /// System sleep: power down an opened device. Errors are logged only.
    pub async fn suspend<Q: InterruptLine>(&self, irq: &Q) {
        let mut session = self.inner.lock().await;
        session.suspended = true;
        if session.opened {
            session.power_down(irq).await;
        }
    }

    /// System wake: power an opened device back up.
    pub async fn resume<Q: InterruptLine>(&self, irq: &Q) -> Result<(), PowerError> {
        let mut session = self.inner.lock().await;
        session.suspended = false;
        if !session.opened {
            return Ok(());
        }
        session.power_up(irq).await
    }

    /// Current power state.
    pub async fn state(&self) -> DeviceState {
        self.inner.lock().await.state
    }

    /// Whether a consumer holds the device open.
    pub async fn is_opened(&self) -> bool {
        self.inner.lock().await.opened
    }

    /// Whether the device is between `suspend` and `resume`.
    pub async fn is_suspended(&self) -> bool {
        self.inner.lock().await.suspended
    }

    /// Take the sequencer back out.
    pub fn into_sequencer(self) -> PowerSequencer<S, P, D> {
        self.inner.into_inner().sequencer
    }
}

impl core::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(state)
    }
}
