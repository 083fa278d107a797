//! One attached controller: configuration, session and event pump.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use platform::config::bus_address;
use platform::{
    ConfigError, InterruptLine, PropertySource, ScreenGeometry, SupplyBank, TouchCapabilities,
    TouchSink,
};

use crate::error::{Error, FrameError};
use crate::profile::{DeviceProfile, Model};
use crate::pump::EventPump;
use crate::sequencer::{PowerHandles, PowerSequencer};
use crate::session::{DeviceState, SessionController};

/// Input device name reported to the sink.
pub const DEVICE_NAME: &str = "MStar TouchScreen";

/// Physical path reported to the sink.
pub const DEVICE_PHYS: &str = "input/ts";

/// Contact size reported for every finger; the frame carries none.
pub const CONTACT_MAJOR: u8 = 1;

/// Board resources handed to [`Touchscreen::attach`].
pub struct TouchscreenParts<B, K, S, P, D, Q> {
    /// Register bus the controller sits on
    pub bus: B,
    /// Multi-touch consumer
    pub sink: K,
    /// Supplies, reset line and delay
    pub power: PowerHandles<S, P, D>,
    /// "Frame ready" interrupt gate
    pub irq: Q,
    /// Reset-pulse seed, `None` for the built-in one
    pub seed: Option<u32>,
}

/// An attached msg2238/msg2638 controller.
///
/// `open`/`close`/`suspend`/`resume` go through the session lock; frames go
/// through [`Touchscreen::run`] (or [`Touchscreen::service_interrupt`]) in a
/// separate task, which only ever takes the pump lock.
pub struct Touchscreen<M: RawMutex, B, K, S, P, D, Q> {
    model: Model,
    geometry: ScreenGeometry,
    caps: TouchCapabilities,
    irq: Q,
    session: SessionController<M, S, P, D>,
    pump: Mutex<M, EventPump<B, K>>,
}

impl<M, B, K, S, P, D, Q> Touchscreen<M, B, K, S, P, D, Q>
where
    M: RawMutex,
    B: I2c,
    K: TouchSink,
    S: SupplyBank,
    P: OutputPin,
    D: DelayNs,
    Q: InterruptLine,
{
    /// Validate configuration, close the interrupt gate and register with
    /// the sink. The controller is left unpowered.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for a missing or unknown compatible string, a bad
    /// `reg` or a zero/missing screen size; [`Error::Interrupt`] and
    /// [`Error::Registration`] when the gate or sink refuse.
    pub fn attach<C>(props: &C, parts: TouchscreenParts<B, K, S, P, D, Q>) -> Result<Self, Error>
    where
        C: PropertySource + ?Sized,
    {
        let compatible = props.compatible().ok_or(ConfigError::MissingCompatible)?;
        let model = Model::from_compatible(compatible).ok_or(ConfigError::UnknownModel)?;
        let profile = model.profile();
        let geometry = ScreenGeometry::from_properties(props)?;
        let address = bus_address(props)?;

        let TouchscreenParts {
            bus,
            mut sink,
            power,
            irq,
            seed,
        } = parts;

        irq.disable().map_err(|_| Error::Interrupt)?;

        let caps = TouchCapabilities {
            name: DEVICE_NAME,
            phys: DEVICE_PHYS,
            slots: profile.max_fingers,
            x_max: geometry.x_max(),
            y_max: geometry.y_max(),
            direct: true,
            drop_unused: true,
            touch_major: Some(CONTACT_MAJOR),
        };
        if sink.register(&caps).is_err() {
            error!("{} input registration failed", model);
            return Err(Error::Registration);
        }

        let sequencer = match seed {
            Some(seed) => PowerSequencer::with_seed(profile, power, seed),
            None => PowerSequencer::new(profile, power),
        };

        info!(
            "{} attached at {}, {}x{}",
            model,
            address,
            geometry.width(),
            geometry.height()
        );

        Ok(Self {
            model,
            geometry,
            caps,
            irq,
            session: SessionController::new(sequencer),
            pump: Mutex::new(EventPump::new(bus, sink, address, profile)),
        })
    }

    /// Power up for the first consumer.
    pub async fn open(&self) -> Result<(), Error> {
        self.session.open(&self.irq).await.map_err(Error::from)
    }

    /// Power down after the last consumer.
    pub async fn close(&self) {
        self.session.close(&self.irq).await;
    }

    /// System sleep.
    pub async fn suspend(&self) {
        self.session.suspend(&self.irq).await;
    }

    /// System wake.
    pub async fn resume(&self) -> Result<(), Error> {
        self.session.resume(&self.irq).await.map_err(Error::from)
    }

    /// Current power state.
    pub async fn state(&self) -> DeviceState {
        self.session.state().await
    }

    /// Handle one notification from the interrupt gate.
    ///
    /// Returns `None` when the gate is closed (a stale notification racing a
    /// stop); nothing is read then.
    pub async fn service_interrupt(&self) -> Option<Result<usize, FrameError>> {
        if !self.irq.is_enabled() {
            trace!("stale touch interrupt ignored");
            return None;
        }
        let mut pump = self.pump.lock().await;
        Some(pump.handle_interrupt().await)
    }

    /// Event pump loop. Spawn once per device; never returns.
    pub async fn run(&self) {
        loop {
            self.irq.wait_for_frame().await;
            // Errors are logged by the pump.
            let _ = self.service_interrupt().await;
        }
    }

    /// Detected model.
    pub fn model(&self) -> Model {
        self.model
    }

    /// Constants of the detected model.
    pub fn profile(&self) -> DeviceProfile {
        self.model.profile()
    }

    /// Configured screen size.
    pub fn geometry(&self) -> ScreenGeometry {
        self.geometry
    }

    /// Capabilities registered with the sink.
    pub fn capabilities(&self) -> &TouchCapabilities {
        &self.caps
    }

    /// The interrupt gate (the board ISR notifies through this).
    pub fn irq(&self) -> &Q {
        &self.irq
    }

    /// Session state tracker.
    pub fn session(&self) -> &SessionController<M, S, P, D> {
        &self.session
    }
}
