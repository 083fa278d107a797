//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests.
//!
//! Mocks are cheap handles: cloning one shares its state, so a test can keep
//! a clone after moving the original into a driver. Power-path mocks append
//! to a shared [`CallLog`] so ordering across components can be asserted.

#![cfg(any(test, feature = "std"))]

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal::digital::{self, ErrorType as DigitalErrorType, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::*;

/// One recorded hardware interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    /// Named output pin driven high (`true`) or low (`false`)
    Pin(&'static str, bool),
    /// Supply bank switched on (`true`) or off (`false`)
    Supplies(bool),
    /// Delay, normalised to microseconds
    DelayUs(u32),
    /// Interrupt gate enabled (`true`) or disabled (`false`)
    Irq(bool),
    /// Bus read
    BusRead {
        /// Target address
        address: u8,
        /// Requested length
        len: usize,
    },
}

/// Shared, ordered record of [`Call`]s.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    /// Snapshot of every call so far
    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    /// Forget every call so far
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Position of the first occurrence of `call`
    pub fn position(&self, call: Call) -> Option<usize> {
        self.0.borrow().iter().position(|c| *c == call)
    }
}

/// Error returned by mocks told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

impl digital::Error for MockError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// Output pin that logs its level.
#[derive(Debug, Clone)]
pub struct MockPin {
    name: &'static str,
    log: CallLog,
    fail: Rc<Cell<bool>>,
}

impl MockPin {
    /// Create a pin logging to `log`
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            log: log.clone(),
            fail: Rc::default(),
        }
    }

    /// Make the next level change fail (and not be logged)
    pub fn fail_next(&self) {
        self.fail.set(true);
    }

    fn drive(&mut self, high: bool) -> Result<(), MockError> {
        if self.fail.replace(false) {
            return Err(MockError);
        }
        self.log.push(Call::Pin(self.name, high));
        Ok(())
    }
}

impl DigitalErrorType for MockPin {
    type Error = MockError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

/// Supply bank that logs switching.
#[derive(Debug, Clone)]
pub struct MockSupplies {
    log: CallLog,
    fail_enable: Rc<Cell<bool>>,
    fail_disable: Rc<Cell<bool>>,
}

impl MockSupplies {
    /// Create a bank logging to `log`
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            fail_enable: Rc::default(),
            fail_disable: Rc::default(),
        }
    }

    /// Make the next `enable_all` fail
    pub fn fail_next_enable(&self) {
        self.fail_enable.set(true);
    }

    /// Make the next `disable_all` fail
    pub fn fail_next_disable(&self) {
        self.fail_disable.set(true);
    }
}

impl SupplyBank for MockSupplies {
    type Error = MockError;

    async fn enable_all(&mut self) -> Result<(), Self::Error> {
        if self.fail_enable.replace(false) {
            return Err(MockError);
        }
        self.log.push(Call::Supplies(true));
        Ok(())
    }

    async fn disable_all(&mut self) -> Result<(), Self::Error> {
        if self.fail_disable.replace(false) {
            return Err(MockError);
        }
        self.log.push(Call::Supplies(false));
        Ok(())
    }
}

/// Delay that returns immediately and logs the requested time.
#[derive(Debug, Clone)]
pub struct MockDelay {
    log: CallLog,
}

impl MockDelay {
    /// Create a delay logging to `log`
    pub fn new(log: &CallLog) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.log.push(Call::DelayUs(ns / 1_000));
    }

    async fn delay_us(&mut self, us: u32) {
        self.log.push(Call::DelayUs(us));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.log.push(Call::DelayUs(ms.saturating_mul(1_000)));
    }
}

/// Interrupt gate that logs enable/disable and can be told to fail.
#[derive(Clone)]
pub struct MockIrq {
    log: CallLog,
    line: Rc<IrqLine<NoopRawMutex>>,
    fail_enable: Rc<Cell<bool>>,
    fail_disable: Rc<Cell<bool>>,
}

impl MockIrq {
    /// Create a disabled gate logging to `log`
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            line: Rc::new(IrqLine::new()),
            fail_enable: Rc::default(),
            fail_disable: Rc::default(),
        }
    }

    /// Simulate a hardware edge. Returns whether it was delivered.
    pub fn notify(&self) -> bool {
        self.line.notify()
    }

    /// Make the next `enable` fail
    pub fn fail_next_enable(&self) {
        self.fail_enable.set(true);
    }

    /// Make the next `disable` fail
    pub fn fail_next_disable(&self) {
        self.fail_disable.set(true);
    }
}

impl InterruptLine for MockIrq {
    type Error = MockError;

    fn enable(&self) -> Result<(), Self::Error> {
        if self.fail_enable.replace(false) {
            return Err(MockError);
        }
        self.log.push(Call::Irq(true));
        let _ = self.line.enable();
        Ok(())
    }

    fn disable(&self) -> Result<(), Self::Error> {
        if self.fail_disable.replace(false) {
            return Err(MockError);
        }
        self.log.push(Call::Irq(false));
        let _ = self.line.disable();
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.line.is_enabled()
    }

    async fn wait_for_frame(&self) {
        self.line.wait_for_frame().await;
    }
}

#[derive(Debug, Default)]
struct BusState {
    responses: VecDeque<Result<Vec<u8>, ErrorKind>>,
}

/// Register bus answering reads from a queue.
///
/// An empty queue answers with an address NACK, like a powered-down chip.
/// A queued response whose length differs from the read is reported as
/// [`ErrorKind::Other`] rather than a truncated buffer.
#[derive(Debug, Clone)]
pub struct MockBus {
    log: CallLog,
    state: Rc<RefCell<BusState>>,
}

impl MockBus {
    /// Create a bus logging to `log`
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            state: Rc::default(),
        }
    }

    /// Queue the bytes returned by the next read
    pub fn push_read(&self, bytes: &[u8]) {
        self.state
            .borrow_mut()
            .responses
            .push_back(Ok(bytes.to_vec()));
    }

    /// Queue a failing read
    pub fn push_error(&self, error: ErrorKind) {
        self.state.borrow_mut().responses.push_back(Err(error));
    }

    /// Responses not consumed yet
    pub fn pending(&self) -> usize {
        self.state.borrow().responses.len()
    }
}

impl i2c::ErrorType for MockBus {
    type Error = ErrorKind;
}

impl I2c for MockBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Read(buf) => {
                    self.log.push(Call::BusRead {
                        address,
                        len: buf.len(),
                    });
                    let response = self
                        .state
                        .borrow_mut()
                        .responses
                        .pop_front()
                        .unwrap_or(Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)));
                    let bytes = response?;
                    if bytes.len() != buf.len() {
                        return Err(ErrorKind::Other);
                    }
                    buf.copy_from_slice(&bytes);
                }
                Operation::Write(_) => return Err(ErrorKind::Other),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SinkState {
    registered: Option<TouchCapabilities>,
    pending: Vec<(u8, SlotState)>,
    frames: Vec<Vec<(u8, SlotState)>>,
    fail_register: bool,
}

/// Touch sink recording committed frames.
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    state: Rc<RefCell<SinkState>>,
}

impl MockSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `register` fail
    pub fn fail_register(&self) {
        self.state.borrow_mut().fail_register = true;
    }

    /// Capabilities passed to `register`
    pub fn registered(&self) -> Option<TouchCapabilities> {
        self.state.borrow().registered
    }

    /// Every committed frame, oldest first
    pub fn frames(&self) -> Vec<Vec<(u8, SlotState)>> {
        self.state.borrow().frames.clone()
    }

    /// Reports not yet committed by a sync
    pub fn pending(&self) -> Vec<(u8, SlotState)> {
        self.state.borrow().pending.clone()
    }
}

impl TouchSink for MockSink {
    type Error = MockError;

    fn register(&mut self, caps: &TouchCapabilities) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.fail_register {
            return Err(MockError);
        }
        state.registered = Some(*caps);
        Ok(())
    }

    fn report_slot(&mut self, slot: u8, state: SlotState) {
        self.state.borrow_mut().pending.push((slot, state));
    }

    fn sync_frame(&mut self) {
        let mut state = self.state.borrow_mut();
        let frame = core::mem::take(&mut state.pending);
        state.frames.push(frame);
    }
}

/// In-memory device description.
#[derive(Debug, Clone, Default)]
pub struct MockProperties {
    compatible: Option<&'static str>,
    values: Vec<(&'static str, u32)>,
}

impl MockProperties {
    /// Description with a compatible string
    pub fn new(compatible: &'static str) -> Self {
        Self {
            compatible: Some(compatible),
            values: Vec::new(),
        }
    }

    /// Description without a compatible string
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Add (or replace) a `u32` property
    #[must_use]
    pub fn with(mut self, name: &'static str, value: u32) -> Self {
        self.values.retain(|(n, _)| *n != name);
        self.values.push((name, value));
        self
    }
}

impl PropertySource for MockProperties {
    fn compatible(&self) -> Option<&str> {
        self.compatible
    }

    fn read_u32(&self, name: &str) -> Option<u32> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| *value)
    }
}
