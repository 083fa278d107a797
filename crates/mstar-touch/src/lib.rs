//! Driver for MStar msg2238/msg2638 touchscreen controllers.
//!
//! The controller sits on an I2C bus and pulses an interrupt line whenever a
//! new touch frame is ready. This crate powers it up in the right order,
//! reads and validates each frame, and reports contacts as multi-touch slots.
//!
//! # Layout
//!
//! ```text
//! Touchscreen (device)
//!   ├── SessionController ── PowerSequencer ── supplies / reset / delay
//!   └── EventPump ── I2C bus ── protocol::decode ── TouchSink
//! ```
//!
//! - [`profile`]: per-model constants
//! - [`protocol`]: pure frame codec
//! - [`sequencer`]: power-up/power-down ordering
//! - [`pump`]: one interrupt, one frame
//! - [`session`]: open/close/suspend/resume state machine
//! - [`device`]: attach-time configuration tying it all together
//!
//! # Features
//!
//! - `defmt`: log through defmt, derive `defmt::Format`
//! - `std`: log through tracing, enable `platform::mocks`

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(async_fn_in_trait)]

// Must come first so the logging macros are visible to every module below.
mod fmt;

pub mod device;
pub mod error;
pub mod profile;
pub mod protocol;
pub mod pump;
pub mod sequencer;
pub mod session;

pub use device::{Touchscreen, TouchscreenParts, CONTACT_MAJOR, DEVICE_NAME, DEVICE_PHYS};
pub use error::{ConfigError, DecodeError, Error, FrameError, PowerError, PowerStep};
pub use profile::{DeviceProfile, Model, MAX_FINGERS, MAX_FRAME_LEN};
pub use protocol::{decode, FingerRecord, RawFrame, TouchPoint, TouchPoints};
pub use pump::EventPump;
pub use sequencer::{PowerHandles, PowerSequencer};
pub use session::{DeviceState, SessionController};
