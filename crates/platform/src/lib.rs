//! Hardware Abstraction Layer (HAL) for touchscreen controllers
//!
//! This crate provides trait-based abstractions for everything a touch
//! controller driver touches outside its own wire protocol, enabling
//! development and testing without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Board / OS glue (regulators, EXTI, input subsystem)
//!         ↓
//! Controller drivers (mstar-touch)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! embedded-hal / embedded-hal-async traits
//! ```
//!
//! # Abstractions
//!
//! - [`TouchSink`] - multi-touch slot consumer (input subsystem side)
//! - [`InterruptLine`] / [`IrqLine`] - gated "frame ready" interrupt
//! - [`ResetLine`] - reset GPIO with polarity
//! - [`SupplyBank`] / [`SwitchedSupplies`] - controller power rails
//! - [`PropertySource`] - device-tree style configuration lookup
//!
//! The register bus itself is `embedded_hal_async::i2c::I2c`; no wrapper is
//! needed on top of it.
//!
//! # Features
//!
//! - `std`: Enable standard library support and the [`mocks`] module
//! - `defmt`: Enable defmt logging derives
//!
//! # Example
//!
//! ```no_run
//! use platform::{SlotState, TouchSink};
//!
//! fn one_finger<S: TouchSink>(sink: &mut S) {
//!     sink.report_slot(0, SlotState::Contact { x: 100, y: 200 });
//!     sink.sync_frame();
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // property names and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors — callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod gpio;
pub mod input;
pub mod power;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export main high-level traits
pub use config::{ConfigError, PropertySource, ScreenGeometry};
pub use gpio::{InterruptLine, IrqLine, ResetLine, ResetPolarity};
pub use input::{DropUnusedSlots, SlotState, TouchCapabilities, TouchSink};
pub use power::{SupplyBank, SupplyError, SwitchedSupplies};
