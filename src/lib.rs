//! # riobus
//!
//! Emulation of a robot controller's register and bus state, so control
//! software can run against a simulated device instead of the real board.
//!
//! ## Features
//!
//! - **Register blocks**: analog, PWM, digital I/O, relays, counters, encoders,
//!   accelerometer, power, SPI, joysticks, match data and robot mode, each
//!   behind bounds-checked channel indices
//! - **CAN bus**: bit-exact identifier framing, FIFO queues in both directions,
//!   repeating sends and motor controllers keyed by identifier
//! - **Guarded shared state**: one aggregate per process behind a reentrant lock
//! - **Snapshot export**: change-tracked, order-stable JSON lines for a visualizer
//!
//! ## Quick Start
//!
//! ```rust
//! use riobus::channel::Channel;
//! use riobus::registers::PwmHeader;
//! use riobus::{AcquireState, Serializer, StateManager};
//! use std::sync::Arc;
//!
//! let manager = Arc::new(StateManager::new());
//! let mut serializer = Serializer::new(Arc::clone(&manager));
//!
//! // Write a register through the guard
//! let header = PwmHeader::new(0).unwrap();
//! manager
//!     .acquire()
//!     .with_mut(|state| state.pwm_mut().set_hdr_duty_cycle(header, 1500))
//!     .unwrap();
//!
//! assert!(serializer.has_new_data().unwrap());
//! let snapshot = serializer.serialize_shallow().unwrap();
//! assert!(snapshot.starts_with(r#"{"section":"pwm_hdrs""#));
//! ```
//!
//! ## Architecture
//!
//! - [`registers`] - Individual register blocks and the CAN bus
//! - [`state`] - The aggregate owning every block, with change tracking
//! - [`manager`] - Reentrant guarded access to the aggregate
//! - [`serializer`] - Snapshot sections and shallow/deep export
//! - [`publisher`] - Scheduled export over a broadcast channel
//! - [`config`] - Emulator configuration

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod channel;
pub mod config;
pub mod error;
pub mod manager;
pub mod publisher;
pub mod registers;
pub mod serializer;
pub mod state;

// Re-export main public types for convenience
pub use config::{ConfigError, EmulatorConfig};
pub use error::HardwareError;
pub use manager::{AcquireState, StateGuard, StateManager};
pub use publisher::{Snapshot, SnapshotKind, SnapshotPublisher};
pub use serializer::{RelayState, Section, Serializer};
pub use state::HardwareState;
