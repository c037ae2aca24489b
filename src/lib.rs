#![cfg_attr(not(test), no_std)]

//! Motion control core for a two-wheeled car driven over a serial link.
//!
//! Commands arrive one byte at a time (hardware UART interrupt, or the
//! bit-banged [`soft_serial`] line), the [`car`] dispatches them to the
//! [`drive`] and an HC-SR04 ranger ([`hc_sr04`]) runs a three-tier obstacle
//! avoidance policy. Everything here is generic over `embedded-hal`, the
//! board bindings live in the `smartcar-avr` firmware crate.

pub mod car;
pub mod command;
pub mod config;
pub mod drive;
pub mod error;
pub mod hc_sr04;
pub mod link;
pub mod soft_serial;
pub mod time;

#[cfg(test)]
pub(crate) mod testing;

pub use car::{Mode, SmartCar};
pub use command::{Command, ReceiveLatch};
pub use drive::{DriveController, DriveState, Maneuver, MotorSide, PwmCompare};
pub use error::Error;
pub use hc_sr04::{Avoidance, EchoMeasurement, RangeSensor};
pub use link::CommandLink;
pub use soft_serial::SoftSerial;
pub use time::{Deadline, Monotonic};
