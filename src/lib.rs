//! SW3538 Rust Driver
//!
//! no-std driver and telemetry engine for the SW3538 USB-C fast-charge
//! controller: retrying register transport, write-gate sequencing, multiplexed
//! ADC reads, decoded telemetry snapshots and an adaptive poll scheduler.
//! Optional async (`async` feature) and defmt logging (`defmt` feature).

#![no_std]

#[macro_use]
mod fmt;

pub mod data_types;
pub mod driver;
pub mod error;
pub mod monitor;
pub mod registers;
pub mod retry;
pub mod scheduler;
mod telemetry;

pub use data_types::{TelemetryConfig, TelemetrySnapshot};
pub use driver::Sw3538;
pub use error::Error;
pub use monitor::Monitor;
pub use registers::DEFAULT_I2C_ADDRESS;
pub use retry::RetryPolicy;
pub use scheduler::{AdaptivePollScheduler, PollConfig};
