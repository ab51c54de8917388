//! Synchronous `tokio-modbus` polling of a device's register protocol.
//!
//! This module provides stateless functions (`MeterReader` struct) that fetch
//! the ranges of a [`Protocol`] with blocking Modbus reads and decode them into
//! the bound channels.
//!
//! # Examples
//!
//! ```no_run
//! use socomec_lib::{
//!     nature::{DeviceNature, MeterNature},
//!     socomec::SocomecMeter,
//!     tokio_sync::MeterReader,
//! };
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let meter = SocomecMeter::new("meter0")?;
//!     let mut modbus_ctx = tokio_modbus::client::sync::tcp::connect("127.0.0.1:502".parse()?)?;
//!     modbus_ctx.set_timeout(Some(Duration::from_secs(1)));
//!
//!     let report = MeterReader::poll(&mut modbus_ctx, meter.protocol());
//!     if let Some(power) = meter.active_power() {
//!         println!("{power}");
//!     }
//!     println!("{} ranges failed", report.failures.len());
//!     Ok(())
//! }
//! ```

use crate::{
    element::registers_to_bytes,
    protocol::{PollReport, Protocol},
    range::Range,
    tokio_common::{map_tokio_result, Error, Result},
};
use tokio_modbus::prelude::SyncReader;

/// Blocking range reader for meters reachable through a `tokio-modbus` synchronous context.
///
/// All methods block the current thread while waiting for the device.
#[derive(Debug)]
pub struct MeterReader;

impl MeterReader {
    /// Reads the raw bytes of `range` without decoding them.
    pub fn fetch(ctx: &mut tokio_modbus::client::sync::Context, range: &Range) -> Result<Vec<u8>> {
        let registers = map_tokio_result(ctx.read_holding_registers(range.address(), range.len()))?;
        Ok(registers_to_bytes(&registers))
    }

    /// Reads `range` and decodes it into its channels.
    ///
    /// # Errors
    ///
    /// * `Error::TokioError` / `Error::TokioExceptionError` if the read fails.
    /// * `Error::FormatError` if the device returns an unexpected number of registers.
    pub fn read_range(ctx: &mut tokio_modbus::client::sync::Context, range: &Range) -> Result<()> {
        let bytes = Self::fetch(ctx, range)?;
        Ok(range.decode(&bytes)?)
    }

    /// Reads every range of `protocol` once.
    ///
    /// A failed range does not stop the cycle; it is listed in the returned report.
    pub fn poll(
        ctx: &mut tokio_modbus::client::sync::Context,
        protocol: &Protocol,
    ) -> PollReport<Error> {
        protocol.poll(|range| Self::fetch(ctx, range))
    }
}
