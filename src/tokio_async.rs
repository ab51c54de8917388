//! Asynchronous `tokio-modbus` polling of a device's register protocol.
//!
//! The async counterpart of [`crate::tokio_sync`]. All functions return
//! `Future`s that must be `.await`ed.
//!
//! # Examples
//!
//! ```no_run
//! use socomec_lib::{nature::DeviceNature, socomec::SocomecMeter, tokio_async::MeterReader};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let meter = SocomecMeter::new("meter0")?;
//!     let mut modbus_ctx = tokio_modbus::client::tcp::connect("127.0.0.1:502".parse()?).await?;
//!
//!     let report = tokio::time::timeout(
//!         Duration::from_secs(2),
//!         MeterReader::poll(&mut modbus_ctx, meter.protocol()),
//!     )
//!     .await?;
//!     print!("{}", meter.protocol().snapshot());
//!     println!("complete: {}", report.is_complete());
//!     Ok(())
//! }
//! ```

use crate::{
    element::registers_to_bytes,
    protocol::{PollReport, Protocol},
    range::Range,
    tokio_common::{map_tokio_result, Error, Result},
};
use tokio_modbus::prelude::Reader;

/// Asynchronous range reader for meters reachable through a `tokio-modbus` context.
#[derive(Debug)]
pub struct MeterReader;

impl MeterReader {
    /// Reads the raw bytes of `range` without decoding them.
    pub async fn fetch(ctx: &mut tokio_modbus::client::Context, range: &Range) -> Result<Vec<u8>> {
        let registers =
            map_tokio_result(ctx.read_holding_registers(range.address(), range.len()).await)?;
        Ok(registers_to_bytes(&registers))
    }

    /// Reads `range` and decodes it into its channels.
    pub async fn read_range(ctx: &mut tokio_modbus::client::Context, range: &Range) -> Result<()> {
        let bytes = Self::fetch(ctx, range).await?;
        Ok(range.decode(&bytes)?)
    }

    /// Reads every range of `protocol` once, in declaration order.
    pub async fn poll(
        ctx: &mut tokio_modbus::client::Context,
        protocol: &Protocol,
    ) -> PollReport<Error> {
        let mut report = PollReport::default();
        for range in protocol.ranges() {
            let result = Self::read_range(ctx, range).await;
            report.record(range, result);
        }
        report
    }
}
