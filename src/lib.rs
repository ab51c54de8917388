//! A library for decoding Socomec energy meter telemetry read via Modbus.
//!
//! The crate turns the meter's flat space of 16 bit holding registers into
//! named, unit scaled channels:
//!
//! - [`channel::Channel`]: a named value slot with a unit and a multiplier.
//! - [`element::Element`]: decodes one (un)signed word or doubleword into a
//!   channel, or skips reserved registers.
//! - [`range::Range`]: a contiguous run of elements fetched with one read.
//! - [`protocol::Protocol`]: all ranges of a device, validated once at
//!   construction.
//! - [`nature::MeterNature`]: the generic meter roles (active power, apparent
//!   energy, ...) a device definition such as [`socomec::SocomecMeter`] maps
//!   onto its channels.
//!
//! Register fetching is left to `tokio-modbus`; see [`tokio_sync_safe_client::SafeClient`]
//! (blocking) and [`tokio_async_safe_client::SafeClient`] (`async`).
//!
//! ## Quick Start
//!
//! ```
//! use socomec_lib::{
//!     nature::{DeviceNature, MeterNature},
//!     socomec::SocomecMeter,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let meter = SocomecMeter::new("meter0")?;
//! for range in meter.protocol().ranges() {
//!     println!("read {} registers at {:#06x}", range.len(), range.address());
//! }
//!
//! // Bytes as returned by the device for the power range.
//! let mut bytes = vec![0u8; 40];
//! bytes[..4].copy_from_slice(&[0x00, 0x00, 0x03, 0xE8]);
//! meter.protocol().ranges().next().unwrap().decode(&bytes)?;
//!
//! assert_eq!(meter.active_power().and_then(|c| c.get()), Some(10000));
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod channel;
pub mod element;
pub mod error;
pub mod nature;
pub mod protocol;
pub mod range;
pub mod socomec;

pub use error::{ConfigError, FormatError};

#[cfg(any(
    feature = "tokio-rtu-sync",
    feature = "tokio-tcp-sync",
    feature = "tokio-rtu",
    feature = "tokio-tcp"
))]
pub mod tokio_common;

#[cfg_attr(
    docsrs,
    doc(cfg(any(feature = "tokio-rtu-sync", feature = "tokio-tcp-sync")))
)]
#[cfg(any(feature = "tokio-rtu-sync", feature = "tokio-tcp-sync"))]
pub mod tokio_sync;

#[cfg_attr(docsrs, doc(cfg(any(feature = "tokio-rtu", feature = "tokio-tcp"))))]
#[cfg(any(feature = "tokio-rtu", feature = "tokio-tcp"))]
pub mod tokio_async;

#[cfg_attr(
    docsrs,
    doc(cfg(all(
        feature = "safe-client-sync",
        any(feature = "tokio-rtu-sync", feature = "tokio-tcp-sync")
    )))
)]
#[cfg(all(
    feature = "safe-client-sync",
    any(feature = "tokio-rtu-sync", feature = "tokio-tcp-sync")
))]
pub mod tokio_sync_safe_client;

#[cfg_attr(
    docsrs,
    doc(cfg(all(
        feature = "safe-client-async",
        any(feature = "tokio-rtu", feature = "tokio-tcp")
    )))
)]
#[cfg(all(
    feature = "safe-client-async",
    any(feature = "tokio-rtu", feature = "tokio-tcp")
))]
pub mod tokio_async_safe_client;
