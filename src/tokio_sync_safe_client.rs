//! Synchronous, thread-safe polling client.
//!
//! `SafeClient` couples a device definition with a shared `tokio-modbus`
//! synchronous context. Polls and snapshots of one client take the same lock,
//! so a snapshot never mixes values of two poll cycles. Several clients may
//! share one context (e.g. several meters on the same RS485 bus); each then
//! switches the context to its own slave address before polling.
//!
//! ## Example
//!
//! ```no_run
//! use socomec_lib::{
//!     bus::SlaveAddress, socomec::SocomecMeter, tokio_sync_safe_client::SafeClient,
//! };
//! use tokio_modbus::client::sync::tcp;
//! use tokio_modbus::Slave;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let socket_addr = "192.168.1.100:502".parse()?;
//!     let ctx = tcp::connect_slave(socket_addr, Slave(*SlaveAddress::default()))?;
//!     let client = SafeClient::new(ctx, SocomecMeter::new("meter0")?);
//!
//!     let report = client.poll();
//!     println!("{}", client.snapshot());
//!     println!("{} ranges failed", report.failures.len());
//!     Ok(())
//! }
//! ```

use crate::{
    nature::DeviceNature,
    protocol::{PollReport, Snapshot},
    tokio_common::Error,
    tokio_sync,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_modbus::{client::sync::Context, slave::SlaveContext, Slave};

/// Synchronous client polling one device.
pub struct SafeClient<N> {
    ctx: Arc<Mutex<Context>>,
    nature: Arc<N>,
    slave: Option<Slave>,
}

impl<N> Clone for SafeClient<N> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            nature: self.nature.clone(),
            slave: self.slave,
        }
    }
}

impl<N: DeviceNature> SafeClient<N> {
    /// Creates a new `SafeClient` owning the given `tokio-modbus` synchronous context.
    pub fn new(ctx: Context, nature: N) -> Self {
        Self {
            ctx: Arc::new(Mutex::new(ctx)),
            nature: Arc::new(nature),
            slave: None,
        }
    }

    /// Creates a new `SafeClient` from a shared context, addressing `slave` on every poll.
    pub fn from_shared(ctx: Arc<Mutex<Context>>, nature: N, slave: Slave) -> Self {
        Self {
            ctx,
            nature: Arc::new(nature),
            slave: Some(slave),
        }
    }

    /// Clones the shared `tokio-modbus` synchronous context.
    pub fn clone_shared(&self) -> Arc<Mutex<Context>> {
        self.ctx.clone()
    }

    /// The polled device.
    pub fn nature(&self) -> &N {
        &self.nature
    }

    /// Sets the I/O timeout of the underlying context.
    pub fn set_timeout(&self, timeout: Duration) {
        self.lock().set_timeout(timeout);
    }

    fn lock(&self) -> MutexGuard<'_, Context> {
        self.ctx.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads and decodes every range of the device once.
    pub fn poll(&self) -> PollReport<Error> {
        let mut ctx = self.lock();
        if let Some(slave) = self.slave {
            ctx.set_slave(slave);
        }
        log::debug!("Polling '{}'", self.nature.id());
        tokio_sync::MeterReader::poll(&mut ctx, self.nature.protocol())
    }

    /// Current channel values, consistent with respect to concurrent polls.
    pub fn snapshot(&self) -> Snapshot {
        let _ctx = self.lock();
        self.nature.protocol().snapshot()
    }

    /// Runs `read` on the device while no poll can run, so every channel it
    /// reads belongs to the same poll cycle.
    pub fn with_nature<R>(&self, read: impl FnOnce(&N) -> R) -> R {
        let _ctx = self.lock();
        read(&self.nature)
    }
}

#[cfg(all(test, feature = "tokio-tcp-sync"))]
mod tests {
    use super::*;
    use crate::{nature::MeterNature, socomec::SocomecMeter};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use tokio_modbus::client::sync::tcp;

    fn client(listener: &TcpListener) -> SafeClient<SocomecMeter> {
        let ctx = tcp::connect(listener.local_addr().unwrap()).unwrap();
        SafeClient::new(ctx, SocomecMeter::new("meter0").unwrap())
    }

    #[test]
    fn with_nature_waits_for_running_poll() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = client(&listener);
        let done = Arc::new(AtomicBool::new(false));

        let shared = client.clone_shared();
        let poll_in_progress = shared.lock().unwrap();
        let reader = {
            let client = client.clone();
            let done = done.clone();
            thread::spawn(move || {
                let power = client.with_nature(|meter| meter.active_power().and_then(|c| c.get()));
                done.store(true, Ordering::SeqCst);
                power
            })
        };

        thread::sleep(Duration::from_millis(100));
        assert!(!done.load(Ordering::SeqCst));
        drop(poll_in_progress);
        assert_eq!(reader.join().unwrap(), None);
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn snapshot_lists_every_channel() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = client(&listener);
        let snapshot = client.snapshot();
        assert_eq!(snapshot.0.len(), client.nature().protocol().channels().count());
        assert!(snapshot.0.values().all(|reading| reading.value.is_none()));
    }
}
