//! Asynchronous, thread-safe polling client.
//!
//! The async counterpart of [`crate::tokio_sync_safe_client`]. Polls and
//! snapshots of one client are serialised by a `tokio` mutex.
//!
//! All client methods are `async` and must be `.await`ed.

use crate::{
    nature::DeviceNature,
    protocol::{PollReport, Snapshot},
    tokio_async,
    tokio_common::Error,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_modbus::{client::Context, slave::SlaveContext, Slave};

/// Asynchronous client polling one device.
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
    /// Creates a new `SafeClient` owning the given `tokio-modbus` asynchronous context.
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

    /// Clones the shared `tokio-modbus` asynchronous context.
    pub fn clone_shared(&self) -> Arc<Mutex<Context>> {
        self.ctx.clone()
    }

    /// The polled device.
    pub fn nature(&self) -> &N {
        &self.nature
    }

    /// Reads and decodes every range of the device once.
    pub async fn poll(&self) -> PollReport<Error> {
        let mut ctx = self.ctx.lock().await;
        if let Some(slave) = self.slave {
            ctx.set_slave(slave);
        }
        log::debug!("Polling '{}'", self.nature.id());
        tokio_async::MeterReader::poll(&mut ctx, self.nature.protocol()).await
    }

    /// Current channel values, consistent with respect to concurrent polls.
    pub async fn snapshot(&self) -> Snapshot {
        let _ctx = self.ctx.lock().await;
        self.nature.protocol().snapshot()
    }

    /// Runs `read` on the device while no poll can run, so every channel it
    /// reads belongs to the same poll cycle.
    pub async fn with_nature<R>(&self, read: impl FnOnce(&N) -> R) -> R {
        let _ctx = self.ctx.lock().await;
        read(&self.nature)
    }
}
