//! Named, unit tagged measurement slots.
//!
//! A [`Channel`] is written by exactly one [`Element`](crate::element::Element)
//! and read by any number of consumers. It is shared through [`ChannelRef`].

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to a [`Channel`].
pub type ChannelRef = Arc<Channel>;

/// A decoded measurement value holder.
///
/// The value stays `None` until the first successful decode. Readers must treat
/// `None` as "no data yet", never as zero.
#[derive(Debug)]
pub struct Channel {
    name: String,
    unit: String,
    multiplier: i32,
    value: RwLock<Option<i64>>,
}

impl Channel {
    /// Starts building a channel with the given name, no unit and a multiplier of 1.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: String::new(),
            multiplier: 1,
            value: RwLock::new(None),
        }
    }

    /// Sets the unit the decoded value is expressed in (e.g. `"W"`, `"kWh"`).
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the factor applied to every raw value before it is stored.
    pub fn multiplier(mut self, multiplier: i32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Finishes the builder and returns the shared handle.
    pub fn into_ref(self) -> ChannelRef {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_str(&self) -> &str {
        &self.unit
    }

    pub fn scale(&self) -> i32 {
        self.multiplier
    }

    /// Stores `raw * multiplier` as the current value.
    ///
    /// Only the decoding element writes a channel. A 32 bit raw value times an
    /// `i32` multiplier always fits an `i64`; anything wider saturates.
    pub(crate) fn set_raw(&self, raw: i64) {
        let value = raw.saturating_mul(i64::from(self.multiplier));
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    /// Returns the last stored value, or `None` if the channel was never decoded.
    pub fn get(&self) -> Option<i64> {
        *self.value.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => write!(f, "{}: {} {}", self.name, value, self.unit),
            None => write!(f, "{}: - {}", self.name, self.unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_until_first_write() {
        let channel = Channel::new("ActivePower").unit("W").multiplier(10);
        assert_eq!(channel.get(), None);
        assert_eq!(channel.to_string(), "ActivePower: - W");
    }

    #[test]
    fn multiplier_applied_on_store() {
        let channel = Channel::new("ActivePower").unit("W").multiplier(10);
        channel.set_raw(1000);
        assert_eq!(channel.get(), Some(10000));
        channel.set_raw(-3);
        assert_eq!(channel.get(), Some(-30));
        assert_eq!(channel.to_string(), "ActivePower: -30 W");
    }

    #[test]
    fn default_multiplier_is_one() {
        let channel = Channel::new("ApparentEnergy").unit("kVAh");
        assert_eq!(channel.scale(), 1);
        channel.set_raw(u32::MAX as i64);
        assert_eq!(channel.get(), Some(4294967295));
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        let channel = Channel::new("Extreme").multiplier(i32::MIN);
        channel.set_raw(u32::MAX as i64);
        assert_eq!(channel.get(), Some(u32::MAX as i64 * i32::MIN as i64));
        channel.set_raw(i64::MAX);
        assert_eq!(channel.get(), Some(i64::MIN));
    }
}
