//! Generic capability contracts implemented by concrete device definitions.

use crate::{channel::ChannelRef, protocol::Protocol};
use std::fmt;

/// A device whose channels are filled from a register [`Protocol`].
pub trait DeviceNature {
    /// Identifier of this device instance.
    fn id(&self) -> &str;

    fn protocol(&self) -> &Protocol;
}

/// Semantic measurements every energy meter may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeterRole {
    ActivePower,
    ReactivePower,
    ApparentPower,
    ActivePositiveEnergy,
    ActiveNegativeEnergy,
    ReactivePositiveEnergy,
    ReactiveNegativeEnergy,
    ApparentEnergy,
}

impl MeterRole {
    pub const ALL: [MeterRole; 8] = [
        MeterRole::ActivePower,
        MeterRole::ReactivePower,
        MeterRole::ApparentPower,
        MeterRole::ActivePositiveEnergy,
        MeterRole::ActiveNegativeEnergy,
        MeterRole::ReactivePositiveEnergy,
        MeterRole::ReactiveNegativeEnergy,
        MeterRole::ApparentEnergy,
    ];
}

impl fmt::Display for MeterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MeterRole::ActivePower => "active power",
            MeterRole::ReactivePower => "reactive power",
            MeterRole::ApparentPower => "apparent power",
            MeterRole::ActivePositiveEnergy => "active positive energy",
            MeterRole::ActiveNegativeEnergy => "active negative energy",
            MeterRole::ReactivePositiveEnergy => "reactive positive energy",
            MeterRole::ReactiveNegativeEnergy => "reactive negative energy",
            MeterRole::ApparentEnergy => "apparent energy",
        })
    }
}

/// The generic meter contract.
///
/// An accessor returning `None` means the meter does not provide that metric.
/// A returned channel may still hold no value if it was never decoded.
///
/// Each channel is read on its own: two accessors read while a poll is running
/// may return values of different cycles. Read them inside
/// `SafeClient::with_nature` to see a single cycle.
pub trait MeterNature: DeviceNature {
    /// Channel backing `role`, if this meter maps it.
    fn channel_for(&self, role: MeterRole) -> Option<&ChannelRef>;

    fn active_power(&self) -> Option<&ChannelRef> {
        self.channel_for(MeterRole::ActivePower)
    }

    fn reactive_power(&self) -> Option<&ChannelRef> {
        self.channel_for(MeterRole::ReactivePower)
    }

    fn apparent_power(&self) -> Option<&ChannelRef> {
        self.channel_for(MeterRole::ApparentPower)
    }

    fn active_positive_energy(&self) -> Option<&ChannelRef> {
        self.channel_for(MeterRole::ActivePositiveEnergy)
    }

    fn active_negative_energy(&self) -> Option<&ChannelRef> {
        self.channel_for(MeterRole::ActiveNegativeEnergy)
    }

    fn reactive_positive_energy(&self) -> Option<&ChannelRef> {
        self.channel_for(MeterRole::ReactivePositiveEnergy)
    }

    fn reactive_negative_energy(&self) -> Option<&ChannelRef> {
        self.channel_for(MeterRole::ReactiveNegativeEnergy)
    }

    fn apparent_energy(&self) -> Option<&ChannelRef> {
        self.channel_for(MeterRole::ApparentEnergy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{channel::Channel, element::Element, range::Range};

    /// A meter exposing only active power.
    struct PowerOnlyMeter {
        protocol: Protocol,
    }

    impl DeviceNature for PowerOnlyMeter {
        fn id(&self) -> &str {
            "power-only"
        }

        fn protocol(&self) -> &Protocol {
            &self.protocol
        }
    }

    impl MeterNature for PowerOnlyMeter {
        fn channel_for(&self, role: MeterRole) -> Option<&ChannelRef> {
            match role {
                MeterRole::ActivePower => self.protocol.channel("P"),
                _ => None,
            }
        }
    }

    #[test]
    fn unmapped_roles_are_absent() {
        let power = Channel::new("P").unit("W").into_ref();
        let meter = PowerOnlyMeter {
            protocol: Protocol::new(vec![
                Range::new(0, vec![Element::signed_word(0, power)]).unwrap(),
            ])
            .unwrap(),
        };

        assert_eq!(meter.active_power().map(|c| c.get()), Some(None));
        assert!(meter.apparent_energy().is_none());
        assert!(meter.reactive_power().is_none());

        meter.protocol().ranges().next().unwrap().decode(&[0xFF, 0xFE]).unwrap();
        assert_eq!(meter.active_power().and_then(|c| c.get()), Some(-2));
    }
}
