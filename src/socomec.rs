//! Register map of Socomec three phase energy meters (Countis / Diris family).
//!
//! Two holding register ranges are polled:
//!
//! | Range    | Registers | Content                                            |
//! |----------|-----------|----------------------------------------------------|
//! | `0xc568` | 20        | total and per phase power, signed, in 10 W steps   |
//! | `0xc652` | 10        | energy counters, unsigned                          |

use crate::{
    channel::{Channel, ChannelRef},
    element::Element,
    error::ConfigError,
    nature::{DeviceNature, MeterNature, MeterRole},
    protocol::Protocol,
    range::Range,
};
use std::fmt;

pub const ACTIVE_POWER: &str = "ActivePower";
pub const REACTIVE_POWER: &str = "ReactivePower";
pub const APPARENT_POWER: &str = "ApparentPower";
pub const ACTIVE_POWER_PHASE: [&str; 3] = [
    "ActivePowerPhase1",
    "ActivePowerPhase2",
    "ActivePowerPhase3",
];
pub const REACTIVE_POWER_PHASE: [&str; 3] = [
    "ReactivePowerPhase1",
    "ReactivePowerPhase2",
    "ReactivePowerPhase3",
];
pub const ACTIVE_POSITIVE_ENERGY: &str = "ActivePositiveEnergy";
pub const REACTIVE_POSITIVE_ENERGY: &str = "ReactivePositiveEnergy";
pub const APPARENT_ENERGY: &str = "ApparentEnergy";
pub const ACTIVE_NEGATIVE_ENERGY: &str = "ActiveNegativeEnergy";
pub const REACTIVE_NEGATIVE_ENERGY: &str = "ReactiveNegativeEnergy";

pub const POWER_RANGE_ADDR: u16 = 0xc568;
pub const ENERGY_RANGE_ADDR: u16 = 0xc652;

/// Power values are transmitted in units of 10 W / 10 var / 10 VA.
const POWER_MULTIPLIER: i32 = 10;

/// One of the three line conductors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    L1,
    L2,
    L3,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::L1, Phase::L2, Phase::L3];

    fn index(&self) -> usize {
        match self {
            Phase::L1 => 0,
            Phase::L2 => 1,
            Phase::L3 => 2,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.index() + 1)
    }
}

fn power(name: &str, unit: &str) -> ChannelRef {
    Channel::new(name)
        .unit(unit)
        .multiplier(POWER_MULTIPLIER)
        .into_ref()
}

fn energy(name: &str, unit: &str) -> ChannelRef {
    Channel::new(name).unit(unit).into_ref()
}

/// A Socomec meter instance and its decoded channels.
#[derive(Debug)]
pub struct SocomecMeter {
    id: String,
    protocol: Protocol,
}

impl SocomecMeter {
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        let protocol = Self::define_protocol()?;
        log::debug!("Defined Socomec meter '{id}'");
        Ok(Self { id, protocol })
    }

    fn define_protocol() -> Result<Protocol, ConfigError> {
        let [p1, p2, p3] = ACTIVE_POWER_PHASE;
        let [q1, q2, q3] = REACTIVE_POWER_PHASE;
        Protocol::new(vec![
            Range::new(
                POWER_RANGE_ADDR,
                vec![
                    Element::signed_doubleword(0xc568, power(ACTIVE_POWER, "W")),
                    Element::signed_doubleword(0xc56a, power(REACTIVE_POWER, "var")),
                    Element::signed_doubleword(0xc56c, power(APPARENT_POWER, "VA")),
                    Element::dummy(0xc56e, 0xc56f)?,
                    Element::signed_doubleword(0xc570, power(p1, "W")),
                    Element::signed_doubleword(0xc572, power(p2, "W")),
                    Element::signed_doubleword(0xc574, power(p3, "W")),
                    Element::signed_doubleword(0xc576, power(q1, "var")),
                    Element::signed_doubleword(0xc578, power(q2, "var")),
                    Element::signed_doubleword(0xc57a, power(q3, "var")),
                ],
            )?,
            Range::new(
                ENERGY_RANGE_ADDR,
                vec![
                    Element::unsigned_doubleword(0xc652, energy(ACTIVE_POSITIVE_ENERGY, "kWh")),
                    Element::unsigned_doubleword(0xc654, energy(REACTIVE_POSITIVE_ENERGY, "kvarh")),
                    Element::unsigned_doubleword(0xc656, energy(APPARENT_ENERGY, "kVAh")),
                    Element::unsigned_doubleword(0xc658, energy(ACTIVE_NEGATIVE_ENERGY, "kWh")),
                    Element::unsigned_doubleword(0xc65a, energy(REACTIVE_NEGATIVE_ENERGY, "kvarh")),
                ],
            )?,
        ])
    }

    pub fn active_power_phase(&self, phase: Phase) -> Option<&ChannelRef> {
        self.protocol.channel(ACTIVE_POWER_PHASE[phase.index()])
    }

    pub fn reactive_power_phase(&self, phase: Phase) -> Option<&ChannelRef> {
        self.protocol.channel(REACTIVE_POWER_PHASE[phase.index()])
    }
}

impl DeviceNature for SocomecMeter {
    fn id(&self) -> &str {
        &self.id
    }

    fn protocol(&self) -> &Protocol {
        &self.protocol
    }
}

impl MeterNature for SocomecMeter {
    fn channel_for(&self, role: MeterRole) -> Option<&ChannelRef> {
        let name = match role {
            MeterRole::ActivePower => ACTIVE_POWER,
            MeterRole::ReactivePower => REACTIVE_POWER,
            MeterRole::ApparentPower => APPARENT_POWER,
            MeterRole::ActivePositiveEnergy => ACTIVE_POSITIVE_ENERGY,
            MeterRole::ActiveNegativeEnergy => ACTIVE_NEGATIVE_ENERGY,
            MeterRole::ReactivePositiveEnergy => REACTIVE_POSITIVE_ENERGY,
            MeterRole::ReactiveNegativeEnergy => REACTIVE_NEGATIVE_ENERGY,
            MeterRole::ApparentEnergy => APPARENT_ENERGY,
        };
        self.protocol.channel(name)
    }
}
