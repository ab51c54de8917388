//! The complete set of ranges a device needs polled.
//!
//! A [`Protocol`] is assembled once, when the device is defined, and rejects
//! malformed definitions up front: duplicate channel names and overlapping
//! ranges never reach the polling loop.

use crate::{
    channel::ChannelRef,
    error::{ConfigError, FormatError},
    range::Range,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Validated, ordered collection of [`Range`]s with a name index over their channels.
#[derive(Debug, Clone)]
pub struct Protocol {
    ranges: Vec<Range>,
    channels: Vec<ChannelRef>,
    by_name: HashMap<String, usize>,
}

impl Protocol {
    pub fn new(ranges: Vec<Range>) -> Result<Self, ConfigError> {
        if ranges.is_empty() {
            return Err(ConfigError::EmptyProtocol);
        }

        let mut spans: Vec<&Range> = ranges.iter().collect();
        spans.sort_by_key(|range| range.address());
        for pair in spans.windows(2) {
            if u32::from(pair[1].address()) < pair[0].end() {
                return Err(ConfigError::OverlappingRanges {
                    first: pair[0].address(),
                    second: pair[1].address(),
                });
            }
        }

        let mut channels = Vec::new();
        let mut by_name = HashMap::new();
        for channel in ranges.iter().flat_map(|range| range.channels()) {
            if by_name
                .insert(channel.name().to_string(), channels.len())
                .is_some()
            {
                return Err(ConfigError::DuplicateChannel(channel.name().to_string()));
            }
            channels.push(channel.clone());
        }

        log::debug!(
            "Protocol with {} ranges and {} channels",
            ranges.len(),
            channels.len()
        );
        Ok(Self {
            ranges,
            channels,
            by_name,
        })
    }

    /// Ranges in declaration order.
    pub fn ranges(&self) -> impl Iterator<Item = &Range> {
        self.ranges.iter()
    }

    /// Channels in declaration order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelRef> {
        self.channels.iter()
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelRef> {
        self.by_name.get(name).map(|index| &self.channels[*index])
    }

    /// Runs one poll cycle.
    ///
    /// `fetch` is called once per range and returns the raw bytes for it. A range
    /// whose fetch or decode fails keeps its previous channel values; the other
    /// ranges are decoded regardless.
    pub fn poll<E, F>(&self, mut fetch: F) -> PollReport<E>
    where
        F: FnMut(&Range) -> Result<Vec<u8>, E>,
        E: From<FormatError> + fmt::Display,
    {
        let mut report = PollReport::default();
        for range in &self.ranges {
            let result = fetch(range).and_then(|bytes| range.decode(&bytes).map_err(E::from));
            report.record(range, result);
        }
        report
    }

    /// Current value of every channel, keyed by name.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(
            self.channels
                .iter()
                .map(|channel| {
                    (
                        channel.name().to_string(),
                        Reading {
                            value: channel.get(),
                            unit: channel.unit_str().to_string(),
                        },
                    )
                })
                .collect(),
        )
    }
}

/// A range that could not be decoded during a poll cycle.
#[derive(Debug)]
pub struct RangeFailure<E> {
    pub address: u16,
    pub length: u16,
    pub error: E,
}

/// Outcome of one poll cycle over all ranges of a protocol.
#[derive(Debug)]
pub struct PollReport<E> {
    /// Start addresses of the ranges that were decoded.
    pub decoded: Vec<u16>,
    pub failures: Vec<RangeFailure<E>>,
}

impl<E> Default for PollReport<E> {
    fn default() -> Self {
        Self {
            decoded: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<E: fmt::Display> PollReport<E> {
    /// Adds the outcome for `range`.
    pub fn record(&mut self, range: &Range, result: Result<(), E>) {
        match result {
            Ok(()) => self.decoded.push(range.address()),
            Err(error) => {
                log::warn!(
                    "Reading range {:#06x} ({} registers) failed: {error}",
                    range.address(),
                    range.len()
                );
                self.failures.push(RangeFailure {
                    address: range.address(),
                    length: range.len(),
                    error,
                });
            }
        }
    }

    /// `true` when every range decoded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A channel value together with its unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Reading {
    pub value: Option<i64>,
    pub unit: String,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{value} {}", self.unit),
            None => write!(f, "- {}", self.unit),
        }
    }
}

/// Channel values of one device taken at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Snapshot(pub BTreeMap<String, Reading>);

impl Snapshot {
    pub fn get(&self, name: &str) -> Option<&Reading> {
        self.0.get(name)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, reading) in &self.0 {
            writeln!(f, "{name}: {reading}")?;
        }
        Ok(())
    }
}
