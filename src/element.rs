//! Decode rules for a fixed-width span of registers.

use crate::{
    channel::ChannelRef,
    error::{ConfigError, FormatError},
    range::MAX_READ_QUANTITY,
};

/// Number of registers a numeric element occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// One 16 bit register.
    Word,
    /// Two consecutive registers forming a 32 bit value.
    DoubleWord,
}

impl Width {
    pub const fn registers(&self) -> u16 {
        match self {
            Width::Word => 1,
            Width::DoubleWord => 2,
        }
    }
}

/// Order of the two registers of a [`Width::DoubleWord`].
///
/// Bytes inside a register are always big endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordOrder {
    /// The register at the lower address holds the most significant word.
    #[default]
    HighLow,
    /// The register at the lower address holds the least significant word.
    LowHigh,
}

#[derive(Debug, Clone)]
enum Kind {
    Unsigned {
        width: Width,
        order: WordOrder,
        channel: ChannelRef,
    },
    Signed {
        width: Width,
        order: WordOrder,
        channel: ChannelRef,
    },
    Dummy {
        length: u16,
    },
}

/// One entry of a [`Range`](crate::range::Range): a numeric value bound to a
/// channel, or padding over reserved registers.
#[derive(Debug, Clone)]
pub struct Element {
    address: u16,
    kind: Kind,
}

impl Element {
    pub fn unsigned_word(address: u16, channel: ChannelRef) -> Self {
        Self::unsigned(address, Width::Word, channel)
    }

    pub fn unsigned_doubleword(address: u16, channel: ChannelRef) -> Self {
        Self::unsigned(address, Width::DoubleWord, channel)
    }

    pub fn signed_word(address: u16, channel: ChannelRef) -> Self {
        Self::signed(address, Width::Word, channel)
    }

    pub fn signed_doubleword(address: u16, channel: ChannelRef) -> Self {
        Self::signed(address, Width::DoubleWord, channel)
    }

    pub fn unsigned(address: u16, width: Width, channel: ChannelRef) -> Self {
        Self {
            address,
            kind: Kind::Unsigned {
                width,
                order: WordOrder::default(),
                channel,
            },
        }
    }

    pub fn signed(address: u16, width: Width, channel: ChannelRef) -> Self {
        Self {
            address,
            kind: Kind::Signed {
                width,
                order: WordOrder::default(),
                channel,
            },
        }
    }

    /// Padding over the reserved registers `from..=to`.
    ///
    /// The span must fit in a single read of [`MAX_READ_QUANTITY`] registers.
    pub fn dummy(from: u16, to: u16) -> Result<Self, ConfigError> {
        if to < from {
            return Err(ConfigError::InvalidDummySpan { from, to });
        }
        let length = u32::from(to) - u32::from(from) + 1;
        if length > u32::from(MAX_READ_QUANTITY) {
            return Err(ConfigError::RangeTooLong {
                address: from,
                length: length as usize,
                max: MAX_READ_QUANTITY,
            });
        }
        Ok(Self {
            address: from,
            kind: Kind::Dummy {
                length: length as u16,
            },
        })
    }

    /// Overrides the word order of a doubleword element. No effect on words and dummies.
    pub fn word_order(mut self, word_order: WordOrder) -> Self {
        match &mut self.kind {
            Kind::Unsigned { order, .. } | Kind::Signed { order, .. } => *order = word_order,
            Kind::Dummy { .. } => {}
        }
        self
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    /// Number of registers consumed by this element.
    pub fn len(&self) -> u16 {
        match &self.kind {
            Kind::Unsigned { width, .. } | Kind::Signed { width, .. } => width.registers(),
            Kind::Dummy { length } => *length,
        }
    }

    pub fn byte_len(&self) -> usize {
        usize::from(self.len()) * 2
    }

    /// The bound channel; always `None` for a dummy.
    pub fn channel(&self) -> Option<&ChannelRef> {
        match &self.kind {
            Kind::Unsigned { channel, .. } | Kind::Signed { channel, .. } => Some(channel),
            Kind::Dummy { .. } => None,
        }
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self.kind, Kind::Dummy { .. })
    }

    /// Decodes the raw (unscaled) value from the start of `bytes`.
    ///
    /// Returns `Ok(None)` for a dummy. Bytes past the element's width are ignored.
    pub fn decode(&self, bytes: &[u8]) -> Result<Option<i64>, FormatError> {
        if bytes.len() < self.byte_len() {
            return Err(FormatError::ElementTooShort {
                address: self.address,
                expected: self.byte_len(),
                actual: bytes.len(),
            });
        }
        let value = match &self.kind {
            Kind::Dummy { .. } => return Ok(None),
            Kind::Unsigned {
                width: Width::Word,
                ..
            } => i64::from(u16::from_be_bytes([bytes[0], bytes[1]])),
            Kind::Signed {
                width: Width::Word,
                ..
            } => i64::from(i16::from_be_bytes([bytes[0], bytes[1]])),
            Kind::Unsigned {
                width: Width::DoubleWord,
                order,
                ..
            } => i64::from(u32::from_be_bytes(doubleword(bytes, *order))),
            Kind::Signed {
                width: Width::DoubleWord,
                order,
                ..
            } => i64::from(i32::from_be_bytes(doubleword(bytes, *order))),
        };
        Ok(Some(value))
    }
}

/// Puts the four bytes of a doubleword into most-significant-first order.
fn doubleword(bytes: &[u8], order: WordOrder) -> [u8; 4] {
    match order {
        WordOrder::HighLow => [bytes[0], bytes[1], bytes[2], bytes[3]],
        WordOrder::LowHigh => [bytes[2], bytes[3], bytes[0], bytes[1]],
    }
}

/// Flattens register words, as returned by Modbus clients, into big endian bytes.
pub fn registers_to_bytes(registers: &[u16]) -> Vec<u8> {
    registers.iter().flat_map(|r| r.to_be_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use assert_matches::assert_matches;

    fn channel() -> ChannelRef {
        Channel::new("Test").into_ref()
    }

    #[test]
    fn signed_and_unsigned_differ_on_same_bytes() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(
            Element::unsigned_doubleword(0, channel()).decode(&bytes),
            Ok(Some(4294967295))
        );
        assert_eq!(
            Element::signed_doubleword(0, channel()).decode(&bytes),
            Ok(Some(-1))
        );
        assert_eq!(
            Element::unsigned_word(0, channel()).decode(&bytes[..2]),
            Ok(Some(65535))
        );
        assert_eq!(
            Element::signed_word(0, channel()).decode(&bytes[..2]),
            Ok(Some(-1))
        );
    }

    #[test]
    fn values_survive_encoding() {
        for value in [i32::MIN, -100_000, -1, 0, 1, 1000, i32::MAX] {
            let element = Element::signed_doubleword(0, channel());
            assert_eq!(element.decode(&value.to_be_bytes()), Ok(Some(value as i64)));
        }
        for value in [0u32, 1, 0x0001_0000, u32::MAX] {
            let element = Element::unsigned_doubleword(0, channel());
            assert_eq!(element.decode(&value.to_be_bytes()), Ok(Some(value as i64)));
        }
        for value in [0u16, 1, 0x8000, u16::MAX] {
            let element = Element::unsigned_word(0, channel());
            assert_eq!(element.decode(&value.to_be_bytes()), Ok(Some(value as i64)));
        }
        for value in [i16::MIN, -1, 0, i16::MAX] {
            let element = Element::signed_word(0, channel());
            assert_eq!(element.decode(&value.to_be_bytes()), Ok(Some(value as i64)));
        }
    }

    #[test]
    fn low_word_first() {
        let element =
            Element::unsigned_doubleword(0, channel()).word_order(WordOrder::LowHigh);
        assert_eq!(element.decode(&[0x00, 0x02, 0x00, 0x01]), Ok(Some(0x0001_0002)));
    }

    #[test]
    fn short_span_fails() {
        let element = Element::signed_doubleword(0xc568, channel());
        assert_matches!(
            element.decode(&[0x00, 0x00, 0x03]),
            Err(FormatError::ElementTooShort {
                address: 0xc568,
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn dummy_spans_inclusive_range() {
        let dummy = Element::dummy(0xc56e, 0xc56f).unwrap();
        assert_eq!(dummy.len(), 2);
        assert!(dummy.is_dummy());
        assert!(dummy.channel().is_none());
        assert_eq!(dummy.decode(&[1, 2, 3, 4]), Ok(None));
        assert_matches!(
            Element::dummy(0xc56f, 0xc56e),
            Err(ConfigError::InvalidDummySpan { .. })
        );
    }

    #[test]
    fn dummy_longer_than_one_read_rejected() {
        assert_matches!(
            Element::dummy(0, 0xFFFF),
            Err(ConfigError::RangeTooLong {
                address: 0,
                length: 65536,
                max: MAX_READ_QUANTITY
            })
        );
        assert_matches!(
            Element::dummy(0x10, 0x10 + MAX_READ_QUANTITY),
            Err(ConfigError::RangeTooLong { length: 126, .. })
        );
        assert_eq!(
            Element::dummy(0xFF83, 0xFFFF).map(|dummy| dummy.len()),
            Ok(MAX_READ_QUANTITY)
        );
    }

    #[test]
    fn registers_flatten_big_endian() {
        assert_eq!(
            registers_to_bytes(&[0x0000, 0x03E8]),
            vec![0x00, 0x00, 0x03, 0xE8]
        );
    }
}
