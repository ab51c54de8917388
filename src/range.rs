//! Contiguous register spans fetched with a single read.

use crate::{
    channel::ChannelRef,
    element::{registers_to_bytes, Element},
    error::{ConfigError, FormatError},
};

/// Largest number of holding registers a single Modbus read may request.
pub const MAX_READ_QUANTITY: u16 = 125;

/// Number of addressable registers; no range may reach past it.
const ADDRESS_SPACE: usize = 0x1_0000;

/// An ordered, gap free run of [`Element`]s starting at `address`.
#[derive(Debug, Clone)]
pub struct Range {
    address: u16,
    length: u16,
    elements: Vec<Element>,
}

impl Range {
    /// Assembles a range and checks that its elements tile it without gaps.
    pub fn new(address: u16, elements: Vec<Element>) -> Result<Self, ConfigError> {
        let first = elements.first().ok_or(ConfigError::EmptyRange { address })?;
        if first.address() != address {
            return Err(ConfigError::MisalignedElement {
                range: address,
                element: first.address(),
            });
        }

        let mut next = usize::from(address);
        for element in &elements {
            if usize::from(element.address()) != next {
                return Err(ConfigError::NonContiguousElement {
                    expected: u16::try_from(next).unwrap_or(u16::MAX),
                    actual: element.address(),
                });
            }
            next += usize::from(element.len());
        }

        let length = next - usize::from(address);
        if next > ADDRESS_SPACE {
            return Err(ConfigError::AddressOverflow { address, length });
        }
        if length > usize::from(MAX_READ_QUANTITY) {
            return Err(ConfigError::RangeTooLong {
                address,
                length,
                max: MAX_READ_QUANTITY,
            });
        }

        Ok(Self {
            address,
            length: length as u16,
            elements,
        })
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    /// Number of registers to request from the device.
    pub fn len(&self) -> u16 {
        self.length
    }

    /// Number of bytes `decode` expects.
    pub fn byte_len(&self) -> usize {
        usize::from(self.length) * 2
    }

    /// One past the last register of this range.
    pub fn end(&self) -> u32 {
        u32::from(self.address) + u32::from(self.length)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Channels bound by the non-dummy elements, in address order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelRef> {
        self.elements.iter().filter_map(Element::channel)
    }

    /// Decodes a buffer of exactly `byte_len()` bytes into the bound channels.
    ///
    /// Nothing is written unless every element decodes.
    pub fn decode(&self, bytes: &[u8]) -> Result<(), FormatError> {
        if bytes.len() != self.byte_len() {
            return Err(FormatError::RangeLength {
                address: self.address,
                expected: self.byte_len(),
                actual: bytes.len(),
            });
        }

        let mut pending = Vec::with_capacity(self.elements.len());
        let mut rest = bytes;
        for element in &self.elements {
            let (span, tail) =
                rest.split_at_checked(element.byte_len())
                    .ok_or(FormatError::ElementTooShort {
                        address: element.address(),
                        expected: element.byte_len(),
                        actual: rest.len(),
                    })?;
            if let (Some(raw), Some(channel)) = (element.decode(span)?, element.channel()) {
                pending.push((channel, raw));
            }
            rest = tail;
        }

        for (channel, raw) in pending {
            channel.set_raw(raw);
            log::trace!("{channel}");
        }
        Ok(())
    }

    /// Same as [`Range::decode`] for register words as returned by Modbus clients.
    pub fn decode_registers(&self, registers: &[u16]) -> Result<(), FormatError> {
        self.decode(&registers_to_bytes(registers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use assert_matches::assert_matches;

    fn power_range() -> (Range, ChannelRef, ChannelRef) {
        let power = Channel::new("ActivePower").unit("W").multiplier(10).into_ref();
        let phase = Channel::new("ActivePowerPhase1").unit("W").multiplier(10).into_ref();
        let range = Range::new(
            0xc568,
            vec![
                Element::signed_doubleword(0xc568, power.clone()),
                Element::dummy(0xc56a, 0xc56b).unwrap(),
                Element::signed_doubleword(0xc56c, phase.clone()),
            ],
        )
        .unwrap();
        (range, power, phase)
    }

    #[test]
    fn scaled_signed_doubleword() {
        let (range, power, _) = power_range();
        assert_eq!(range.len(), 6);
        range
            .decode(&[0x00, 0x00, 0x03, 0xE8, 0, 0, 0, 0, 0, 0, 0, 0])
            .unwrap();
        assert_eq!(power.get(), Some(10000));
    }

    #[test]
    fn dummy_shifts_following_elements() {
        let (range, power, phase) = power_range();
        range
            .decode(&[0, 0, 0, 1, 0xAA, 0xBB, 0xCC, 0xDD, 0, 0, 0, 2])
            .unwrap();
        assert_eq!(power.get(), Some(10));
        assert_eq!(phase.get(), Some(20));
        assert_eq!(range.channels().count(), 2);
        assert_eq!(range.elements()[2].address(), 0xc56c);
    }

    #[test]
    fn wrong_length_leaves_channels_untouched() {
        let first = Channel::new("First").into_ref();
        let second = Channel::new("Second").into_ref();
        let third = Channel::new("Third").into_ref();
        let range = Range::new(
            0x100,
            vec![
                Element::unsigned_doubleword(0x100, first.clone()),
                Element::unsigned_doubleword(0x102, second.clone()),
                Element::unsigned_word(0x104, third.clone()),
            ],
        )
        .unwrap();
        assert_eq!(range.len(), 5);
        range.decode(&[0, 0, 0, 1, 0, 0, 0, 2, 0, 3]).unwrap();

        assert_matches!(
            range.decode(&[0xFF; 8]),
            Err(FormatError::RangeLength {
                address: 0x100,
                expected: 10,
                actual: 8
            })
        );
        assert_matches!(
            range.decode(&[0xFF; 12]),
            Err(FormatError::RangeLength { .. })
        );
        assert_eq!(first.get(), Some(1));
        assert_eq!(second.get(), Some(2));
        assert_eq!(third.get(), Some(3));
    }

    #[test]
    fn failed_first_decode_keeps_absent() {
        let (range, power, phase) = power_range();
        assert!(range.decode(&[]).is_err());
        assert_eq!(power.get(), None);
        assert_eq!(phase.get(), None);
    }

    #[test]
    fn register_words() {
        let (range, power, phase) = power_range();
        range
            .decode_registers(&[0xFFFF, 0xFFFF, 0, 0, 0x0000, 0x0005])
            .unwrap();
        assert_eq!(power.get(), Some(-10));
        assert_eq!(phase.get(), Some(50));
        assert!(range.decode_registers(&[0; 5]).is_err());
    }

    #[test]
    fn construction_checks() {
        let channel = || Channel::new("C").into_ref();
        assert_matches!(
            Range::new(0x10, vec![]),
            Err(ConfigError::EmptyRange { address: 0x10 })
        );
        assert_matches!(
            Range::new(0x10, vec![Element::unsigned_word(0x11, channel())]),
            Err(ConfigError::MisalignedElement {
                range: 0x10,
                element: 0x11
            })
        );
        assert_matches!(
            Range::new(
                0x10,
                vec![
                    Element::unsigned_doubleword(0x10, channel()),
                    Element::unsigned_word(0x13, channel()),
                ]
            ),
            Err(ConfigError::NonContiguousElement {
                expected: 0x12,
                actual: 0x13
            })
        );
        assert_matches!(
            Range::new(
                0,
                vec![
                    Element::dummy(0, 124).unwrap(),
                    Element::unsigned_word(125, channel()),
                ]
            ),
            Err(ConfigError::RangeTooLong { length: 126, .. })
        );
        assert!(Range::new(0, vec![Element::dummy(0, 124).unwrap()]).is_ok());
    }

    #[test]
    fn range_must_end_inside_address_space() {
        let channel = || Channel::new("C").into_ref();
        assert_matches!(
            Range::new(0xFFFF, vec![Element::unsigned_doubleword(0xFFFF, channel())]),
            Err(ConfigError::AddressOverflow {
                address: 0xFFFF,
                length: 2
            })
        );
        assert_matches!(
            Range::new(
                0xFFFE,
                vec![
                    Element::unsigned_word(0xFFFE, channel()),
                    Element::signed_doubleword(0xFFFF, channel()),
                ]
            ),
            Err(ConfigError::AddressOverflow { length: 3, .. })
        );

        let range =
            Range::new(0xFFFE, vec![Element::unsigned_doubleword(0xFFFE, channel())]).unwrap();
        assert_eq!(range.end(), 0x1_0000);
    }
}
