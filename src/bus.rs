//! RS485 bus parameters of the meter's Modbus RTU interface.

use std::fmt;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unsupported baud rate {0}, expected one of 4800, 9600, 19200, 38400")]
    BaudRateNotSupported(u32),
    #[error("Modbus address {0} out of range (1-247)")]
    AddressOutOfRange(u8),
}

/// Baud rates offered by the meter's serial interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(try_from = "u32"))]
pub enum BaudRate {
    B4800,
    #[default]
    B9600,
    B19200,
    B38400,
}

impl BaudRate {
    pub const ALL: [BaudRate; 4] = [
        BaudRate::B4800,
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
    ];
}

impl From<BaudRate> for u32 {
    fn from(baud_rate: BaudRate) -> u32 {
        match baud_rate {
            BaudRate::B4800 => 4800,
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|rate| u32::from(*rate) == value)
            .ok_or(Error::BaudRateNotSupported(value))
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u32::from(*self))
    }
}

/// Modbus slave address of a meter on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(try_from = "u8"))]
pub struct SlaveAddress(u8);

impl SlaveAddress {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 247;
}

impl Default for SlaveAddress {
    fn default() -> Self {
        Self(1)
    }
}

impl std::ops::Deref for SlaveAddress {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<u8> for SlaveAddress {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::AddressOutOfRange(value))
        }
    }
}

impl fmt::Display for SlaveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn baud_rate_conversion() {
        assert_eq!(BaudRate::try_from(19200), Ok(BaudRate::B19200));
        assert_eq!(u32::from(BaudRate::B38400), 38400);
        assert_eq!(BaudRate::default().to_string(), "9600");
        assert_matches!(
            BaudRate::try_from(1200),
            Err(Error::BaudRateNotSupported(1200))
        );
    }

    #[test]
    fn slave_address_bounds() {
        assert_matches!(SlaveAddress::try_from(0), Err(Error::AddressOutOfRange(0)));
        assert_eq!(*SlaveAddress::try_from(1).unwrap(), 1);
        assert_eq!(*SlaveAddress::try_from(247).unwrap(), 247);
        assert_matches!(
            SlaveAddress::try_from(248),
            Err(Error::AddressOutOfRange(248))
        );
        assert_eq!(SlaveAddress::try_from(0x0a).unwrap().to_string(), "0x0a");
    }
}
