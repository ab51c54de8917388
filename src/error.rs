//! Error types of the register decoding engine.
//!
//! [`ConfigError`] is raised while a device definition is assembled and means
//! the device cannot be activated. [`FormatError`] is raised while decoding a
//! fetched buffer and only affects the range being decoded.

/// A malformed device definition, detected at construction time.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Channel name '{0}' is used more than once")]
    DuplicateChannel(String),

    #[error("Range at {address:#06x} contains no elements")]
    EmptyRange { address: u16 },

    #[error("Range at {range:#06x} starts with an element at {element:#06x}")]
    MisalignedElement { range: u16, element: u16 },

    #[error("Element at {actual:#06x} is not contiguous, expected it at {expected:#06x}")]
    NonContiguousElement { expected: u16, actual: u16 },

    #[error("Range at {address:#06x} spans {length} registers, at most {max} can be read at once")]
    RangeTooLong { address: u16, length: usize, max: u16 },

    #[error("Range at {address:#06x} with {length} registers runs past the last register address")]
    AddressOverflow { address: u16, length: usize },

    #[error("Range at {second:#06x} overlaps range at {first:#06x}")]
    OverlappingRanges { first: u16, second: u16 },

    #[error("Dummy span {from:#06x}..={to:#06x} is inverted")]
    InvalidDummySpan { from: u16, to: u16 },

    #[error("Protocol contains no ranges")]
    EmptyProtocol,
}

/// A fetched buffer that does not match the declared register layout.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Range at {address:#06x} expects {expected} bytes, got {actual}")]
    RangeLength {
        address: u16,
        expected: usize,
        actual: usize,
    },

    #[error("Element at {address:#06x} expects {expected} bytes, got {actual}")]
    ElementTooShort {
        address: u16,
        expected: usize,
        actual: usize,
    },
}
