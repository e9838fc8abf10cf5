//! 16-bit device and channel identifiers.

use std::fmt;
use std::str::FromStr;

/// A device address or channel number, sent on the wire as two bytes LE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identifier(u16);

impl Identifier {
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Keep only the low two bytes of `value`.
    ///
    /// This is lossy: `0x1_0065` and `0x65` produce the same identifier.
    /// Use `Identifier::try_from` when the exact value must survive.
    pub const fn truncating(value: u32) -> Self {
        Self((value & 0xFFFF) as u16)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    pub const fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }
}

impl From<u16> for Identifier {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Identifier> for u16 {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl TryFrom<u32> for Identifier {
    type Error = ParseIdentifierError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        u16::try_from(value)
            .map(Self)
            .map_err(|_| ParseIdentifierError::OutOfRange(u64::from(value)))
    }
}

impl FromStr for Identifier {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: u64 = trimmed
            .parse()
            .map_err(|_| ParseIdentifierError::Invalid(trimmed.to_string()))?;
        u16::try_from(value)
            .map(Self)
            .map_err(|_| ParseIdentifierError::OutOfRange(value))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from converting user input into an [`Identifier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdentifierError {
    #[error("not a number: {0:?}")]
    Invalid(String),

    #[error("{0} does not fit in 16 bits")]
    OutOfRange(u64),
}

/// Parse a comma-separated identifier list such as `"100,101, 200"`.
pub fn parse_identifier_list(input: &str) -> Result<Vec<Identifier>, ParseIdentifierError> {
    input
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}
