use strum::EnumIs;
use thiserror::Error;

use crate::types::SType;

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, Error)]
pub enum Error {
    /// The buffer ran out in the middle of a value.
    #[error("Unexpected end of input: {needed} more byte(s) were required.")]
    UnexpectedEndOfInput { needed: usize },

    /// A VLQ integer did not terminate within ten bytes.
    #[error("Variable-length integer is longer than the 10 bytes allowed for a 64-bit value.")]
    VlqOverflow,

    /// A decoded integer does not fit the width the format prescribes.
    #[error("Decoded value {value} exceeds the maximum of {max} allowed at this position.")]
    ValueOutOfRange { value: u64, max: u64 },

    /// Leading byte of a type descriptor is not a known type code.
    #[error("Byte {0:#04x} is not a valid type code.")]
    InvalidTypeCode(u8),

    /// Leading byte of an expression (or sigma proposition) is not a known opcode.
    #[error("Byte {0:#04x} is not a valid opcode.")]
    InvalidOpcode(u8),

    /// Header byte uses reserved bits or an unsupported flag combination.
    #[error("Invalid ErgoTree header {header:#04x}: {reason}.")]
    InvalidHeader { header: u8, reason: &'static str },

    /// The bytes of a value cannot represent the declared type.
    #[error("Value does not match its declared type: expected {expected}, found {found}.")]
    TypeValueMismatch { expected: String, found: String },

    /// Type descriptor nesting exceeds the configured limit.
    #[error("Type descriptor nesting exceeds the maximum depth of {max}.")]
    TypeDepthExceeded { max: usize },

    /// Expression nesting exceeds the configured limit.
    #[error("Expression nesting exceeds the maximum depth of {max}.")]
    ExprDepthExceeded { max: usize },

    /// Constants of this type have no byte representation.
    #[error("Constants of type `{0}` cannot be serialized.")]
    NonSerializableType(SType),

    /// A constant placeholder points outside the constant segment.
    #[error(
        "Constant placeholder refers to index {index}, but the constant segment holds {len} constant(s)."
    )]
    InvalidPlaceholder { index: u32, len: usize },

    /// The size prefix disagrees with the number of bytes that follow it.
    #[error("Header declares a body of {declared} byte(s), but {actual} byte(s) follow.")]
    SizeMismatch { declared: u32, actual: usize },

    /// Bytes remain after the root expression.
    #[error("{count} trailing byte(s) after the root expression.")]
    TrailingBytes { count: usize },

    /// The base16 input is malformed.
    #[error("Invalid base16 input: {reason}.")]
    InvalidHex { reason: String },

    /// A strict accessor was called on a constant of a different type.
    #[error("Type mismatch: expected a constant of type `{expected}`, found `{found}`.")]
    TypeMismatch { expected: SType, found: SType },
}

/// A decoding failure together with the byte offset at which it was detected.
///
/// For base16 input that fails before binary decoding starts, `position` is the
/// offending character offset in the string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to decode ErgoTree at offset {position}: {source}")]
pub struct DecodeError {
    pub position: usize,
    #[source]
    pub source: Error,
}

impl DecodeError {
    pub fn new(position: usize, source: Error) -> Self {
        Self { position, source }
    }
}

impl From<hex::FromHexError> for DecodeError {
    fn from(value: hex::FromHexError) -> Self {
        let position = match value {
            hex::FromHexError::InvalidHexCharacter { index, .. } => index,
            _ => 0,
        };
        DecodeError::new(
            position,
            Error::InvalidHex {
                reason: value.to_string(),
            },
        )
    }
}
