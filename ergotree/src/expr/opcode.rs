//! Opcode table.
//!
//! Operations that share a payload layout are grouped into one enum whose discriminants
//! are the opcodes themselves, so decoding dispatches through `from_repr` and encoding
//! is `op as u8`. Opcodes with a layout of their own are plain constants.
use strum::{EnumIter, FromRepr};

pub const TAGGED_VARIABLE: u8 = 0x71;
pub const VAL_USE: u8 = 0x72;
pub const CONSTANT_PLACEHOLDER: u8 = 0x73;
pub const CONCRETE_COLLECTION: u8 = 0x83;
pub const BOOL_COLLECTION: u8 = 0x85;
pub const TUPLE: u8 = 0x86;
pub const SELECT_FIELD: u8 = 0x8c;
pub const BY_INDEX: u8 = 0xb2;
pub const EXTRACT_REGISTER_AS: u8 = 0xc6;
pub const CREATE_PROVE_DH_TUPLE: u8 = 0xce;
pub const DESERIALIZE_CONTEXT: u8 = 0xd4;
pub const DESERIALIZE_REGISTER: u8 = 0xd5;
pub const VAL_DEF: u8 = 0xd6;
pub const BLOCK_VALUE: u8 = 0xd8;
pub const FUNC_VALUE: u8 = 0xd9;
pub const APPLY: u8 = 0xda;
pub const PROPERTY_CALL: u8 = 0xdb;
pub const METHOD_CALL: u8 = 0xdc;
pub const GET_VAR: u8 = 0xe3;

/// Operations without operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr, EnumIter)]
#[repr(u8)]
pub enum NullaryOp {
    True = 0x7f,
    False = 0x80,
    UnitConstant = 0x81,
    GroupGenerator = 0x82,
    Height = 0xa3,
    Inputs = 0xa4,
    Outputs = 0xa5,
    LastBlockUtxoRootHash = 0xa6,
    SelfBox = 0xa7,
    MinerPubkey = 0xac,
    Global = 0xdd,
    Context = 0xfe,
}

/// Operations over a single operand expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr, EnumIter)]
#[repr(u8)]
pub enum UnaryOp {
    LongToByteArray = 0x7a,
    ByteArrayToBigInt = 0x7b,
    ByteArrayToLong = 0x7c,
    Select1 = 0x87,
    Select2 = 0x88,
    Select3 = 0x89,
    Select4 = 0x8a,
    Select5 = 0x8b,
    /// Conjunction of a boolean collection.
    And = 0x96,
    /// Disjunction of a boolean collection.
    Or = 0x97,
    SizeOf = 0xb1,
    ExtractAmount = 0xc1,
    ExtractScriptBytes = 0xc2,
    ExtractBytes = 0xc3,
    ExtractBytesWithNoRef = 0xc4,
    ExtractId = 0xc5,
    ExtractCreationInfo = 0xc7,
    CalcBlake2b256 = 0xcb,
    CalcSha256 = 0xcc,
    CreateProveDlog = 0xcd,
    SigmaPropBytes = 0xd0,
    BoolToSigmaProp = 0xd1,
    OptionGet = 0xe4,
    OptionIsDefined = 0xe6,
    DecodePoint = 0xee,
    LogicalNot = 0xef,
    Negation = 0xf0,
    BitInversion = 0xf1,
    /// Exclusive or of a boolean collection.
    XorOf = 0xff,
}

/// Operations over two operand expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr, EnumIter)]
#[repr(u8)]
pub enum BinaryOp {
    Lt = 0x8f,
    Le = 0x90,
    Gt = 0x91,
    Ge = 0x92,
    Eq = 0x93,
    Neq = 0x94,
    AtLeast = 0x98,
    Minus = 0x99,
    Plus = 0x9a,
    /// Byte-wise xor of two byte arrays.
    Xor = 0x9b,
    Multiply = 0x9c,
    Division = 0x9d,
    Modulo = 0x9e,
    Exponentiate = 0x9f,
    MultiplyGroup = 0xa0,
    Min = 0xa1,
    Max = 0xa2,
    Map = 0xad,
    Exists = 0xae,
    ForAll = 0xaf,
    Append = 0xb3,
    Filter = 0xb5,
    OptionGetOrElse = 0xe5,
    BinOr = 0xec,
    BinAnd = 0xed,
    BitOr = 0xf2,
    BitAnd = 0xf3,
    BinXor = 0xf4,
    BitXor = 0xf5,
}

impl BinaryOp {
    /// Relations and boolean connectives pack two boolean constant operands into
    /// [`BOOL_COLLECTION`] followed by a single bit byte.
    pub const fn packs_boolean_operands(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::Eq
                | BinaryOp::Neq
                | BinaryOp::BinOr
                | BinaryOp::BinAnd
                | BinaryOp::BinXor
        )
    }
}

/// Operations over three operand expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr, EnumIter)]
#[repr(u8)]
pub enum TernaryOp {
    SubstConstants = 0x74,
    If = 0x95,
    Fold = 0xb0,
    Slice = 0xb4,
}

/// Numeric casts: an operand followed by the target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr, EnumIter)]
#[repr(u8)]
pub enum CastOp {
    Downcast = 0x7d,
    Upcast = 0x7e,
}

/// Sigma proposition connectives: a `u32` count followed by the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRepr, EnumIter)]
#[repr(u8)]
pub enum SigmaConnective {
    SigmaAnd = 0xea,
    SigmaOr = 0xeb,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::encoding::magic::LAST_CONSTANT_CODE;

    #[test]
    fn opcodes_are_unique_and_above_constants() {
        let mut seen = BTreeSet::new();
        let grouped = NullaryOp::iter()
            .map(|op| op as u8)
            .chain(UnaryOp::iter().map(|op| op as u8))
            .chain(BinaryOp::iter().map(|op| op as u8))
            .chain(TernaryOp::iter().map(|op| op as u8))
            .chain(CastOp::iter().map(|op| op as u8))
            .chain(SigmaConnective::iter().map(|op| op as u8));
        let single = [
            TAGGED_VARIABLE,
            VAL_USE,
            CONSTANT_PLACEHOLDER,
            CONCRETE_COLLECTION,
            BOOL_COLLECTION,
            TUPLE,
            SELECT_FIELD,
            BY_INDEX,
            EXTRACT_REGISTER_AS,
            CREATE_PROVE_DH_TUPLE,
            DESERIALIZE_CONTEXT,
            DESERIALIZE_REGISTER,
            VAL_DEF,
            BLOCK_VALUE,
            FUNC_VALUE,
            APPLY,
            PROPERTY_CALL,
            METHOD_CALL,
            GET_VAR,
        ];
        for code in grouped.chain(single) {
            assert!(code > LAST_CONSTANT_CODE, "{code:#04x} collides with type codes");
            assert!(seen.insert(code), "{code:#04x} assigned twice");
        }
    }

    #[test]
    fn lookup_by_byte() {
        assert_eq!(BinaryOp::from_repr(0x92), Some(BinaryOp::Ge));
        assert_eq!(UnaryOp::from_repr(0xc7), Some(UnaryOp::ExtractCreationInfo));
        assert_eq!(NullaryOp::from_repr(0xa3), Some(NullaryOp::Height));
        assert_eq!(NullaryOp::from_repr(0x00), None);
    }
}
