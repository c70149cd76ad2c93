//! Typed constant values.
//!
//! A [`Constant`] pairs an [`SType`] with a [`Literal`] whose shape matches it. The
//! pairing is checked by every public constructor, so encoding a constant never fails.
use std::fmt;

use num_bigint::BigInt;

use crate::{
    encoding::magic::MAX_BIGINT_BYTES,
    types::{LiftIntoSType, SType},
    utils::Error,
};

pub mod codec;
pub mod sigma;

pub use sigma::{EcPoint, SigmaBoolean};

/// Value part of a [`Constant`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    /// Signed integer of at most 256 bits.
    BigInt(BigInt),
    GroupElement(EcPoint),
    SigmaProp(SigmaBoolean),
    Coll(CollLiteral),
    /// Tuple components, in order.
    Tup(Vec<Literal>),
    Opt(Option<Box<Literal>>),
    Unit,
}

/// Collection values. `Coll[Byte]` is always held as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollLiteral {
    Bytes(Vec<u8>),
    Items(Vec<Literal>),
}

impl CollLiteral {
    pub fn len(&self) -> usize {
        match self {
            CollLiteral::Bytes(bytes) => bytes.len(),
            CollLiteral::Items(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Literal {
    /// Check that this literal can be encoded under `tpe`.
    pub fn conforms_to(&self, tpe: &SType) -> bool {
        match (tpe, self) {
            (SType::SBoolean, Literal::Boolean(_))
            | (SType::SByte, Literal::Byte(_))
            | (SType::SShort, Literal::Short(_))
            | (SType::SInt, Literal::Int(_))
            | (SType::SLong, Literal::Long(_))
            | (SType::SGroupElement, Literal::GroupElement(_))
            | (SType::SUnit, Literal::Unit) => true,
            (SType::SBigInt, Literal::BigInt(v)) => {
                v.to_signed_bytes_be().len() <= MAX_BIGINT_BYTES
            }
            (SType::SSigmaProp, Literal::SigmaProp(sb)) => sb.is_encodable(),
            (SType::SColl(elem), Literal::Coll(coll)) => {
                coll.len() <= u16::MAX as usize
                    && match (elem.as_ref(), coll) {
                        (SType::SByte, CollLiteral::Bytes(_)) => true,
                        (SType::SByte, CollLiteral::Items(_)) => false,
                        (elem, CollLiteral::Items(items)) => {
                            items.iter().all(|item| item.conforms_to(elem))
                        }
                        (_, CollLiteral::Bytes(_)) => false,
                    }
            }
            (SType::SOption(elem), Literal::Opt(value)) => {
                value.as_ref().is_none_or(|v| v.conforms_to(elem))
            }
            (SType::STuple(types), Literal::Tup(items)) => {
                types.len() == items.len()
                    && types.iter().zip(items).all(|(t, item)| item.conforms_to(t))
            }
            _ => false,
        }
    }

    /// Short name of the literal's shape, used in error messages.
    fn kind(&self) -> &'static str {
        match self {
            Literal::Boolean(_) => "Boolean",
            Literal::Byte(_) => "Byte",
            Literal::Short(_) => "Short",
            Literal::Int(_) => "Int",
            Literal::Long(_) => "Long",
            Literal::BigInt(_) => "BigInt",
            Literal::GroupElement(_) => "GroupElement",
            Literal::SigmaProp(_) => "SigmaProp",
            Literal::Coll(_) => "Coll",
            Literal::Tup(_) => "tuple",
            Literal::Opt(_) => "Option",
            Literal::Unit => "Unit",
        }
    }
}

/// A typed literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constant {
    tpe: SType,
    value: Literal,
}

impl Constant {
    /// Build a constant, checking that `value` has the shape `tpe` describes.
    pub fn new(tpe: SType, value: Literal) -> Result<Self, Error> {
        if !tpe.is_data_type() {
            return Err(Error::NonSerializableType(tpe));
        }
        if !value.conforms_to(&tpe) {
            return Err(Error::TypeValueMismatch {
                expected: tpe.to_string(),
                found: value.kind().to_string(),
            });
        }
        Ok(Self { tpe, value })
    }

    /// Caller guarantees that `value` conforms to `tpe`.
    pub(crate) fn new_unchecked(tpe: SType, value: Literal) -> Self {
        debug_assert!(value.conforms_to(&tpe));
        Self { tpe, value }
    }

    pub fn tpe(&self) -> &SType {
        &self.tpe
    }

    pub fn value(&self) -> &Literal {
        &self.value
    }

    pub fn into_parts(self) -> (SType, Literal) {
        (self.tpe, self.value)
    }

    pub fn from_i32(value: i32) -> Self {
        value.into()
    }

    /// Returns the value of an `Int` constant. Other types, including the other
    /// integer widths, fail with [`Error::TypeMismatch`].
    pub fn to_i32(&self) -> Result<i32, Error> {
        i32::try_from(self)
    }

    fn mismatch(&self, expected: SType) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.tpe.clone(),
        }
    }
}

macro_rules! constant_conversions {
    ($typ:ty, $variant:ident) => {
        impl From<$typ> for Constant {
            fn from(value: $typ) -> Self {
                Constant::new_unchecked(<$typ>::stype(), Literal::$variant(value))
            }
        }

        impl TryFrom<&Constant> for $typ {
            type Error = Error;

            fn try_from(constant: &Constant) -> Result<Self, Self::Error> {
                match constant.value {
                    Literal::$variant(value) => Ok(value),
                    _ => Err(constant.mismatch(<$typ>::stype())),
                }
            }
        }
    };
}

constant_conversions! { bool, Boolean }
constant_conversions! { i8, Byte }
constant_conversions! { i16, Short }
constant_conversions! { i32, Int }
constant_conversions! { i64, Long }

/// Fails with [`Error::ValueOutOfRange`] above `u16::MAX` bytes.
impl TryFrom<Vec<u8>> for Constant {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.len() > u16::MAX as usize {
            return Err(Error::ValueOutOfRange {
                value: bytes.len() as u64,
                max: u16::MAX as u64,
            });
        }
        Ok(Constant::new_unchecked(
            SType::coll(SType::SByte),
            Literal::Coll(CollLiteral::Bytes(bytes)),
        ))
    }
}

impl TryFrom<&Constant> for Vec<u8> {
    type Error = Error;

    fn try_from(constant: &Constant) -> Result<Self, Self::Error> {
        match &constant.value {
            Literal::Coll(CollLiteral::Bytes(bytes)) => Ok(bytes.clone()),
            _ => Err(constant.mismatch(SType::coll(SType::SByte))),
        }
    }
}

/// Fails when a connective holds more than `u16::MAX` children.
impl TryFrom<SigmaBoolean> for Constant {
    type Error = Error;

    fn try_from(sb: SigmaBoolean) -> Result<Self, Self::Error> {
        Constant::new(SType::SSigmaProp, Literal::SigmaProp(sb))
    }
}

impl From<EcPoint> for Constant {
    fn from(point: EcPoint) -> Self {
        Constant::new_unchecked(SType::SGroupElement, Literal::GroupElement(point))
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Literal]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Byte(v) => write!(f, "{}.toByte", v),
            Literal::Short(v) => write!(f, "{}.toShort", v),
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Long(v) => write!(f, "{}L", v),
            Literal::BigInt(v) => write!(f, "bigInt(\"{}\")", v),
            Literal::GroupElement(p) => write!(f, "groupElement({})", p),
            Literal::SigmaProp(sb) => write!(f, "{}", sb),
            Literal::Coll(CollLiteral::Bytes(bytes)) => {
                write!(f, "fromBase16(\"{}\")", hex::encode(bytes))
            }
            Literal::Coll(CollLiteral::Items(items)) => {
                f.write_str("Coll(")?;
                write_seq(f, items)?;
                f.write_str(")")
            }
            Literal::Tup(items) => {
                f.write_str("(")?;
                write_seq(f, items)?;
                f.write_str(")")
            }
            Literal::Opt(Some(v)) => write!(f, "Some({})", v),
            Literal::Opt(None) => f.write_str("None"),
            Literal::Unit => f.write_str("()"),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_accessors_are_strict() {
        let c = Constant::from_i32(99);
        assert_eq!(c.tpe(), &SType::SInt);
        assert_eq!(c.to_i32(), Ok(99));

        let long = Constant::from(99i64);
        assert_eq!(
            long.to_i32(),
            Err(Error::TypeMismatch {
                expected: SType::SInt,
                found: SType::SLong
            })
        );
        assert!(i16::try_from(&Constant::from_i32(1)).is_err());
    }

    #[test]
    fn new_checks_shape() {
        assert!(Constant::new(SType::SInt, Literal::Int(1)).is_ok());
        assert!(
            Constant::new(SType::SInt, Literal::Long(1))
                .unwrap_err()
                .is_type_value_mismatch()
        );
        assert_eq!(
            Constant::new(SType::SBox, Literal::Unit),
            Err(Error::NonSerializableType(SType::SBox))
        );

        let bytes_as_items = Literal::Coll(CollLiteral::Items(vec![Literal::Byte(1)]));
        assert!(Constant::new(SType::coll(SType::SByte), bytes_as_items).is_err());

        let pair = SType::pair(SType::SInt, SType::option(SType::SBoolean));
        let value = Literal::Tup(vec![
            Literal::Int(5),
            Literal::Opt(Some(Box::new(Literal::Boolean(true)))),
        ]);
        assert!(Constant::new(pair, value).is_ok());
    }

    #[test]
    fn bigint_is_bounded() {
        let max: BigInt = (BigInt::from(1) << 255usize) - 1;
        assert!(Constant::new(SType::SBigInt, Literal::BigInt(max.clone())).is_ok());
        assert!(Constant::new(SType::SBigInt, Literal::BigInt(max + 1)).is_err());
    }

    #[test]
    fn byte_arrays_convert_both_ways() {
        let c = Constant::try_from(vec![1u8, 2, 3]).unwrap();
        assert_eq!(c.tpe(), &SType::coll(SType::SByte));
        assert_eq!(Vec::<u8>::try_from(&c), Ok(vec![1, 2, 3]));
        assert_eq!(c.to_string(), "fromBase16(\"010203\")");
    }

    #[test]
    fn byte_arrays_fit_a_u16_length() {
        let longest = Constant::try_from(vec![0u8; u16::MAX as usize]).unwrap();
        assert_eq!(Vec::<u8>::try_from(&longest).map(|b| b.len()), Ok(65_535));
        assert_eq!(
            Constant::try_from(vec![0u8; 65_536]),
            Err(Error::ValueOutOfRange {
                value: 65_536,
                max: 65_535
            })
        );
    }

    #[test]
    fn wide_connectives_are_rejected() {
        let narrow = SigmaBoolean::Cor(vec![SigmaBoolean::TrivialProp(true); 3]);
        assert!(Constant::try_from(narrow).is_ok());

        let wide = SigmaBoolean::Cand(vec![SigmaBoolean::TrivialProp(true); 65_536]);
        assert!(
            Constant::try_from(wide)
                .unwrap_err()
                .is_type_value_mismatch()
        );
    }

    #[test]
    fn display() {
        assert_eq!(Constant::from(5i64).to_string(), "5L");
        assert_eq!(Constant::from(-1i8).to_string(), "-1.toByte");
        let opt = Constant::new(SType::option(SType::SInt), Literal::Opt(None)).unwrap();
        assert_eq!(opt.to_string(), "None");
    }
}
