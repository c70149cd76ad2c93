//! Types module
//!
//! [`SType`] is the type descriptor attached to every constant and to the few
//! expression nodes that carry an explicit type (casts, register reads, lambda
//! arguments). Type descriptors are finite owned trees: collections and options box
//! their element type, tuples own their items.
//!
//! The byte encoding lives in [`codec`]; see [`crate::encoding::magic`] for the codes.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{encoding::magic::*, utils::Error};

pub mod codec;

/// Every type descriptor is a tree of [`SType`] nodes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SType {
    /// Boolean
    SBoolean,
    /// Signed byte
    SByte,
    /// Signed 16-bit integer
    SShort,
    /// Signed 32-bit integer
    SInt,
    /// Signed 64-bit integer
    SLong,
    /// Signed 256-bit integer
    SBigInt,
    /// Element of the discrete-logarithm group (a compressed curve point)
    SGroupElement,
    /// Proposition proven and verified by a sigma protocol
    SSigmaProp,

    /// Supertype of every type
    SAny,
    /// The unit type, with a single value
    SUnit,
    /// A transaction box
    SBox,
    /// Authenticated AVL+ tree
    SAvlTree,
    /// Script execution context
    SContext,
    /// UTF-8 string
    SString,
    /// Block header
    SHeader,
    /// Block pre-header
    SPreHeader,
    /// Global object
    SGlobal,

    /// Named type variable in generic signatures.
    STypeVar(String),

    /// Collection of elements of the same type.
    SColl(Box<SType>),

    /// Optional value.
    SOption(Box<SType>),

    /// Tuple of 2 to 255 items of possibly different types.
    STuple(TupleItems),
}

impl SType {
    /// Shorthand for `SColl(Box::new(elem))`.
    pub fn coll(elem: SType) -> Self {
        SType::SColl(Box::new(elem))
    }

    /// Shorthand for `SOption(Box::new(elem))`.
    pub fn option(elem: SType) -> Self {
        SType::SOption(Box::new(elem))
    }

    /// Shorthand for a pair tuple.
    pub fn pair(first: SType, second: SType) -> Self {
        SType::STuple(TupleItems::pair(first, second))
    }

    /// Returns the code of an embeddable primitive type, i.e. one whose code can be
    /// folded into the code of an enclosing `Coll`, `Option` or pair.
    pub const fn embeddable_code(&self) -> Option<u8> {
        match self {
            SType::SBoolean => Some(T_BOOLEAN),
            SType::SByte => Some(T_BYTE),
            SType::SShort => Some(T_SHORT),
            SType::SInt => Some(T_INT),
            SType::SLong => Some(T_LONG),
            SType::SBigInt => Some(T_BIGINT),
            SType::SGroupElement => Some(T_GROUP_ELEMENT),
            SType::SSigmaProp => Some(T_SIGMA_PROP),
            _ => None,
        }
    }

    /// Inverse of [`Self::embeddable_code`].
    pub const fn from_embeddable_code(code: u8) -> Option<Self> {
        match code {
            T_BOOLEAN => Some(SType::SBoolean),
            T_BYTE => Some(SType::SByte),
            T_SHORT => Some(SType::SShort),
            T_INT => Some(SType::SInt),
            T_LONG => Some(SType::SLong),
            T_BIGINT => Some(SType::SBigInt),
            T_GROUP_ELEMENT => Some(SType::SGroupElement),
            T_SIGMA_PROP => Some(SType::SSigmaProp),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_embeddable(&self) -> bool {
        self.embeddable_code().is_some()
    }

    /// Returns `true` for the integral types that support arithmetic.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            SType::SByte | SType::SShort | SType::SInt | SType::SLong | SType::SBigInt
        )
    }

    /// Returns `true` if constants of this type have a byte representation.
    pub fn is_data_type(&self) -> bool {
        match self {
            SType::SColl(elem) | SType::SOption(elem) => elem.is_data_type(),
            SType::STuple(items) => items.iter().all(SType::is_data_type),
            SType::SUnit => true,
            other => other.is_embeddable(),
        }
    }

    /// Element type of a collection or option.
    pub fn elem_type(&self) -> Option<&SType> {
        match self {
            SType::SColl(elem) | SType::SOption(elem) => Some(elem),
            _ => None,
        }
    }

    /// Check that every length in this descriptor fits its one-byte prefix. Only type
    /// variable names can exceed it; tuple arity is bounded by [`TupleItems`].
    pub fn check_encodable(&self) -> Result<(), Error> {
        match self {
            SType::STypeVar(name) if name.len() > u8::MAX as usize => {
                Err(Error::ValueOutOfRange {
                    value: name.len() as u64,
                    max: u8::MAX as u64,
                })
            }
            SType::SColl(elem) | SType::SOption(elem) => elem.check_encodable(),
            SType::STuple(items) => items.iter().try_for_each(SType::check_encodable),
            _ => Ok(()),
        }
    }

    /// Nesting depth of this descriptor; primitives have depth 1.
    pub fn depth(&self) -> usize {
        match self {
            SType::SColl(elem) | SType::SOption(elem) => 1 + elem.depth(),
            SType::STuple(items) => 1 + items.iter().map(SType::depth).max().unwrap_or(0),
            _ => 1,
        }
    }
}

impl std::fmt::Display for SType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SType::SBoolean => write!(f, "Boolean"),
            SType::SByte => write!(f, "Byte"),
            SType::SShort => write!(f, "Short"),
            SType::SInt => write!(f, "Int"),
            SType::SLong => write!(f, "Long"),
            SType::SBigInt => write!(f, "BigInt"),
            SType::SGroupElement => write!(f, "GroupElement"),
            SType::SSigmaProp => write!(f, "SigmaProp"),
            SType::SAny => write!(f, "Any"),
            SType::SUnit => write!(f, "Unit"),
            SType::SBox => write!(f, "Box"),
            SType::SAvlTree => write!(f, "AvlTree"),
            SType::SContext => write!(f, "Context"),
            SType::SString => write!(f, "String"),
            SType::SHeader => write!(f, "Header"),
            SType::SPreHeader => write!(f, "PreHeader"),
            SType::SGlobal => write!(f, "Global"),
            SType::STypeVar(name) => write!(f, "{}", name),
            SType::SColl(elem) => write!(f, "Coll[{}]", elem),
            SType::SOption(elem) => write!(f, "Option[{}]", elem),
            SType::STuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Tuple items with bounds check (2..=255).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TupleItems(Vec<SType>);

#[allow(clippy::len_without_is_empty)]
impl TupleItems {
    pub const MIN_LEN: usize = 2;
    pub const MAX_LEN: usize = 255;

    pub fn pair(first: SType, second: SType) -> Self {
        TupleItems(vec![first, second])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SType> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[SType] {
        &self.0
    }
}

/// Returned when building a tuple with fewer than 2 or more than 255 items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("A tuple holds between 2 and 255 items, got {0}.")]
pub struct TupleItemsOutOfBounds(pub usize);

impl TryFrom<Vec<SType>> for TupleItems {
    type Error = TupleItemsOutOfBounds;

    fn try_from(items: Vec<SType>) -> Result<Self, Self::Error> {
        if (Self::MIN_LEN..=Self::MAX_LEN).contains(&items.len()) {
            Ok(TupleItems(items))
        } else {
            Err(TupleItemsOutOfBounds(items.len()))
        }
    }
}

impl<'a> IntoIterator for &'a TupleItems {
    type Item = &'a SType;
    type IntoIter = std::slice::Iter<'a, SType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Rust types with a fixed [`SType`] counterpart.
pub trait LiftIntoSType {
    fn stype() -> SType;
}

macro_rules! lift_into_stype {
    ($typ:ty, $stype:ident) => {
        impl LiftIntoSType for $typ {
            fn stype() -> SType {
                SType::$stype
            }
        }
    };
}

lift_into_stype! { bool, SBoolean }
lift_into_stype! { i8, SByte }
lift_into_stype! { i16, SShort }
lift_into_stype! { i32, SInt }
lift_into_stype! { i64, SLong }
lift_into_stype! { (), SUnit }

impl<T: LiftIntoSType> LiftIntoSType for Vec<T> {
    fn stype() -> SType {
        SType::coll(T::stype())
    }
}

impl<T: LiftIntoSType> LiftIntoSType for Option<T> {
    fn stype() -> SType {
        SType::option(T::stype())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_script_syntax() {
        let ty = SType::coll(SType::pair(SType::SInt, SType::option(SType::SByte)));
        assert_eq!(ty.to_string(), "Coll[(Int, Option[Byte])]");
    }

    #[test]
    fn tuple_bounds_are_enforced() {
        assert!(TupleItems::try_from(vec![SType::SInt]).is_err());
        assert!(TupleItems::try_from(vec![SType::SInt; 255]).is_ok());
        assert_eq!(
            TupleItems::try_from(vec![SType::SInt; 256]),
            Err(TupleItemsOutOfBounds(256))
        );
    }

    #[test]
    fn data_types_exclude_objects() {
        assert!(SType::coll(SType::SSigmaProp).is_data_type());
        assert!(SType::option(SType::SUnit).is_data_type());
        assert!(!SType::coll(SType::SBox).is_data_type());
        assert!(!SType::pair(SType::SInt, SType::SContext).is_data_type());
    }

    #[test]
    fn type_variable_names_fit_a_byte() {
        let longest = SType::coll(SType::STypeVar("t".repeat(255)));
        assert_eq!(longest.check_encodable(), Ok(()));

        let nested = SType::pair(SType::SInt, SType::option(SType::STypeVar("t".repeat(256))));
        assert_eq!(
            nested.check_encodable(),
            Err(Error::ValueOutOfRange {
                value: 256,
                max: 255
            })
        );
    }

    #[test]
    fn lifted_types() {
        assert_eq!(<Vec<Option<i64>>>::stype(), SType::coll(SType::option(SType::SLong)));
        assert_eq!(<i32>::stype(), SType::SInt);
    }
}
