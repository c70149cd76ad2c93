//! Magic constants of the byte format.
//!
//! Conventions:
//! - A type descriptor starts with one type code byte. Embeddable primitives (codes 1..=8)
//!   can be folded into the code of the constructor that wraps them (`Coll`, `Option`,
//!   pairs), saving one byte per level.
//! - Expression opcodes start right after [`LAST_CONSTANT_CODE`]; any leading byte at or
//!   below it is the first byte of an inline constant's type descriptor.

// Embeddable primitive type codes
pub const T_BOOLEAN: u8 = 1;
pub const T_BYTE: u8 = 2;
pub const T_SHORT: u8 = 3;
pub const T_INT: u8 = 4;
pub const T_LONG: u8 = 5;
pub const T_BIGINT: u8 = 6;
pub const T_GROUP_ELEMENT: u8 = 7;
pub const T_SIGMA_PROP: u8 = 8;

/// Width of each constructor's code range.
pub const PRIM_RANGE: u8 = 12;

// Constructor codes; add a primitive code to embed it.
pub const T_COLL: u8 = PRIM_RANGE; // Coll[_]
pub const T_NESTED_COLL: u8 = 2 * PRIM_RANGE; // Coll[Coll[_]]
pub const T_OPTION: u8 = 3 * PRIM_RANGE; // Option[_]
pub const T_OPTION_COLL: u8 = 4 * PRIM_RANGE; // Option[Coll[_]]
pub const T_PAIR1: u8 = 5 * PRIM_RANGE; // (prim, _) or, alone, (_, _)
pub const T_PAIR2: u8 = 6 * PRIM_RANGE; // (_, prim) or, alone, a triple
pub const T_PAIR_SYMMETRIC: u8 = 7 * PRIM_RANGE; // (prim, prim) or, alone, a quadruple
pub const T_TUPLE: u8 = 8 * PRIM_RANGE; // payload: u8 length, then items

// Non-embeddable object types
pub const T_ANY: u8 = 97;
pub const T_UNIT: u8 = 98;
pub const T_BOX: u8 = 99;
pub const T_AVL_TREE: u8 = 100;
pub const T_CONTEXT: u8 = 101;
pub const T_STRING: u8 = 102;
pub const T_TYPE_VAR: u8 = 103; // payload: u8 length, UTF-8 name
pub const T_HEADER: u8 = 104;
pub const T_PRE_HEADER: u8 = 105;
pub const T_GLOBAL: u8 = 106;

/// Highest leading byte that denotes an inline constant rather than an operation.
pub const LAST_CONSTANT_CODE: u8 = 112;

/// Size in bytes of a compressed group element.
pub const GROUP_ELEMENT_SIZE: usize = 33;

/// Largest big integer payload, in bytes (256-bit signed).
pub const MAX_BIGINT_BYTES: usize = 32;
