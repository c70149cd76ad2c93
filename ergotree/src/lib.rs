//! ErgoTree: binary codec for a typed expression tree, with constant-segment editing.
//!
//! An ErgoTree is a header byte, an optional body size, an optional segment of typed
//! constants and a root expression. Decoding produces an owned [`ErgoTree`]; encoding
//! reproduces canonical input byte for byte. Trees that segregate their constants can
//! be reused as templates: [`ErgoTree::set_constant`] swaps one value without touching
//! the root.
//!
//! Encoding shape
//!  - Integers are VLQ (LEB128), signed ones zig-zag first.
//!  - Types are one code byte, folding primitive element types into the code of the
//!    collection, option or pair that holds them.
//!  - Expressions are opcode-prefixed; bytes at or below 112 start an inline constant.
//!
//! Example
//! ```
//! use ergotree::{Constant, ErgoTree};
//!
//! let tree = ErgoTree::from_base16_bytes(
//!     "100204a00b08cd021dde34603426402615658f1d970cfa7c7bd92ac81a8b16eeebff264d59ce4604ea02d192a39a8cc7a70173007301",
//! )
//! .unwrap();
//! assert_eq!(tree.constants_len(), 2);
//! assert_eq!(tree.get_constant(0).unwrap().to_i32(), Ok(720));
//!
//! let updated = tree.set_constant(0, Constant::from_i32(99)).unwrap();
//! assert_eq!(updated.get_constant(0).unwrap().to_i32(), Ok(99));
//! assert_eq!(tree.template_bytes(), updated.template_bytes());
//! ```
pub mod config;
pub mod consts;
pub mod encoding;
pub mod expr;
pub mod tree;
pub mod types;
pub mod utils;

pub use config::CodecConfig;
pub use consts::{CollLiteral, Constant, EcPoint, Literal, SigmaBoolean};
pub use expr::{ConstantPlaceholder, Expr, pretty::PrettyExpr};
pub use tree::{ErgoTree, ErgoTreeHeader, HeaderFlags};
pub use types::SType;
pub use utils::{DecodeError, Error};
