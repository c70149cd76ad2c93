//! The serialized script container.
//!
//! Layout: one header byte, then the body size as a `u32` VLQ when
//! [`HeaderFlags::HAS_SIZE`] is set, then the constant segment (a `u32` count followed by
//! the constants) when [`HeaderFlags::CONSTANT_SEGREGATION`] is set, then the root
//! expression.
use bitflags::bitflags;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::CodecConfig,
    consts::Constant,
    encoding::{SigmaDecode, SigmaEncode, SigmaReader, SigmaWriter},
    expr::{ConstantPlaceholder, Expr},
    utils::{DecodeError, Error},
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct HeaderFlags: u8 {
        /// The body size follows the header byte.
        const HAS_SIZE = 0x08;
        /// Constants live in a segment and the root refers to them by index.
        const CONSTANT_SEGREGATION = 0x10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ErgoTreeHeader {
    version: u8,
    flags: HeaderFlags,
}

impl ErgoTreeHeader {
    pub const VERSION_MASK: u8 = 0x07;
    pub const RESERVED_MASK: u8 = 0xe0;

    pub fn new(version: u8, flags: HeaderFlags) -> Result<Self, Error> {
        Self::from_byte((version & Self::VERSION_MASK) | flags.bits()).and_then(|header| {
            if version > Self::VERSION_MASK {
                Err(Error::InvalidHeader {
                    header: version,
                    reason: "version does not fit in 3 bits",
                })
            } else {
                Ok(header)
            }
        })
    }

    /// Version 0 header, optionally with constant segregation.
    pub fn v0(constant_segregation: bool) -> Self {
        let mut flags = HeaderFlags::empty();
        flags.set(HeaderFlags::CONSTANT_SEGREGATION, constant_segregation);
        Self { version: 0, flags }
    }

    /// Version 1 header. The size flag is mandatory from this version on.
    pub fn v1(constant_segregation: bool) -> Self {
        let mut flags = HeaderFlags::HAS_SIZE;
        flags.set(HeaderFlags::CONSTANT_SEGREGATION, constant_segregation);
        Self { version: 1, flags }
    }

    pub fn from_byte(byte: u8) -> Result<Self, Error> {
        if byte & Self::RESERVED_MASK != 0 {
            return Err(Error::InvalidHeader {
                header: byte,
                reason: "reserved bits are set",
            });
        }

        let version = byte & Self::VERSION_MASK;
        let flags = HeaderFlags::from_bits_truncate(byte);
        if version > 0 && !flags.contains(HeaderFlags::HAS_SIZE) {
            return Err(Error::InvalidHeader {
                header: byte,
                reason: "versions above 0 require the size flag",
            });
        }
        Ok(Self { version, flags })
    }

    pub fn to_byte(&self) -> u8 {
        self.version | self.flags.bits()
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn flags(&self) -> HeaderFlags {
        self.flags
    }

    pub fn has_size(&self) -> bool {
        self.flags.contains(HeaderFlags::HAS_SIZE)
    }

    pub fn is_constant_segregation(&self) -> bool {
        self.flags.contains(HeaderFlags::CONSTANT_SEGREGATION)
    }
}

/// A decoded script: header, constant segment and root expression.
///
/// Every placeholder in the root refers to an existing segment entry, and a tree
/// without [`HeaderFlags::CONSTANT_SEGREGATION`] has neither constants nor
/// placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErgoTree {
    header: ErgoTreeHeader,
    constants: Vec<Constant>,
    root: Expr,
}

impl ErgoTree {
    /// Build a tree from a root expression. With constant segregation, inline constants
    /// move into the segment in encoding order and are replaced by placeholders. The root
    /// must not already contain placeholders, and every count and type in it must fit
    /// its length prefix (see [`Expr::check_encodable`]).
    pub fn new(header: ErgoTreeHeader, root: Expr) -> Result<Self, Error> {
        root.check_encodable()?;

        let mut placeholder = None;
        root.visit_placeholders(&mut |p| {
            placeholder.get_or_insert(p.index);
        });
        if let Some(index) = placeholder {
            return Err(Error::InvalidPlaceholder { index, len: 0 });
        }

        let mut root = root;
        let mut constants = Vec::new();
        if header.is_constant_segregation() {
            root.rewrite(&mut |e| match e {
                Expr::Const(c) => {
                    let index = constants.len() as u32;
                    constants.push(c.clone());
                    Some(Expr::ConstPlaceholder(ConstantPlaceholder::new(index)))
                }
                _ => None,
            });
        }

        Ok(Self {
            header,
            constants,
            root,
        })
    }

    /// Decode a hex string.
    pub fn from_base16_bytes(base16: &str) -> Result<Self, DecodeError> {
        let bytes = hex::decode(base16)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes_with_config(bytes, CodecConfig::default())
    }

    pub fn from_bytes_with_config(bytes: &[u8], config: CodecConfig) -> Result<Self, DecodeError> {
        let mut r = SigmaReader::with_config(bytes, config);
        Self::decode_body(&mut r).map_err(|e| DecodeError::new(r.position(), e))
    }

    fn decode_body(r: &mut SigmaReader<'_>) -> Result<Self, Error> {
        let header = ErgoTreeHeader::from_byte(r.get_u8()?)?;
        debug!(
            "ErgoTree header: version {}, flags {:?}",
            header.version(),
            header.flags()
        );

        if header.has_size() {
            let declared = r.get_u32()?;
            if declared as usize != r.remaining() {
                return Err(Error::SizeMismatch {
                    declared,
                    actual: r.remaining(),
                });
            }
        }

        let constants = if header.is_constant_segregation() {
            let count = r.get_len()?;
            let constants = (0..count)
                .map(|_| Constant::decode(r))
                .collect::<Result<Vec<_>, _>>()?;
            debug!("decoded {} segregated constant(s)", constants.len());
            constants
        } else {
            Vec::new()
        };

        let root = Expr::decode(r, &constants)?;
        if !r.is_empty() {
            return Err(Error::TrailingBytes {
                count: r.remaining(),
            });
        }

        Ok(Self {
            header,
            constants,
            root,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = SigmaWriter::new();
        if self.header.is_constant_segregation() {
            body.put_len(self.constants.len());
            self.constants.iter().for_each(|c| c.encode(&mut body));
        }
        self.root.encode(&mut body);

        let mut w = SigmaWriter::new();
        w.put_u8(self.header.to_byte());
        if self.header.has_size() {
            w.put_len(body.len());
        }
        w.put_bytes(body.as_slice());
        w.into_bytes()
    }

    pub fn to_base16(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn header(&self) -> &ErgoTreeHeader {
        &self.header
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Number of segregated constants; 0 when the tree has no constant segment.
    pub fn constants_len(&self) -> usize {
        self.constants.len()
    }

    pub fn get_constant(&self, index: usize) -> Option<&Constant> {
        self.constants.get(index)
    }

    /// Returns a copy of this tree with the constant at `index` replaced, or `None` when
    /// `index` is out of bounds. The new constant's type is not checked against the
    /// places that use it.
    pub fn set_constant(&self, index: usize, constant: Constant) -> Option<ErgoTree> {
        if index >= self.constants.len() {
            return None;
        }
        let mut tree = self.clone();
        tree.constants[index] = constant;
        Some(tree)
    }

    /// Look up the constant a placeholder of this tree refers to.
    pub fn resolve(&self, placeholder: &ConstantPlaceholder) -> Option<&Constant> {
        placeholder.resolve(&self.constants)
    }

    /// The root with every placeholder replaced by the constant it refers to.
    pub fn inline_constants(&self) -> Expr {
        let mut root = self.root.clone();
        root.rewrite(&mut |e| match e {
            Expr::ConstPlaceholder(p) => self.resolve(p).cloned().map(Expr::Const),
            _ => None,
        });
        root
    }

    /// Encoding of the root expression alone. Trees that differ only in the values of
    /// their segregated constants share the same template.
    pub fn template_bytes(&self) -> Vec<u8> {
        self.root.to_bytes()
    }
}
