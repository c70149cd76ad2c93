//! Sigma propositions stored as constant values.
use std::fmt;

use crate::{
    encoding::{SigmaDecode, SigmaEncode, SigmaReader, SigmaWriter, magic::GROUP_ELEMENT_SIZE},
    utils::Error,
};

// Leading byte of each proposition node.
const PROVE_DLOG: u8 = 0xcd;
const PROVE_DH_TUPLE: u8 = 0xce;
const TRIVIAL_FALSE: u8 = 0xd2;
const TRIVIAL_TRUE: u8 = 0xd3;
const CAND: u8 = 0xea;
const COR: u8 = 0xeb;
const CTHRESHOLD: u8 = 0x98;

/// A compressed elliptic curve point, kept as its 33 serialized bytes.
///
/// No curve arithmetic happens here; the bytes are carried through unchanged.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EcPoint(pub [u8; GROUP_ELEMENT_SIZE]);

impl EcPoint {
    pub fn as_bytes(&self) -> &[u8; GROUP_ELEMENT_SIZE] {
        &self.0
    }
}

impl SigmaDecode for EcPoint {
    fn decode(r: &mut SigmaReader<'_>) -> Result<Self, Error> {
        r.get_array().map(EcPoint)
    }
}

impl SigmaEncode for EcPoint {
    fn encode(&self, w: &mut SigmaWriter) {
        w.put_bytes(&self.0);
    }
}

impl From<[u8; GROUP_ELEMENT_SIZE]> for EcPoint {
    fn from(bytes: [u8; GROUP_ELEMENT_SIZE]) -> Self {
        EcPoint(bytes)
    }
}

impl fmt::Debug for EcPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcPoint({})", hex::encode(self.0))
    }
}

impl fmt::Display for EcPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Boolean tree of sigma protocol statements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SigmaBoolean {
    TrivialProp(bool),
    /// Knowledge of the discrete logarithm of the point.
    ProveDlog(EcPoint),
    /// Knowledge of `x` such that `u = g^x` and `v = h^x`.
    ProveDhTuple {
        g: EcPoint,
        h: EcPoint,
        u: EcPoint,
        v: EcPoint,
    },
    Cand(Vec<SigmaBoolean>),
    Cor(Vec<SigmaBoolean>),
    /// At least `k` of the children must be proven.
    Cthreshold {
        k: u16,
        children: Vec<SigmaBoolean>,
    },
}

impl SigmaBoolean {
    /// Returns `false` when a child list is too long for its `u16` count prefix.
    pub fn is_encodable(&self) -> bool {
        match self {
            SigmaBoolean::Cand(children)
            | SigmaBoolean::Cor(children)
            | SigmaBoolean::Cthreshold { children, .. } => {
                children.len() <= u16::MAX as usize && children.iter().all(Self::is_encodable)
            }
            _ => true,
        }
    }

    fn decode_at(r: &mut SigmaReader<'_>, depth: usize) -> Result<Self, Error> {
        let max = r.config().max_expr_depth;
        if depth > max {
            return Err(Error::ExprDepthExceeded { max });
        }

        let children = |r: &mut SigmaReader<'_>, count: u16| {
            (0..count)
                .map(|_| Self::decode_at(r, depth + 1))
                .collect::<Result<Vec<_>, _>>()
        };

        match r.get_u8()? {
            TRIVIAL_TRUE => Ok(SigmaBoolean::TrivialProp(true)),
            TRIVIAL_FALSE => Ok(SigmaBoolean::TrivialProp(false)),
            PROVE_DLOG => EcPoint::decode(r).map(SigmaBoolean::ProveDlog),
            PROVE_DH_TUPLE => Ok(SigmaBoolean::ProveDhTuple {
                g: EcPoint::decode(r)?,
                h: EcPoint::decode(r)?,
                u: EcPoint::decode(r)?,
                v: EcPoint::decode(r)?,
            }),
            CAND => {
                let count = r.get_u16()?;
                children(r, count).map(SigmaBoolean::Cand)
            }
            COR => {
                let count = r.get_u16()?;
                children(r, count).map(SigmaBoolean::Cor)
            }
            CTHRESHOLD => {
                let k = r.get_u16()?;
                let count = r.get_u16()?;
                let children = children(r, count)?;
                Ok(SigmaBoolean::Cthreshold { k, children })
            }
            other => Err(Error::InvalidOpcode(other)),
        }
    }
}

impl SigmaDecode for SigmaBoolean {
    fn decode(r: &mut SigmaReader<'_>) -> Result<Self, Error> {
        Self::decode_at(r, 1)
    }
}

impl SigmaEncode for SigmaBoolean {
    fn encode(&self, w: &mut SigmaWriter) {
        match self {
            SigmaBoolean::TrivialProp(true) => w.put_u8(TRIVIAL_TRUE),
            SigmaBoolean::TrivialProp(false) => w.put_u8(TRIVIAL_FALSE),
            SigmaBoolean::ProveDlog(point) => {
                w.put_u8(PROVE_DLOG);
                point.encode(w);
            }
            SigmaBoolean::ProveDhTuple { g, h, u, v } => {
                w.put_u8(PROVE_DH_TUPLE);
                [g, h, u, v].iter().for_each(|p| p.encode(w));
            }
            SigmaBoolean::Cand(children) => {
                w.put_u8(CAND);
                w.put_u16(children.len() as u16);
                children.iter().for_each(|c| c.encode(w));
            }
            SigmaBoolean::Cor(children) => {
                w.put_u8(COR);
                w.put_u16(children.len() as u16);
                children.iter().for_each(|c| c.encode(w));
            }
            SigmaBoolean::Cthreshold { k, children } => {
                w.put_u8(CTHRESHOLD);
                w.put_u16(*k);
                w.put_u16(children.len() as u16);
                children.iter().for_each(|c| c.encode(w));
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[SigmaBoolean]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for SigmaBoolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigmaBoolean::TrivialProp(b) => write!(f, "sigmaProp({})", b),
            SigmaBoolean::ProveDlog(p) => write!(f, "proveDlog({})", p),
            SigmaBoolean::ProveDhTuple { g, h, u, v } => {
                write!(f, "proveDHTuple({}, {}, {}, {})", g, h, u, v)
            }
            SigmaBoolean::Cand(children) => {
                f.write_str("allOf(")?;
                write_list(f, children)?;
                f.write_str(")")
            }
            SigmaBoolean::Cor(children) => {
                f.write_str("anyOf(")?;
                write_list(f, children)?;
                f.write_str(")")
            }
            SigmaBoolean::Cthreshold { k, children } => {
                write!(f, "atLeast({}, ", k)?;
                write_list(f, children)?;
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(tag: u8) -> EcPoint {
        let mut bytes = [tag; GROUP_ELEMENT_SIZE];
        bytes[0] = 0x02;
        EcPoint(bytes)
    }

    fn decode(bytes: &[u8]) -> Result<SigmaBoolean, Error> {
        SigmaBoolean::decode(&mut SigmaReader::new(bytes))
    }

    #[test]
    fn prove_dlog_layout() {
        let sb = SigmaBoolean::ProveDlog(point(0x11));
        let bytes = sb.to_bytes();
        assert_eq!(bytes.len(), 1 + GROUP_ELEMENT_SIZE);
        assert_eq!(bytes[0], 0xcd);
        assert_eq!(decode(&bytes), Ok(sb));
    }

    #[test]
    fn nested_connectives() {
        let sb = SigmaBoolean::Cthreshold {
            k: 1,
            children: vec![
                SigmaBoolean::Cand(vec![
                    SigmaBoolean::TrivialProp(true),
                    SigmaBoolean::ProveDlog(point(0x22)),
                ]),
                SigmaBoolean::Cor(vec![SigmaBoolean::TrivialProp(false)]),
            ],
        };
        let bytes = sb.to_bytes();
        assert_eq!(&bytes[..4], &[0x98, 0x01, 0x02, 0xea]);
        assert_eq!(decode(&bytes), Ok(sb));
    }

    #[test]
    fn unknown_node_is_rejected() {
        assert_eq!(decode(&[0x42]), Err(Error::InvalidOpcode(0x42)));
        assert_eq!(
            decode(&[0xcd, 0x02, 0x03]),
            Err(Error::UnexpectedEndOfInput { needed: 31 })
        );
    }

    #[test]
    fn display_reads_like_script() {
        let sb = SigmaBoolean::Cor(vec![
            SigmaBoolean::TrivialProp(false),
            SigmaBoolean::TrivialProp(true),
        ]);
        assert_eq!(sb.to_string(), "anyOf(sigmaProp(false), sigmaProp(true))");
    }
}
