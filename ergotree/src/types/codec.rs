//! Byte encoding of [`SType`].
//!
//! The encoder always picks the most compact form: an embeddable primitive inside a
//! `Coll`, `Option` or pair is folded into the constructor's code, so `Coll[Byte]` is the
//! single byte `0x0e` and `(Int, Int)` is `0x58`. The decoder accepts every form and is
//! guarded by [`CodecConfig::max_type_depth`](crate::config::CodecConfig).
use log::trace;

use crate::{
    encoding::{SigmaDecode, SigmaEncode, SigmaReader, SigmaWriter, magic::*},
    types::{SType, TupleItems},
    utils::Error,
};

impl SigmaEncode for SType {
    fn encode(&self, w: &mut SigmaWriter) {
        if let Some(code) = self.embeddable_code() {
            w.put_u8(code);
            return;
        }

        match self {
            SType::SAny => w.put_u8(T_ANY),
            SType::SUnit => w.put_u8(T_UNIT),
            SType::SBox => w.put_u8(T_BOX),
            SType::SAvlTree => w.put_u8(T_AVL_TREE),
            SType::SContext => w.put_u8(T_CONTEXT),
            SType::SString => w.put_u8(T_STRING),
            SType::SHeader => w.put_u8(T_HEADER),
            SType::SPreHeader => w.put_u8(T_PRE_HEADER),
            SType::SGlobal => w.put_u8(T_GLOBAL),
            SType::STypeVar(name) => {
                debug_assert!(name.len() <= u8::MAX as usize, "type variable name too long");
                w.put_u8(T_TYPE_VAR);
                w.put_u8(name.len() as u8);
                w.put_bytes(name.as_bytes());
            }
            SType::SColl(elem) => encode_wrapped(w, T_COLL, T_NESTED_COLL, elem),
            SType::SOption(elem) => encode_wrapped(w, T_OPTION, T_OPTION_COLL, elem),
            SType::STuple(items) => encode_tuple(w, items),
            _ => unreachable!("embeddable types are handled above"),
        }
    }
}

/// `Coll` and `Option` share a layout: `base + prim`, `nested + prim` when the element is
/// a collection of primitives, otherwise `base` followed by the element type.
fn encode_wrapped(w: &mut SigmaWriter, base: u8, nested: u8, elem: &SType) {
    if let Some(code) = elem.embeddable_code() {
        w.put_u8(base + code);
        return;
    }

    if let SType::SColl(inner) = elem {
        if let Some(code) = inner.embeddable_code() {
            w.put_u8(nested + code);
            return;
        }
    }

    w.put_u8(base);
    elem.encode(w);
}

fn encode_tuple(w: &mut SigmaWriter, items: &TupleItems) {
    match items.as_slice() {
        [a, b] => match (a.embeddable_code(), b.embeddable_code()) {
            (Some(ca), Some(_)) if a == b => w.put_u8(T_PAIR_SYMMETRIC + ca),
            (Some(ca), _) => {
                w.put_u8(T_PAIR1 + ca);
                b.encode(w);
            }
            (None, Some(cb)) => {
                w.put_u8(T_PAIR2 + cb);
                a.encode(w);
            }
            (None, None) => {
                w.put_u8(T_PAIR1);
                a.encode(w);
                b.encode(w);
            }
        },
        [_, _, _] => {
            w.put_u8(T_PAIR2);
            items.iter().for_each(|t| t.encode(w));
        }
        [_, _, _, _] => {
            w.put_u8(T_PAIR_SYMMETRIC);
            items.iter().for_each(|t| t.encode(w));
        }
        _ => {
            w.put_u8(T_TUPLE);
            w.put_u8(items.len() as u8);
            items.iter().for_each(|t| t.encode(w));
        }
    }
}

impl SigmaDecode for SType {
    fn decode(r: &mut SigmaReader<'_>) -> Result<Self, Error> {
        decode_at(r, 1)
    }
}

fn decode_at(r: &mut SigmaReader<'_>, depth: usize) -> Result<SType, Error> {
    let max = r.config().max_type_depth;
    if depth > max {
        return Err(Error::TypeDepthExceeded { max });
    }

    let code = r.get_u8()?;
    trace!("type code {:#04x} at depth {}", code, depth);

    if code > 0 && code < T_TUPLE {
        let constr = code / PRIM_RANGE;
        let prim = code % PRIM_RANGE;

        // An embedded primitive, or, for code offset 0, a full descriptor that follows.
        let arg = |r: &mut SigmaReader<'_>| -> Result<SType, Error> {
            if prim == 0 {
                decode_at(r, depth + 1)
            } else {
                embeddable(code, prim)
            }
        };

        let ty = match constr {
            0 => embeddable(code, prim)?,
            1 => SType::coll(arg(r)?),
            2 => SType::coll(SType::coll(arg(r)?)),
            3 => SType::option(arg(r)?),
            4 => SType::option(SType::coll(arg(r)?)),
            5 => {
                let first = arg(r)?;
                let second = decode_at(r, depth + 1)?;
                SType::pair(first, second)
            }
            6 if prim == 0 => tuple(r, 3, depth)?,
            6 => {
                let first = decode_at(r, depth + 1)?;
                SType::pair(first, embeddable(code, prim)?)
            }
            7 if prim == 0 => tuple(r, 4, depth)?,
            7 => {
                let elem = embeddable(code, prim)?;
                SType::pair(elem.clone(), elem)
            }
            _ => return Err(Error::InvalidTypeCode(code)),
        };
        return Ok(ty);
    }

    let ty = match code {
        T_TUPLE => {
            let len = r.get_u8()? as usize;
            if len < TupleItems::MIN_LEN {
                return Err(Error::InvalidTypeCode(code));
            }
            tuple(r, len, depth)?
        }
        T_ANY => SType::SAny,
        T_UNIT => SType::SUnit,
        T_BOX => SType::SBox,
        T_AVL_TREE => SType::SAvlTree,
        T_CONTEXT => SType::SContext,
        T_STRING => SType::SString,
        T_HEADER => SType::SHeader,
        T_PRE_HEADER => SType::SPreHeader,
        T_GLOBAL => SType::SGlobal,
        T_TYPE_VAR => {
            let len = r.get_u8()? as usize;
            let bytes = r.get_bytes(len)?;
            let name = std::str::from_utf8(bytes).map_err(|e| Error::TypeValueMismatch {
                expected: "UTF-8 type variable name".into(),
                found: e.to_string(),
            })?;
            SType::STypeVar(name.to_string())
        }
        _ => return Err(Error::InvalidTypeCode(code)),
    };
    Ok(ty)
}

fn embeddable(code: u8, prim: u8) -> Result<SType, Error> {
    SType::from_embeddable_code(prim).ok_or(Error::InvalidTypeCode(code))
}

fn tuple(r: &mut SigmaReader<'_>, len: usize, depth: usize) -> Result<SType, Error> {
    let items = (0..len)
        .map(|_| decode_at(r, depth + 1))
        .collect::<Result<Vec<_>, _>>()?;
    let items = TupleItems::try_from(items).map_err(|e| Error::TypeValueMismatch {
        expected: "tuple of 2 to 255 items".into(),
        found: e.to_string(),
    })?;
    Ok(SType::STuple(items))
}
