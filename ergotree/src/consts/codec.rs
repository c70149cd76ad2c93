//! Byte encoding of [`Constant`]: the type descriptor followed by the value laid out
//! as the type dictates.
use log::trace;
use num_bigint::BigInt;

use crate::{
    consts::{CollLiteral, Constant, EcPoint, Literal, SigmaBoolean},
    encoding::{SigmaDecode, SigmaEncode, SigmaReader, SigmaWriter, magic::MAX_BIGINT_BYTES},
    types::SType,
    utils::Error,
};

impl SigmaEncode for Constant {
    fn encode(&self, w: &mut SigmaWriter) {
        self.tpe.encode(w);
        encode_value(&self.tpe, &self.value, w);
    }
}

impl SigmaDecode for Constant {
    fn decode(r: &mut SigmaReader<'_>) -> Result<Self, Error> {
        let tpe = SType::decode(r)?;
        trace!("constant of type {} at offset {}", tpe, r.position());
        let value = decode_value(&tpe, r)?;
        Ok(Constant::new_unchecked(tpe, value))
    }
}

/// Writes the value alone. `value` must conform to `tpe`.
pub(crate) fn encode_value(tpe: &SType, value: &Literal, w: &mut SigmaWriter) {
    match (tpe, value) {
        (_, Literal::Boolean(b)) => w.put_u8(*b as u8),
        (_, Literal::Byte(v)) => w.put_u8(*v as u8),
        (_, Literal::Short(v)) => w.put_i16(*v),
        (_, Literal::Int(v)) => w.put_i32(*v),
        (_, Literal::Long(v)) => w.put_i64(*v),
        (_, Literal::BigInt(v)) => {
            let bytes = v.to_signed_bytes_be();
            w.put_u16(bytes.len() as u16);
            w.put_bytes(&bytes);
        }
        (_, Literal::GroupElement(p)) => p.encode(w),
        (_, Literal::SigmaProp(sb)) => sb.encode(w),
        (_, Literal::Coll(CollLiteral::Bytes(bytes))) => {
            w.put_u16(bytes.len() as u16);
            w.put_bytes(bytes);
        }
        (SType::SColl(elem), Literal::Coll(CollLiteral::Items(items))) => {
            w.put_u16(items.len() as u16);
            if **elem == SType::SBoolean {
                let bits = items
                    .iter()
                    .map(|item| matches!(item, Literal::Boolean(true)))
                    .collect::<Vec<_>>();
                w.put_bits(&bits);
            } else {
                items.iter().for_each(|item| encode_value(elem, item, w));
            }
        }
        (SType::STuple(types), Literal::Tup(items)) => types
            .iter()
            .zip(items)
            .for_each(|(t, item)| encode_value(t, item, w)),
        (SType::SOption(elem), Literal::Opt(inner)) => {
            w.put_option(inner.as_deref(), |w, v| encode_value(elem, v, w))
        }
        (_, Literal::Unit) => {}
        (tpe, value) => unreachable!("literal {:?} does not conform to {}", value, tpe),
    }
}

/// Reads a value of type `tpe`.
pub(crate) fn decode_value(tpe: &SType, r: &mut SigmaReader<'_>) -> Result<Literal, Error> {
    let value = match tpe {
        SType::SBoolean => match r.get_u8()? {
            0 => Literal::Boolean(false),
            1 => Literal::Boolean(true),
            other => {
                return Err(Error::TypeValueMismatch {
                    expected: "Boolean byte 0 or 1".into(),
                    found: format!("{other:#04x}"),
                });
            }
        },
        SType::SByte => Literal::Byte(r.get_u8()? as i8),
        SType::SShort => Literal::Short(r.get_i16()?),
        SType::SInt => Literal::Int(r.get_i32()?),
        SType::SLong => Literal::Long(r.get_i64()?),
        SType::SBigInt => {
            let len = r.get_u16()? as usize;
            if len > MAX_BIGINT_BYTES {
                return Err(Error::ValueOutOfRange {
                    value: len as u64,
                    max: MAX_BIGINT_BYTES as u64,
                });
            }
            if len == 0 {
                return Err(Error::TypeValueMismatch {
                    expected: "BigInt of at least one byte".into(),
                    found: "empty byte string".into(),
                });
            }
            Literal::BigInt(BigInt::from_signed_bytes_be(r.get_bytes(len)?))
        }
        SType::SGroupElement => Literal::GroupElement(EcPoint::decode(r)?),
        SType::SSigmaProp => Literal::SigmaProp(SigmaBoolean::decode(r)?),
        SType::SColl(elem) => {
            let len = r.get_u16()? as usize;
            match elem.as_ref() {
                SType::SByte => Literal::Coll(CollLiteral::Bytes(r.get_bytes(len)?.to_vec())),
                SType::SBoolean => {
                    let bits = r.get_bits(len)?;
                    Literal::Coll(CollLiteral::Items(
                        bits.into_iter().map(Literal::Boolean).collect(),
                    ))
                }
                elem => {
                    let items = (0..len)
                        .map(|_| decode_value(elem, r))
                        .collect::<Result<Vec<_>, _>>()?;
                    Literal::Coll(CollLiteral::Items(items))
                }
            }
        }
        SType::STuple(types) => Literal::Tup(
            types
                .iter()
                .map(|t| decode_value(t, r))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        SType::SOption(elem) => {
            Literal::Opt(r.get_option(|r| decode_value(elem, r).map(Box::new))?)
        }
        SType::SUnit => Literal::Unit,
        other => return Err(Error::NonSerializableType(other.clone())),
    };
    Ok(value)
}
