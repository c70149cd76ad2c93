//! Byte encoding of [`Expr`].
//!
//! Each node starts with its opcode. A leading byte at or below
//! [`LAST_CONSTANT_CODE`] is not an opcode but the type code of an inline constant.
//! Decoding needs the constant segment of the enclosing tree to check placeholders,
//! so [`Expr::decode`] takes it as an argument instead of implementing
//! [`SigmaDecode`].
//!
//! Encoding assumes [`Expr::check_encodable`] holds; [`crate::ErgoTree::new`] checks it
//! and decoded trees satisfy it by construction.
//!
//! After an opcode that packs two boolean operands, a leading [`BOOL_COLLECTION`] byte
//! always means the packed pair. A boolean collection in the left operand of such an
//! opcode is therefore written in the [`CONCRETE_COLLECTION`] form.
use log::trace;

use crate::{
    consts::Constant,
    encoding::{SigmaDecode, SigmaEncode, SigmaReader, SigmaWriter, magic::LAST_CONSTANT_CODE},
    expr::{
        BinaryOp, CastOp, ConstantPlaceholder, Expr, FuncArg, NullaryOp, SigmaConnective,
        TernaryOp, UnaryOp, opcode::*,
    },
    types::SType,
    utils::Error,
};

impl SigmaEncode for Expr {
    fn encode(&self, w: &mut SigmaWriter) {
        let Some(code) = self.op_code() else {
            if let Expr::Const(c) = self {
                c.encode(w);
            }
            return;
        };
        w.put_u8(code);

        match self {
            Expr::Const(_) | Expr::Nullary(_) => {}
            Expr::ConstPlaceholder(p) => w.put_u32(p.index),
            Expr::Unary { input, .. } => input.encode(w),
            Expr::Binary { op, left, right } => {
                match (left.as_bool_const(), right.as_bool_const()) {
                    (Some(l), Some(r)) if op.packs_boolean_operands() => {
                        w.put_u8(BOOL_COLLECTION);
                        w.put_bits(&[l, r]);
                    }
                    _ => {
                        match left.as_ref() {
                            Expr::ConcreteCollection { elem_tpe, items }
                                if op.packs_boolean_operands() && left.is_boolean_collection() =>
                            {
                                w.put_u8(CONCRETE_COLLECTION);
                                put_collection(w, elem_tpe, items);
                            }
                            _ => left.encode(w),
                        }
                        right.encode(w);
                    }
                }
            }
            Expr::Ternary {
                first,
                second,
                third,
                ..
            } => {
                first.encode(w);
                second.encode(w);
                third.encode(w);
            }
            Expr::TaggedVariable { id, tpe } => {
                w.put_u8(*id);
                tpe.encode(w);
            }
            Expr::ValUse { id } => w.put_u32(*id),
            Expr::Cast { input, tpe, .. } => {
                input.encode(w);
                tpe.encode(w);
            }
            Expr::ConcreteCollection { items, .. } if code == BOOL_COLLECTION => {
                let bits = items
                    .iter()
                    .map(|item| item.as_bool_const().unwrap_or(false))
                    .collect::<Vec<_>>();
                put_count_u16(w, bits.len());
                w.put_bits(&bits);
            }
            Expr::ConcreteCollection { elem_tpe, items } => put_collection(w, elem_tpe, items),
            Expr::Tuple(items) => {
                debug_assert!(items.len() <= u8::MAX as usize);
                w.put_u8(items.len() as u8);
                items.iter().for_each(|item| item.encode(w));
            }
            Expr::SelectField { input, field } => {
                input.encode(w);
                w.put_u8(*field);
            }
            Expr::ByIndex {
                input,
                index,
                default,
            } => {
                input.encode(w);
                index.encode(w);
                w.put_option(default.as_deref(), |w, d| d.encode(w));
            }
            Expr::ExtractRegisterAs {
                input,
                register,
                tpe,
            } => {
                input.encode(w);
                w.put_u8(*register);
                tpe.encode(w);
            }
            Expr::CreateProveDhTuple { g, h, u, v } => {
                [g, h, u, v].iter().for_each(|e| e.encode(w));
            }
            Expr::DeserializeContext { tpe, id } => {
                tpe.encode(w);
                w.put_u8(*id);
            }
            Expr::DeserializeRegister {
                register,
                tpe,
                default,
            } => {
                w.put_u8(*register);
                tpe.encode(w);
                w.put_option(default.as_deref(), |w, d| d.encode(w));
            }
            Expr::ValDef { id, rhs } => {
                w.put_u32(*id);
                rhs.encode(w);
            }
            Expr::BlockValue { items, result } => {
                w.put_len(items.len());
                items.iter().for_each(|item| item.encode(w));
                result.encode(w);
            }
            Expr::FuncValue { args, body } => {
                w.put_len(args.len());
                for arg in args {
                    w.put_u32(arg.id);
                    arg.tpe.encode(w);
                }
                body.encode(w);
            }
            Expr::Apply { func, args } => {
                func.encode(w);
                w.put_len(args.len());
                args.iter().for_each(|arg| arg.encode(w));
            }
            Expr::PropertyCall {
                type_id,
                method_id,
                obj,
            } => {
                w.put_u8(*type_id);
                w.put_u8(*method_id);
                obj.encode(w);
            }
            Expr::MethodCall {
                type_id,
                method_id,
                obj,
                args,
            } => {
                w.put_u8(*type_id);
                w.put_u8(*method_id);
                obj.encode(w);
                w.put_len(args.len());
                args.iter().for_each(|arg| arg.encode(w));
            }
            Expr::GetVar { id, tpe } => {
                w.put_u8(*id);
                tpe.encode(w);
            }
            Expr::SigmaConj { items, .. } => {
                w.put_len(items.len());
                items.iter().for_each(|item| item.encode(w));
            }
        }
    }
}

fn put_count_u16(w: &mut SigmaWriter, len: usize) {
    debug_assert!(len <= u16::MAX as usize);
    w.put_u16(len as u16);
}

fn put_collection(w: &mut SigmaWriter, elem_tpe: &SType, items: &[Expr]) {
    put_count_u16(w, items.len());
    elem_tpe.encode(w);
    items.iter().for_each(|item| item.encode(w));
}

impl Expr {
    /// Decode one expression. Placeholders are checked against `constants`, which is
    /// empty for trees without a constant segment.
    pub fn decode(r: &mut SigmaReader<'_>, constants: &[Constant]) -> Result<Expr, Error> {
        Decoder { constants }.expr(r, 1)
    }
}

struct Decoder<'c> {
    constants: &'c [Constant],
}

impl Decoder<'_> {
    fn expr(&self, r: &mut SigmaReader<'_>, depth: usize) -> Result<Expr, Error> {
        let max = r.config().max_expr_depth;
        if depth > max {
            return Err(Error::ExprDepthExceeded { max });
        }

        let code = r.peek_u8()?;
        if code <= LAST_CONSTANT_CODE {
            return Constant::decode(r).map(Expr::Const);
        }
        r.get_u8()?;
        trace!("opcode {:#04x} at offset {}", code, r.position() - 1);

        let child = |r: &mut SigmaReader<'_>| self.expr(r, depth + 1).map(Box::new);
        let children = |r: &mut SigmaReader<'_>, count: usize| {
            (0..count)
                .map(|_| self.expr(r, depth + 1))
                .collect::<Result<Vec<_>, _>>()
        };

        if let Some(op) = NullaryOp::from_repr(code) {
            return Ok(Expr::Nullary(op));
        }
        if let Some(op) = UnaryOp::from_repr(code) {
            return Ok(Expr::Unary {
                op,
                input: child(r)?,
            });
        }
        if let Some(op) = BinaryOp::from_repr(code) {
            if op.packs_boolean_operands() && r.peek_u8()? == BOOL_COLLECTION {
                r.get_u8()?;
                let bits = r.get_bits(2)?;
                return Ok(Expr::binary(
                    op,
                    Constant::from(bits[0]).into(),
                    Constant::from(bits[1]).into(),
                ));
            }
            let left = child(r)?;
            let right = child(r)?;
            return Ok(Expr::Binary { op, left, right });
        }
        if let Some(op) = TernaryOp::from_repr(code) {
            let first = child(r)?;
            let second = child(r)?;
            let third = child(r)?;
            return Ok(Expr::Ternary {
                op,
                first,
                second,
                third,
            });
        }
        if let Some(op) = CastOp::from_repr(code) {
            let input = child(r)?;
            let tpe = SType::decode(r)?;
            return Ok(Expr::Cast { op, input, tpe });
        }
        if let Some(op) = SigmaConnective::from_repr(code) {
            let count = r.get_len()?;
            let items = children(r, count)?;
            return Ok(Expr::SigmaConj { op, items });
        }

        let expr = match code {
            CONSTANT_PLACEHOLDER => {
                let index = r.get_u32()?;
                let placeholder = ConstantPlaceholder::new(index);
                if placeholder.resolve(self.constants).is_none() {
                    return Err(Error::InvalidPlaceholder {
                        index,
                        len: self.constants.len(),
                    });
                }
                Expr::ConstPlaceholder(placeholder)
            }
            TAGGED_VARIABLE => Expr::TaggedVariable {
                id: r.get_u8()?,
                tpe: SType::decode(r)?,
            },
            VAL_USE => Expr::ValUse { id: r.get_u32()? },
            CONCRETE_COLLECTION => {
                let count = r.get_u16()? as usize;
                let elem_tpe = SType::decode(r)?;
                let items = children(r, count)?;
                Expr::ConcreteCollection { elem_tpe, items }
            }
            BOOL_COLLECTION => {
                let count = r.get_u16()? as usize;
                let items = r
                    .get_bits(count)?
                    .into_iter()
                    .map(|b| Expr::Const(Constant::from(b)))
                    .collect();
                Expr::ConcreteCollection {
                    elem_tpe: SType::SBoolean,
                    items,
                }
            }
            TUPLE => {
                let count = r.get_u8()? as usize;
                Expr::Tuple(children(r, count)?)
            }
            SELECT_FIELD => Expr::SelectField {
                input: child(r)?,
                field: r.get_u8()?,
            },
            BY_INDEX => Expr::ByIndex {
                input: child(r)?,
                index: child(r)?,
                default: r.get_option(child)?,
            },
            EXTRACT_REGISTER_AS => Expr::ExtractRegisterAs {
                input: child(r)?,
                register: r.get_u8()?,
                tpe: SType::decode(r)?,
            },
            CREATE_PROVE_DH_TUPLE => Expr::CreateProveDhTuple {
                g: child(r)?,
                h: child(r)?,
                u: child(r)?,
                v: child(r)?,
            },
            DESERIALIZE_CONTEXT => Expr::DeserializeContext {
                tpe: SType::decode(r)?,
                id: r.get_u8()?,
            },
            DESERIALIZE_REGISTER => Expr::DeserializeRegister {
                register: r.get_u8()?,
                tpe: SType::decode(r)?,
                default: r.get_option(child)?,
            },
            VAL_DEF => Expr::ValDef {
                id: r.get_u32()?,
                rhs: child(r)?,
            },
            BLOCK_VALUE => {
                let count = r.get_len()?;
                let items = children(r, count)?;
                Expr::BlockValue {
                    items,
                    result: child(r)?,
                }
            }
            FUNC_VALUE => {
                let count = r.get_len()?;
                let args = (0..count)
                    .map(|_| -> Result<FuncArg, Error> {
                        Ok(FuncArg {
                            id: r.get_u32()?,
                            tpe: SType::decode(r)?,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::FuncValue {
                    args,
                    body: child(r)?,
                }
            }
            APPLY => {
                let func = child(r)?;
                let count = r.get_len()?;
                Expr::Apply {
                    func,
                    args: children(r, count)?,
                }
            }
            PROPERTY_CALL => Expr::PropertyCall {
                type_id: r.get_u8()?,
                method_id: r.get_u8()?,
                obj: child(r)?,
            },
            METHOD_CALL => {
                let type_id = r.get_u8()?;
                let method_id = r.get_u8()?;
                let obj = child(r)?;
                let count = r.get_len()?;
                Expr::MethodCall {
                    type_id,
                    method_id,
                    obj,
                    args: children(r, count)?,
                }
            }
            GET_VAR => Expr::GetVar {
                id: r.get_u8()?,
                tpe: SType::decode(r)?,
            },
            other => return Err(Error::InvalidOpcode(other)),
        };
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;

    fn decode_with(bytes: &[u8], constants: &[Constant]) -> Result<Expr, Error> {
        let mut r = SigmaReader::new(bytes);
        let expr = Expr::decode(&mut r, constants)?;
        assert!(r.is_empty(), "{} byte(s) left", r.remaining());
        Ok(expr)
    }

    fn roundtrip(bytes: &[u8], constants: &[Constant]) -> Expr {
        let expr = decode_with(bytes, constants).unwrap();
        assert_eq!(expr.to_bytes(), bytes);
        expr
    }

    #[test]
    fn sample_root() {
        let constants = [Constant::from_i32(720), Constant::from(true)];
        let bytes = hex::decode("ea02d192a39a8cc7a70173007301").unwrap();
        let root = roundtrip(&bytes, &constants);

        let Expr::SigmaConj { op, items } = &root else {
            panic!("unexpected root {root:?}");
        };
        assert_eq!(*op, SigmaConnective::SigmaAnd);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], Expr::ConstPlaceholder(ConstantPlaceholder::new(1)));
        assert!(matches!(
            &items[0],
            Expr::Unary {
                op: UnaryOp::BoolToSigmaProp,
                ..
            }
        ));
    }

    #[test]
    fn placeholder_out_of_range() {
        assert_eq!(
            decode_with(&[0x73, 0x02], &[Constant::from_i32(1)]),
            Err(Error::InvalidPlaceholder { index: 2, len: 1 })
        );
        assert_eq!(
            decode_with(&[0x73, 0x00], &[]),
            Err(Error::InvalidPlaceholder { index: 0, len: 0 })
        );
    }

    #[test]
    fn inline_constants() {
        let expr = roundtrip(&[0x93, 0x04, 0x02, 0x04, 0x04], &[]);
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Eq,
                Constant::from_i32(1).into(),
                Constant::from_i32(2).into()
            )
        );
    }

    #[test]
    fn boolean_operands_are_packed() {
        let expr = Expr::binary(
            BinaryOp::BinAnd,
            Constant::from(true).into(),
            Constant::from(false).into(),
        );
        let bytes = expr.to_bytes();
        assert_eq!(bytes, vec![0xed, 0x85, 0x01]);
        assert_eq!(decode_with(&bytes, &[]), Ok(expr));

        // Arithmetic keeps the plain layout.
        let plus = Expr::binary(
            BinaryOp::Plus,
            Constant::from(true).into(),
            Constant::from(false).into(),
        );
        assert_eq!(plus.to_bytes(), vec![0x9a, 0x01, 0x01, 0x01, 0x00]);
    }

    #[test]
    fn boolean_collection_beside_packed_operands() {
        // Eq(Coll(true, false), Coll(true)): the left side cannot start with 0x85.
        let bools = |values: &[bool]| Expr::ConcreteCollection {
            elem_tpe: SType::SBoolean,
            items: values.iter().map(|&b| Constant::from(b).into()).collect(),
        };
        let expr = Expr::binary(BinaryOp::Eq, bools(&[true, false]), bools(&[true]));
        let bytes = expr.to_bytes();
        assert_eq!(
            bytes,
            vec![
                0x93, // ==
                0x83, 0x02, 0x01, 0x01, 0x01, 0x01, 0x00, // Coll[Boolean](true, false)
                0x85, 0x01, 0x01, // Coll(true), packed
            ]
        );
        assert_eq!(decode_with(&bytes, &[]), Ok(expr));

        // Arithmetic never packs, so the left operand keeps the short form.
        let plus = Expr::binary(BinaryOp::Plus, bools(&[true]), bools(&[]));
        assert_eq!(plus.to_bytes(), vec![0x9a, 0x85, 0x01, 0x01, 0x85, 0x00]);
        assert_eq!(decode_with(&plus.to_bytes(), &[]), Ok(plus));
    }

    #[test]
    fn boolean_collection() {
        let expr = roundtrip(&[0x85, 0x03, 0x05], &[]);
        let Expr::ConcreteCollection { elem_tpe, items } = expr else {
            panic!("expected a collection");
        };
        assert_eq!(elem_tpe, SType::SBoolean);
        let values: Vec<_> = items.iter().filter_map(Expr::as_bool_const).collect();
        assert_eq!(values, vec![true, false, true]);
    }

    #[test]
    fn structured_nodes() {
        // { val v1 = getVar[Int](1); (x: Int) => v1 }
        let bytes = [
            0xd8, 0x01, // block with one item
            0xd6, 0x01, 0xe3, 0x01, 0x04, // val v1 = getVar[Int](1)
            0xd9, 0x01, 0x02, 0x04, // (v2: Int) =>
            0x72, 0x01, // v1
        ];
        let expr = roundtrip(&bytes, &[]);
        assert!(expr.is_block_value());

        // INPUTS(0).R4[Long], default omitted
        roundtrip(&[0xc6, 0xb2, 0xa4, 0x04, 0x00, 0x00, 0x04, 0x05], &[]);
        // OUTPUTS.getOrElse(1, SELF)
        roundtrip(&[0xb2, 0xa5, 0x04, 0x02, 0x01, 0xa7], &[]);
        // (HEIGHT, CONTEXT.<101:3>(HEIGHT))
        roundtrip(
            &[0x86, 0x02, 0xa3, 0xdc, 0x65, 0x03, 0xfe, 0x01, 0xa3],
            &[],
        );
    }

    #[test]
    fn invalid_opcode() {
        assert_eq!(decode_with(&[0x84], &[]), Err(Error::InvalidOpcode(0x84)));
        assert_eq!(
            decode_with(&[0xea, 0x01, 0x75], &[]),
            Err(Error::InvalidOpcode(0x75))
        );
    }

    #[test]
    fn truncated_child() {
        assert_eq!(
            decode_with(&[0x9a, 0xa3], &[]),
            Err(Error::UnexpectedEndOfInput { needed: 1 })
        );
    }

    #[test]
    fn depth_is_bounded() {
        // LogicalNot nested far beyond the default limit.
        let mut bytes = vec![0xef; 10_000];
        bytes.push(0x7f);
        assert_eq!(
            Expr::decode(&mut SigmaReader::new(&bytes), &[]),
            Err(Error::ExprDepthExceeded {
                max: CodecConfig::default().max_expr_depth
            })
        );

        let config = CodecConfig {
            max_expr_depth: 2,
            ..CodecConfig::default()
        };
        let mut r = SigmaReader::with_config(&[0xef, 0x7f], config);
        assert!(Expr::decode(&mut r, &[]).is_ok());
        let mut r = SigmaReader::with_config(&[0xef, 0xef, 0x7f], config);
        assert_eq!(
            Expr::decode(&mut r, &[]),
            Err(Error::ExprDepthExceeded { max: 2 })
        );
    }
}
