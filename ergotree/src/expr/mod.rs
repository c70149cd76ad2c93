//! Expression tree.
//!
//! [`Expr`] is a strict tree: every node owns its children and nothing is shared. Inline
//! literals are [`Expr::Const`]; references into the owning tree's constant segment are
//! [`Expr::ConstPlaceholder`] and are resolved against that segment on demand.
use strum::EnumIs;

use crate::{consts::Constant, types::SType, utils::Error};

pub mod codec;
pub mod opcode;
pub mod pretty;

pub use opcode::{BinaryOp, CastOp, NullaryOp, SigmaConnective, TernaryOp, UnaryOp};

/// Reference to an entry of the constant segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstantPlaceholder {
    pub index: u32,
}

impl ConstantPlaceholder {
    pub fn new(index: u32) -> Self {
        Self { index }
    }

    /// Look the placeholder up in `constants`.
    pub fn resolve<'a>(&self, constants: &'a [Constant]) -> Option<&'a Constant> {
        constants.get(self.index as usize)
    }
}

/// Argument of a [`Expr::FuncValue`]: the id later read by [`Expr::ValUse`] and its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncArg {
    pub id: u32,
    pub tpe: SType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs)]
pub enum Expr {
    Const(Constant),
    ConstPlaceholder(ConstantPlaceholder),
    Nullary(NullaryOp),
    Unary {
        op: UnaryOp,
        input: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        op: TernaryOp,
        first: Box<Expr>,
        second: Box<Expr>,
        third: Box<Expr>,
    },
    /// Context variable read by id.
    TaggedVariable {
        id: u8,
        tpe: SType,
    },
    /// Reference to a value bound by [`Expr::ValDef`] or a function argument.
    ValUse {
        id: u32,
    },
    Cast {
        op: CastOp,
        input: Box<Expr>,
        tpe: SType,
    },
    /// Collection literal built from arbitrary expressions.
    ConcreteCollection {
        elem_tpe: SType,
        items: Vec<Expr>,
    },
    Tuple(Vec<Expr>),
    /// Tuple component access; `field` is 1-based.
    SelectField {
        input: Box<Expr>,
        field: u8,
    },
    ByIndex {
        input: Box<Expr>,
        index: Box<Expr>,
        default: Option<Box<Expr>>,
    },
    ExtractRegisterAs {
        input: Box<Expr>,
        register: u8,
        tpe: SType,
    },
    CreateProveDhTuple {
        g: Box<Expr>,
        h: Box<Expr>,
        u: Box<Expr>,
        v: Box<Expr>,
    },
    DeserializeContext {
        tpe: SType,
        id: u8,
    },
    DeserializeRegister {
        register: u8,
        tpe: SType,
        default: Option<Box<Expr>>,
    },
    ValDef {
        id: u32,
        rhs: Box<Expr>,
    },
    BlockValue {
        items: Vec<Expr>,
        result: Box<Expr>,
    },
    FuncValue {
        args: Vec<FuncArg>,
        body: Box<Expr>,
    },
    Apply {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    PropertyCall {
        type_id: u8,
        method_id: u8,
        obj: Box<Expr>,
    },
    MethodCall {
        type_id: u8,
        method_id: u8,
        obj: Box<Expr>,
        args: Vec<Expr>,
    },
    GetVar {
        id: u8,
        tpe: SType,
    },
    SigmaConj {
        op: SigmaConnective,
        items: Vec<Expr>,
    },
}

impl From<Constant> for Expr {
    fn from(c: Constant) -> Self {
        Expr::Const(c)
    }
}

impl From<ConstantPlaceholder> for Expr {
    fn from(p: ConstantPlaceholder) -> Self {
        Expr::ConstPlaceholder(p)
    }
}

impl From<NullaryOp> for Expr {
    fn from(op: NullaryOp) -> Self {
        Expr::Nullary(op)
    }
}

impl Expr {
    pub fn unary(op: UnaryOp, input: Expr) -> Self {
        Expr::Unary {
            op,
            input: Box::new(input),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn ternary(op: TernaryOp, first: Expr, second: Expr, third: Expr) -> Self {
        Expr::Ternary {
            op,
            first: Box::new(first),
            second: Box::new(second),
            third: Box::new(third),
        }
    }

    /// Leading byte of this node, or `None` for an inline constant whose encoding
    /// starts with its type code.
    pub fn op_code(&self) -> Option<u8> {
        use opcode::*;

        let code = match self {
            Expr::Const(_) => return None,
            Expr::ConstPlaceholder(_) => CONSTANT_PLACEHOLDER,
            Expr::Nullary(op) => *op as u8,
            Expr::Unary { op, .. } => *op as u8,
            Expr::Binary { op, .. } => *op as u8,
            Expr::Ternary { op, .. } => *op as u8,
            Expr::TaggedVariable { .. } => TAGGED_VARIABLE,
            Expr::ValUse { .. } => VAL_USE,
            Expr::Cast { op, .. } => *op as u8,
            Expr::ConcreteCollection { .. } if self.is_boolean_collection() => BOOL_COLLECTION,
            Expr::ConcreteCollection { .. } => CONCRETE_COLLECTION,
            Expr::Tuple(_) => TUPLE,
            Expr::SelectField { .. } => SELECT_FIELD,
            Expr::ByIndex { .. } => BY_INDEX,
            Expr::ExtractRegisterAs { .. } => EXTRACT_REGISTER_AS,
            Expr::CreateProveDhTuple { .. } => CREATE_PROVE_DH_TUPLE,
            Expr::DeserializeContext { .. } => DESERIALIZE_CONTEXT,
            Expr::DeserializeRegister { .. } => DESERIALIZE_REGISTER,
            Expr::ValDef { .. } => VAL_DEF,
            Expr::BlockValue { .. } => BLOCK_VALUE,
            Expr::FuncValue { .. } => FUNC_VALUE,
            Expr::Apply { .. } => APPLY,
            Expr::PropertyCall { .. } => PROPERTY_CALL,
            Expr::MethodCall { .. } => METHOD_CALL,
            Expr::GetVar { .. } => GET_VAR,
            Expr::SigmaConj { op, .. } => *op as u8,
        };
        Some(code)
    }

    /// Returns the value of an inline `Boolean` constant.
    pub fn as_bool_const(&self) -> Option<bool> {
        match self {
            Expr::Const(c) => bool::try_from(c).ok(),
            _ => None,
        }
    }

    /// A `Coll[Boolean]` whose items are all inline boolean constants; these use the
    /// packed [`opcode::BOOL_COLLECTION`] form.
    pub(crate) fn is_boolean_collection(&self) -> bool {
        match self {
            Expr::ConcreteCollection { elem_tpe, items } => {
                *elem_tpe == SType::SBoolean && items.iter().all(|i| i.as_bool_const().is_some())
            }
            _ => false,
        }
    }

    /// Visit the direct children in encoding order.
    pub fn for_each_child<'a>(&'a self, mut f: impl FnMut(&'a Expr)) {
        match self {
            Expr::Const(_)
            | Expr::ConstPlaceholder(_)
            | Expr::Nullary(_)
            | Expr::TaggedVariable { .. }
            | Expr::ValUse { .. }
            | Expr::DeserializeContext { .. }
            | Expr::GetVar { .. } => {}
            Expr::Unary { input, .. }
            | Expr::Cast { input, .. }
            | Expr::SelectField { input, .. }
            | Expr::ExtractRegisterAs { input, .. }
            | Expr::PropertyCall { obj: input, .. } => f(input),
            Expr::ValDef { rhs, .. } => f(rhs),
            Expr::FuncValue { body, .. } => f(body),
            Expr::Binary { left, right, .. } => {
                f(left);
                f(right);
            }
            Expr::Ternary {
                first,
                second,
                third,
                ..
            } => {
                f(first);
                f(second);
                f(third);
            }
            Expr::ConcreteCollection { items, .. }
            | Expr::Tuple(items)
            | Expr::SigmaConj { items, .. } => items.iter().for_each(f),
            Expr::ByIndex {
                input,
                index,
                default,
            } => {
                f(input);
                f(index);
                if let Some(d) = default {
                    f(d);
                }
            }
            Expr::CreateProveDhTuple { g, h, u, v } => {
                f(g);
                f(h);
                f(u);
                f(v);
            }
            Expr::DeserializeRegister { default, .. } => {
                if let Some(d) = default {
                    f(d);
                }
            }
            Expr::BlockValue { items, result } => {
                items.iter().for_each(&mut f);
                f(result);
            }
            Expr::Apply { func, args } => {
                f(func);
                args.iter().for_each(f);
            }
            Expr::MethodCall { obj, args, .. } => {
                f(obj);
                args.iter().for_each(f);
            }
        }
    }

    /// Mutable counterpart of [`Self::for_each_child`], same order.
    pub fn for_each_child_mut(&mut self, mut f: impl FnMut(&mut Expr)) {
        match self {
            Expr::Const(_)
            | Expr::ConstPlaceholder(_)
            | Expr::Nullary(_)
            | Expr::TaggedVariable { .. }
            | Expr::ValUse { .. }
            | Expr::DeserializeContext { .. }
            | Expr::GetVar { .. } => {}
            Expr::Unary { input, .. }
            | Expr::Cast { input, .. }
            | Expr::SelectField { input, .. }
            | Expr::ExtractRegisterAs { input, .. }
            | Expr::PropertyCall { obj: input, .. } => f(input),
            Expr::ValDef { rhs, .. } => f(rhs),
            Expr::FuncValue { body, .. } => f(body),
            Expr::Binary { left, right, .. } => {
                f(left);
                f(right);
            }
            Expr::Ternary {
                first,
                second,
                third,
                ..
            } => {
                f(first);
                f(second);
                f(third);
            }
            Expr::ConcreteCollection { items, .. }
            | Expr::Tuple(items)
            | Expr::SigmaConj { items, .. } => items.iter_mut().for_each(f),
            Expr::ByIndex {
                input,
                index,
                default,
            } => {
                f(input);
                f(index);
                if let Some(d) = default {
                    f(d);
                }
            }
            Expr::CreateProveDhTuple { g, h, u, v } => {
                f(g);
                f(h);
                f(u);
                f(v);
            }
            Expr::DeserializeRegister { default, .. } => {
                if let Some(d) = default {
                    f(d);
                }
            }
            Expr::BlockValue { items, result } => {
                items.iter_mut().for_each(&mut f);
                f(result);
            }
            Expr::Apply { func, args } => {
                f(func);
                args.iter_mut().for_each(f);
            }
            Expr::MethodCall { obj, args, .. } => {
                f(obj);
                args.iter_mut().for_each(f);
            }
        }
    }

    /// Calls `f` on every placeholder in the tree, in encoding order.
    pub fn visit_placeholders(&self, f: &mut impl FnMut(&ConstantPlaceholder)) {
        match self {
            Expr::ConstPlaceholder(p) => f(p),
            other => other.for_each_child(|child| child.visit_placeholders(f)),
        }
    }

    /// Replace every node for which `f` returns `Some` with the returned node, visiting
    /// the tree top-down in encoding order. Replaced nodes are not descended into.
    pub fn rewrite(&mut self, f: &mut impl FnMut(&Expr) -> Option<Expr>) {
        match f(self) {
            Some(replacement) => *self = replacement,
            None => self.for_each_child_mut(|child| child.rewrite(f)),
        }
    }

    /// Check that every count and type in the tree fits the length prefix it is
    /// encoded with: tuples hold at most 255 items, literal collections at most
    /// `u16::MAX`, other sequences at most `u32::MAX`.
    pub fn check_encodable(&self) -> Result<(), Error> {
        match self {
            Expr::Tuple(items) => bounded(items.len(), u8::MAX as usize)?,
            Expr::ConcreteCollection { elem_tpe, items } => {
                bounded(items.len(), u16::MAX as usize)?;
                elem_tpe.check_encodable()?;
            }
            Expr::SigmaConj { items, .. }
            | Expr::BlockValue { items, .. }
            | Expr::Apply { args: items, .. }
            | Expr::MethodCall { args: items, .. } => bounded(items.len(), u32::MAX as usize)?,
            Expr::FuncValue { args, .. } => {
                bounded(args.len(), u32::MAX as usize)?;
                args.iter().try_for_each(|arg| arg.tpe.check_encodable())?;
            }
            Expr::TaggedVariable { tpe, .. }
            | Expr::Cast { tpe, .. }
            | Expr::ExtractRegisterAs { tpe, .. }
            | Expr::DeserializeContext { tpe, .. }
            | Expr::DeserializeRegister { tpe, .. }
            | Expr::GetVar { tpe, .. } => tpe.check_encodable()?,
            _ => {}
        }

        let mut result = Ok(());
        self.for_each_child(|child| {
            if result.is_ok() {
                result = child.check_encodable();
            }
        });
        result
    }

    /// Nesting depth; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        self.for_each_child(|child| deepest = deepest.max(child.depth()));
        1 + deepest
    }
}

fn bounded(len: usize, max: usize) -> Result<(), Error> {
    if len > max {
        return Err(Error::ValueOutOfRange {
            value: len as u64,
            max: max as u64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_root() -> Expr {
        // sigmaAnd(sigmaProp(HEIGHT >= SELF.creationInfo._1 + $0), $1)
        let creation_height = Expr::SelectField {
            input: Box::new(Expr::unary(
                UnaryOp::ExtractCreationInfo,
                NullaryOp::SelfBox.into(),
            )),
            field: 1,
        };
        let bound = Expr::binary(
            BinaryOp::Plus,
            creation_height,
            ConstantPlaceholder::new(0).into(),
        );
        let guard = Expr::binary(BinaryOp::Ge, NullaryOp::Height.into(), bound);
        Expr::SigmaConj {
            op: SigmaConnective::SigmaAnd,
            items: vec![
                Expr::unary(UnaryOp::BoolToSigmaProp, guard),
                ConstantPlaceholder::new(1).into(),
            ],
        }
    }

    #[test]
    fn placeholders_are_visited_in_order() {
        let mut seen = Vec::new();
        sample_root().visit_placeholders(&mut |p| seen.push(p.index));
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn rewrite_replaces_matching_nodes() {
        let mut root = sample_root();
        root.rewrite(&mut |e| match e {
            Expr::ConstPlaceholder(p) => Some(Expr::Const(Constant::from_i32(p.index as i32))),
            _ => None,
        });
        let mut placeholders = 0;
        root.visit_placeholders(&mut |_| placeholders += 1);
        assert_eq!(placeholders, 0);
        assert_eq!(root.depth(), 7);
    }

    #[test]
    fn resolve_checks_bounds() {
        let constants = [Constant::from_i32(720)];
        assert_eq!(
            ConstantPlaceholder::new(0).resolve(&constants),
            Some(&Constant::from_i32(720))
        );
        assert_eq!(ConstantPlaceholder::new(1).resolve(&constants), None);
    }

    #[test]
    fn oversized_nodes_are_reported() {
        assert_eq!(sample_root().check_encodable(), Ok(()));

        let tuple = Expr::Tuple(vec![NullaryOp::Height.into(); 256]);
        assert_eq!(
            tuple.check_encodable(),
            Err(Error::ValueOutOfRange {
                value: 256,
                max: 255
            })
        );

        let buried = Expr::unary(
            UnaryOp::BoolToSigmaProp,
            Expr::GetVar {
                id: 1,
                tpe: SType::STypeVar("x".repeat(300)),
            },
        );
        assert_eq!(
            buried.check_encodable(),
            Err(Error::ValueOutOfRange {
                value: 300,
                max: 255
            })
        );

        let coll = Expr::ConcreteCollection {
            elem_tpe: SType::SInt,
            items: vec![Constant::from_i32(0).into(); 65_536],
        };
        assert!(coll.check_encodable().unwrap_err().is_value_out_of_range());
    }

    #[test]
    fn op_codes() {
        assert_eq!(sample_root().op_code(), Some(0xea));
        assert_eq!(Expr::Const(Constant::from(true)).op_code(), None);
        let bools = Expr::ConcreteCollection {
            elem_tpe: SType::SBoolean,
            items: vec![Constant::from(true).into()],
        };
        assert_eq!(bools.op_code(), Some(opcode::BOOL_COLLECTION));
    }
}
