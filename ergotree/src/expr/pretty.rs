//! RcDoc-based pretty-printer with termcolor annotations for [`Expr`].
//!
//! Role
//! - Convert an `Expr` into an annotated document suitable for width-aware rendering.
//! - Provide colored output for terminals (TTY-aware) and plain strings for logs/tests.
//!
//! Rendering follows script syntax where one exists (`HEIGHT >= x + 1`,
//! `SELF.creationInfo._1`); nodes without surface syntax print as calls. Constant
//! placeholders print as `$i`.
use std::io::{self, Write};

use pretty::{FmtWrite, RcDoc, RenderAnnotated};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::expr::{BinaryOp, CastOp, Expr, NullaryOp, SigmaConnective, TernaryOp, UnaryOp};

/// Styles used to annotate parts of the pretty-printed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Punct, // commas, arrows, dots
    /// Parentheses are colored by nesting depth so matching pairs share a color.
    Paren(u8),
    Keyword,  // if, else, val, HEIGHT, SELF
    Operator, // +, &&, >=, ++
    Ident,    // value ids and placeholders
    Type,     // Int, Coll[Byte]
    Literal,  // inline constants
}

impl Style {
    fn to_color_spec(self) -> ColorSpec {
        let mut s = ColorSpec::new();
        match self {
            Style::Punct => {
                s.set_dimmed(true);
            }
            Style::Paren(depth) => {
                let fg = match depth % 6 {
                    0 => Color::Blue,
                    1 => Color::Green,
                    2 => Color::White,
                    3 => Color::Yellow,
                    4 => Color::Red,
                    _ => Color::Magenta,
                };
                s.set_fg(Some(fg)).set_dimmed(true);
            }
            Style::Keyword => {
                s.set_fg(Some(Color::Cyan)).set_bold(true);
            }
            Style::Operator => {
                s.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Style::Ident => {
                s.set_fg(Some(Color::Green)).set_bold(true);
            }
            Style::Type => {
                s.set_fg(Some(Color::Magenta));
            }
            Style::Literal => {
                s.set_fg(Some(Color::Red));
            }
        }
        s
    }
}

type Doc = RcDoc<'static, Style>;

fn styled(style: Style, s: impl Into<String>) -> Doc {
    RcDoc::as_string(s.into()).annotate(style)
}

fn punct(s: &'static str) -> Doc {
    styled(Style::Punct, s)
}

#[inline]
fn lparen(depth: u8) -> Doc {
    RcDoc::as_string("(").annotate(Style::Paren(depth))
}

#[inline]
fn rparen(depth: u8) -> Doc {
    RcDoc::as_string(")").annotate(Style::Paren(depth))
}

fn kw(s: &'static str) -> Doc {
    styled(Style::Keyword, s)
}

fn op(s: &'static str) -> Doc {
    styled(Style::Operator, s)
}

fn ident(s: String) -> Doc {
    styled(Style::Ident, s)
}

fn ty(t: &crate::types::SType) -> Doc {
    styled(Style::Type, t.to_string())
}

/// Infix spelling and precedence of binary operators with surface syntax.
fn infix(binop: BinaryOp) -> Option<(&'static str, u8)> {
    use BinaryOp::*;

    let entry = match binop {
        BinOr => ("||", 1),
        BinXor => ("^", 2),
        BinAnd => ("&&", 3),
        Eq => ("==", 4),
        Neq => ("!=", 4),
        Lt => ("<", 5),
        Le => ("<=", 5),
        Gt => (">", 5),
        Ge => (">=", 5),
        BitOr => ("|", 6),
        BitXor => ("^", 7),
        BitAnd => ("&", 8),
        Append => ("++", 9),
        Plus => ("+", 10),
        Minus => ("-", 10),
        Multiply => ("*", 11),
        Division => ("/", 11),
        Modulo => ("%", 11),
        _ => return None,
    };
    Some(entry)
}

const PREFIX_PRECEDENCE: u8 = 12;
const ATOM_PRECEDENCE: u8 = 255;

fn calculate_precedence(e: &Expr) -> u8 {
    match e {
        Expr::Binary { op, .. } => infix(*op).map_or(ATOM_PRECEDENCE, |(_, p)| p),
        Expr::Unary {
            op: UnaryOp::LogicalNot | UnaryOp::Negation | UnaryOp::BitInversion,
            ..
        } => PREFIX_PRECEDENCE,
        Expr::Ternary {
            op: TernaryOp::If, ..
        }
        | Expr::FuncValue { .. }
        | Expr::ValDef { .. } => 0,
        _ => ATOM_PRECEDENCE,
    }
}

/// Renders `e` as an operand of a node with precedence `parent`. Operators are left
/// associative, so a right operand of equal precedence is parenthesized.
fn operand(e: &Expr, parent: u8, is_right: bool, depth: u8) -> Doc {
    let current = calculate_precedence(e);
    let need = current < parent || (current == parent && is_right && current != ATOM_PRECEDENCE);
    if need {
        lparen(depth)
            .append(to_doc_with_depth(e, depth.wrapping_add(1)))
            .append(rparen(depth))
            .group()
    } else {
        to_doc_with_depth(e, depth)
    }
}

/// Operand of a postfix access such as `.creationInfo` or `._1`.
fn receiver(e: &Expr, depth: u8) -> Doc {
    operand(e, ATOM_PRECEDENCE, false, depth)
}

/// `name(a, b, c)` with the arguments wrapped when they do not fit.
fn call<'e>(name: Doc, args: impl IntoIterator<Item = &'e Expr>, depth: u8) -> Doc {
    let args = args.into_iter().map(|a| to_doc_with_depth(a, depth.wrapping_add(1)));
    name.append(args_doc(args, depth))
}

fn args_doc(args: impl Iterator<Item = Doc>, depth: u8) -> Doc {
    lparen(depth)
        .append(
            RcDoc::line_()
                .append(RcDoc::intersperse(args, punct(",").append(RcDoc::line())))
                .nest(2),
        )
        .append(RcDoc::line_())
        .append(rparen(depth))
        .group()
}

fn nullary(n: NullaryOp) -> Doc {
    match n {
        NullaryOp::True => styled(Style::Literal, "true"),
        NullaryOp::False => styled(Style::Literal, "false"),
        NullaryOp::UnitConstant => styled(Style::Literal, "()"),
        NullaryOp::GroupGenerator => kw("groupGenerator"),
        NullaryOp::Height => kw("HEIGHT"),
        NullaryOp::Inputs => kw("INPUTS"),
        NullaryOp::Outputs => kw("OUTPUTS"),
        NullaryOp::LastBlockUtxoRootHash => kw("LastBlockUtxoRootHash"),
        NullaryOp::SelfBox => kw("SELF"),
        NullaryOp::MinerPubkey => kw("minerPubKey"),
        NullaryOp::Global => kw("Global"),
        NullaryOp::Context => kw("CONTEXT"),
    }
}

/// Unary operators rendered as a property of their operand.
fn unary_property(u: UnaryOp) -> Option<&'static str> {
    use UnaryOp::*;

    let name = match u {
        Select1 => "_1",
        Select2 => "_2",
        Select3 => "_3",
        Select4 => "_4",
        Select5 => "_5",
        SizeOf => "size",
        ExtractAmount => "value",
        ExtractScriptBytes => "propositionBytes",
        ExtractBytes => "bytes",
        ExtractBytesWithNoRef => "bytesWithoutRef",
        ExtractId => "id",
        ExtractCreationInfo => "creationInfo",
        SigmaPropBytes => "propBytes",
        OptionGet => "get",
        OptionIsDefined => "isDefined",
        _ => return None,
    };
    Some(name)
}

fn unary_function(u: UnaryOp) -> &'static str {
    use UnaryOp::*;

    match u {
        LongToByteArray => "longToByteArray",
        ByteArrayToBigInt => "byteArrayToBigInt",
        ByteArrayToLong => "byteArrayToLong",
        And => "allOf",
        Or => "anyOf",
        XorOf => "xorOf",
        CalcBlake2b256 => "blake2b256",
        CalcSha256 => "sha256",
        CreateProveDlog => "proveDlog",
        BoolToSigmaProp => "sigmaProp",
        DecodePoint => "decodePoint",
        _ => "unary",
    }
}

fn binary_function(b: BinaryOp) -> &'static str {
    use BinaryOp::*;

    match b {
        AtLeast => "atLeast",
        Xor => "xor",
        Exponentiate => "exp",
        MultiplyGroup => "multiply",
        Min => "min",
        Max => "max",
        Map => "map",
        Exists => "exists",
        ForAll => "forall",
        Filter => "filter",
        OptionGetOrElse => "getOrElse",
        _ => "binary",
    }
}

/// Depth-aware variant that colors parentheses by nesting level.
fn to_doc_with_depth(e: &Expr, depth: u8) -> Doc {
    match e {
        Expr::Const(c) => styled(Style::Literal, c.to_string()),
        Expr::ConstPlaceholder(p) => ident(format!("${}", p.index)),
        Expr::Nullary(n) => nullary(*n),

        Expr::Unary { op: u, input } => match u {
            UnaryOp::LogicalNot => op("!").append(operand(input, PREFIX_PRECEDENCE, false, depth)),
            UnaryOp::Negation => op("-").append(operand(input, PREFIX_PRECEDENCE, false, depth)),
            UnaryOp::BitInversion => {
                op("~").append(operand(input, PREFIX_PRECEDENCE, false, depth))
            }
            u => match unary_property(*u) {
                Some(name) => receiver(input, depth)
                    .append(punct("."))
                    .append(RcDoc::as_string(name)),
                None => call(RcDoc::as_string(unary_function(*u)), [input.as_ref()], depth),
            },
        },

        Expr::Binary { op: b, left, right } => match infix(*b) {
            Some((symbol, prec)) => operand(left, prec, false, depth)
                .append(RcDoc::space())
                .append(op(symbol))
                .append(RcDoc::line())
                .append(operand(right, prec, true, depth))
                .group(),
            None => call(
                RcDoc::as_string(binary_function(*b)),
                [left.as_ref(), right.as_ref()],
                depth,
            ),
        },

        Expr::Ternary {
            op: TernaryOp::If,
            first,
            second,
            third,
        } => kw("if")
            .append(RcDoc::space())
            .append(lparen(depth))
            .append(to_doc_with_depth(first, depth.wrapping_add(1)))
            .append(rparen(depth))
            .append(RcDoc::line().append(to_doc_with_depth(second, depth)).nest(2))
            .append(RcDoc::line())
            .append(kw("else"))
            .append(RcDoc::line().append(to_doc_with_depth(third, depth)).nest(2))
            .group(),
        Expr::Ternary {
            op: t,
            first,
            second,
            third,
        } => {
            let name = match t {
                TernaryOp::SubstConstants => "substConstants",
                TernaryOp::Fold => "fold",
                TernaryOp::Slice => "slice",
                TernaryOp::If => "if",
            };
            call(
                RcDoc::as_string(name),
                [first.as_ref(), second.as_ref(), third.as_ref()],
                depth,
            )
        }

        Expr::TaggedVariable { id, tpe } => RcDoc::as_string("taggedVariable")
            .append(punct("["))
            .append(ty(tpe))
            .append(punct("]"))
            .append(lparen(depth))
            .append(RcDoc::as_string(id.to_string()))
            .append(rparen(depth)),
        Expr::ValUse { id } => ident(format!("v{}", id)),
        Expr::Cast { op: c, input, tpe } => {
            let name = match c {
                CastOp::Upcast => "upcast",
                CastOp::Downcast => "downcast",
            };
            RcDoc::as_string(name)
                .append(punct("["))
                .append(ty(tpe))
                .append(punct("]"))
                .append(args_doc(
                    std::iter::once(to_doc_with_depth(input, depth.wrapping_add(1))),
                    depth,
                ))
        }
        Expr::ConcreteCollection { elem_tpe, items } => call(
            styled(Style::Type, format!("Coll[{}]", elem_tpe)),
            items,
            depth,
        ),
        Expr::Tuple(items) => call(RcDoc::nil(), items, depth),
        Expr::SelectField { input, field } => receiver(input, depth)
            .append(punct("."))
            .append(RcDoc::as_string(format!("_{}", field))),
        Expr::ByIndex {
            input,
            index,
            default: None,
        } => receiver(input, depth).append(args_doc(
            std::iter::once(to_doc_with_depth(index, depth.wrapping_add(1))),
            depth,
        )),
        Expr::ByIndex {
            input,
            index,
            default: Some(default),
        } => receiver(input, depth)
            .append(punct("."))
            .append(call(
                RcDoc::as_string("getOrElse"),
                [index.as_ref(), default.as_ref()],
                depth,
            )),
        Expr::ExtractRegisterAs {
            input,
            register,
            tpe,
        } => receiver(input, depth)
            .append(punct("."))
            .append(RcDoc::as_string(format!("R{}", register)))
            .append(punct("["))
            .append(ty(tpe))
            .append(punct("]")),
        Expr::CreateProveDhTuple { g, h, u, v } => call(
            RcDoc::as_string("proveDHTuple"),
            [g.as_ref(), h.as_ref(), u.as_ref(), v.as_ref()],
            depth,
        ),
        Expr::DeserializeContext { tpe, id } => RcDoc::as_string("deserializeContext")
            .append(punct("["))
            .append(ty(tpe))
            .append(punct("]"))
            .append(lparen(depth))
            .append(RcDoc::as_string(id.to_string()))
            .append(rparen(depth)),
        Expr::DeserializeRegister {
            register,
            tpe,
            default,
        } => {
            let mut args = vec![RcDoc::as_string(format!("R{}", register))];
            if let Some(d) = default {
                args.push(to_doc_with_depth(d, depth.wrapping_add(1)));
            }
            RcDoc::as_string("deserializeRegister")
                .append(punct("["))
                .append(ty(tpe))
                .append(punct("]"))
                .append(args_doc(args.into_iter(), depth))
        }
        Expr::ValDef { id, rhs } => kw("val")
            .append(RcDoc::space())
            .append(ident(format!("v{}", id)))
            .append(RcDoc::space())
            .append(op("="))
            .append(RcDoc::line().append(to_doc_with_depth(rhs, depth)).nest(2))
            .group(),
        Expr::BlockValue { items, result } => {
            let body = items
                .iter()
                .map(|item| to_doc_with_depth(item, depth))
                .chain(std::iter::once(to_doc_with_depth(result, depth)));
            punct("{")
                .append(
                    RcDoc::line()
                        .append(RcDoc::intersperse(body, punct(";").append(RcDoc::line())))
                        .nest(2),
                )
                .append(RcDoc::line())
                .append(punct("}"))
                .group()
        }
        Expr::FuncValue { args, body } => {
            let params = args.iter().map(|a| {
                ident(format!("v{}", a.id))
                    .append(punct(":"))
                    .append(RcDoc::space())
                    .append(ty(&a.tpe))
            });
            punct("{")
                .append(args_doc(params, depth))
                .append(RcDoc::space())
                .append(punct("=>"))
                .append(RcDoc::line().append(to_doc_with_depth(body, depth)).nest(2))
                .append(RcDoc::line())
                .append(punct("}"))
                .group()
        }
        Expr::Apply { func, args } => call(receiver(func, depth), args, depth),
        Expr::PropertyCall {
            type_id,
            method_id,
            obj,
        } => receiver(obj, depth)
            .append(punct("."))
            .append(RcDoc::as_string(format!("<{}:{}>", type_id, method_id))),
        Expr::MethodCall {
            type_id,
            method_id,
            obj,
            args,
        } => receiver(obj, depth)
            .append(punct("."))
            .append(call(
                RcDoc::as_string(format!("<{}:{}>", type_id, method_id)),
                args,
                depth,
            )),
        Expr::GetVar { id, tpe } => RcDoc::as_string("getVar")
            .append(punct("["))
            .append(ty(tpe))
            .append(punct("]"))
            .append(lparen(depth))
            .append(RcDoc::as_string(id.to_string()))
            .append(rparen(depth)),
        Expr::SigmaConj { op: s, items } => {
            let name = match s {
                SigmaConnective::SigmaAnd => "sigmaAnd",
                SigmaConnective::SigmaOr => "sigmaOr",
            };
            call(RcDoc::as_string(name), items, depth)
        }
    }
}

// A writer that maps Style annotations to termcolor ColorSpec on a WriteColor sink.
struct ColorWriter<'w, W: WriteColor + Write> {
    out: &'w mut W,
}

impl<'a, 'w, W: WriteColor + Write> RenderAnnotated<'a, Style> for ColorWriter<'w, W> {
    fn push_annotation(&mut self, ann: &'a Style) -> io::Result<()> {
        self.out.set_color(&ann.to_color_spec())
    }
    fn pop_annotation(&mut self) -> io::Result<()> {
        self.out.reset()
    }
}

impl<'w, W: WriteColor + Write> pretty::Render for ColorWriter<'w, W> {
    type Error = io::Error;
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.out.write_all(s.as_bytes())?;
        Ok(s.len())
    }
    fn write_str_all(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }
    fn fail_doc(&self) -> Self::Error {
        io::Error::other("render failed")
    }
}

/// Retrieve the width of the terminal, or 80 if it cannot be determined.
pub fn terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Pretty-printing conveniences for [`Expr`].
pub trait PrettyExpr {
    /// Build an RcDoc representation of this expression with style annotations.
    fn pretty_doc(&self) -> RcDoc<'static, Style>;

    /// Render this expression with colors to any termcolor writer at the given width.
    fn pretty_render_to<W: WriteColor + Write>(&self, width: usize, out: &mut W) -> io::Result<()> {
        let doc = self.pretty_doc();
        let mut cw = ColorWriter { out };
        doc.render_raw(width, &mut cw)
    }

    /// Print this expression to stdout with colors (TTY-aware), at auto-detected width.
    fn pretty_print(&self) -> io::Result<()> {
        let stdout = StandardStream::stdout(ColorChoice::Auto);
        let mut stdout = stdout.lock();
        self.pretty_render_to(terminal_width(), &mut stdout)?;
        writeln!(stdout)
    }

    /// Format this expression into a plain string at the given width.
    fn pretty_string(&self, width: usize) -> String {
        let mut buf = String::new();
        let _ = self.pretty_doc().render_fmt(width, &mut buf);
        buf
    }
}

impl PrettyExpr for Expr {
    #[inline]
    fn pretty_doc(&self) -> RcDoc<'static, Style> {
        to_doc_with_depth(self, 0)
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut w = FmtWrite::new(f);
        self.pretty_doc().render_raw(80, &mut w)
    }
}
