use ergotree::{
    Constant, DecodeError, ErgoTree, Error, Expr, Literal, PrettyExpr, SType, SigmaBoolean,
    expr::{BinaryOp, SigmaConnective, UnaryOp},
};

const SAMPLE: &str = "100204a00b08cd021dde34603426402615658f1d970cfa7c7bd92ac81a8b16eeebff264d59ce4604ea02d192a39a8cc7a70173007301";

fn sample() -> ErgoTree {
    ErgoTree::from_base16_bytes(SAMPLE).expect("sample tree decodes")
}

#[test]
fn constants_len() {
    let tree = sample();
    assert_eq!(tree.constants_len(), 2);
    assert!(tree.header().is_constant_segregation());
    assert!(!tree.header().has_size());
    assert_eq!(tree.header().version(), 0);
}

#[test]
fn get_constant() {
    let tree = sample();
    let first = tree.get_constant(0).unwrap();
    assert_eq!(first.tpe(), &SType::SInt);
    assert_eq!(first.to_i32(), Ok(720));

    let second = tree.get_constant(1).unwrap();
    assert_eq!(second.tpe(), &SType::SSigmaProp);
    assert!(matches!(
        second.value(),
        Literal::SigmaProp(SigmaBoolean::ProveDlog(_))
    ));
    assert!(second.to_i32().unwrap_err().is_type_mismatch());
}

#[test]
fn get_constant_out_of_bounds() {
    let tree = sample();
    assert!(tree.get_constant(2).is_none());
    assert!(tree.get_constant(3).is_none());
    assert!(tree.get_constant(usize::MAX).is_none());
}

#[test]
fn set_constant() {
    let tree = sample();
    let updated = tree.set_constant(0, Constant::from_i32(99)).unwrap();
    assert_eq!(updated.get_constant(0).unwrap().to_i32(), Ok(99));
    assert_eq!(updated.get_constant(1), tree.get_constant(1));
    assert_eq!(updated.constants_len(), 2);

    // The receiver is untouched.
    assert_eq!(tree.get_constant(0).unwrap().to_i32(), Ok(720));
    assert_eq!(tree.to_base16(), SAMPLE);

    // The new value survives a trip through bytes.
    let reparsed = ErgoTree::from_bytes(&updated.to_bytes()).unwrap();
    assert_eq!(reparsed, updated);
    assert_eq!(reparsed.get_constant(0).unwrap().to_i32(), Ok(99));
}

#[test]
fn set_constant_out_of_bounds() {
    let tree = sample();
    assert!(tree.set_constant(3, Constant::from_i32(99)).is_none());
    assert!(tree.set_constant(2, Constant::from_i32(99)).is_none());
    assert_eq!(tree.get_constant(0).unwrap().to_i32(), Ok(720));
}

#[test]
fn set_constant_is_idempotent() {
    let tree = sample();
    let once = tree.set_constant(0, Constant::from_i32(99)).unwrap();
    let twice = once.set_constant(0, Constant::from_i32(99)).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn set_constant_does_not_check_types() {
    let tree = sample();
    let updated = tree.set_constant(0, Constant::from(true)).unwrap();
    assert_eq!(updated.get_constant(0).unwrap().tpe(), &SType::SBoolean);
}

#[test]
fn set_constant_with_largest_byte_array() {
    let tree = sample();
    let bytes = Constant::try_from(vec![0u8; 65_535]).unwrap();
    let updated = tree.set_constant(1, bytes.clone()).unwrap();
    let reparsed = ErgoTree::from_bytes(&updated.to_bytes()).unwrap();
    assert_eq!(reparsed.get_constant(1), Some(&bytes));

    let err = Constant::try_from(vec![0u8; 65_536]).unwrap_err();
    assert!(err.is_value_out_of_range());
}

#[test]
fn encoding_is_byte_identical() {
    let bytes = hex::decode(SAMPLE).unwrap();
    let tree = ErgoTree::from_bytes(&bytes).unwrap();
    assert_eq!(tree.to_bytes(), bytes);
}

#[test]
fn root_structure() {
    let tree = sample();
    let Expr::SigmaConj {
        op: SigmaConnective::SigmaAnd,
        items,
    } = tree.root()
    else {
        panic!("unexpected root {:?}", tree.root());
    };
    let Expr::ConstPlaceholder(p) = &items[1] else {
        panic!("expected a placeholder, got {:?}", items[1]);
    };
    assert_eq!(tree.resolve(p), tree.get_constant(1));

    let Expr::Unary {
        op: UnaryOp::BoolToSigmaProp,
        input,
    } = &items[0]
    else {
        panic!("expected sigmaProp(..), got {:?}", items[0]);
    };
    assert!(matches!(
        input.as_ref(),
        Expr::Binary {
            op: BinaryOp::Ge,
            ..
        }
    ));

    assert_eq!(
        tree.root().pretty_string(80),
        "sigmaAnd(sigmaProp(HEIGHT >= SELF.creationInfo._1 + $0), $1)"
    );
    let inlined = tree.inline_constants().pretty_string(200);
    assert!(inlined.contains("SELF.creationInfo._1 + 720"), "{inlined}");
    assert!(inlined.contains("proveDlog(021dde34"), "{inlined}");
}

#[test]
fn truncated_input_reports_offset() {
    let bytes = hex::decode(SAMPLE).unwrap();
    let err = ErgoTree::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
    assert_eq!(err.position, bytes.len() - 1);
    assert_eq!(err.source, Error::UnexpectedEndOfInput { needed: 1 });
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = hex::decode(SAMPLE).unwrap();
    bytes.push(0x00);
    assert_eq!(
        ErgoTree::from_bytes(&bytes),
        Err(DecodeError::new(
            bytes.len() - 1,
            Error::TrailingBytes { count: 1 }
        ))
    );
}

#[test]
fn bad_base16_is_rejected() {
    let err = ErgoTree::from_base16_bytes("10zz").unwrap_err();
    assert_eq!(err.position, 2);
    assert!(err.source.is_invalid_hex());
    assert!(
        ErgoTree::from_base16_bytes("100")
            .unwrap_err()
            .source
            .is_invalid_hex()
    );
}

#[test]
fn placeholder_without_segment_is_rejected() {
    // Same root, no segregation flag and no constants.
    let err = ErgoTree::from_base16_bytes("00ea02d192a39a8cc7a70173007301").unwrap_err();
    assert_eq!(err.source, Error::InvalidPlaceholder { index: 0, len: 0 });
}

#[test]
fn reserved_header_bits_are_rejected() {
    let err = ErgoTree::from_base16_bytes("307f").unwrap_err();
    assert_eq!(err.position, 1);
    assert!(err.source.is_invalid_header());
}
