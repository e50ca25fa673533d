use z3::ast::Bool;
use z3::{Config, Context};

use pathsynth::executor::error::SymbolicError;
use pathsynth::executor::feasibility::{Feasibility, FeasibilityOracle};
use pathsynth::executor::symbolic_memory::{Address, Pointer};
use pathsynth::executor::symbolic_value::{evaluate_binary_op, evaluate_unary_op, SymbolicValue};
use pathsynth::program::{BinaryOp, Type, UnaryOp};

fn int(v: i64) -> SymbolicValue<'static> {
    SymbolicValue::int(v, 64)
}

#[test]
fn test_arithmetic_operations() {
    let ctx = Context::new(&Config::new());

    // Addition
    assert_eq!(
        evaluate_binary_op(&ctx, BinaryOp::Add, &int(5), &int(7))
            .unwrap()
            .as_concrete_int(),
        Some(12)
    );

    // Subtraction
    assert_eq!(
        evaluate_binary_op(&ctx, BinaryOp::Sub, &int(10), &int(7))
            .unwrap()
            .as_concrete_int(),
        Some(3)
    );

    // Multiplication
    assert_eq!(
        evaluate_binary_op(&ctx, BinaryOp::Mul, &int(5), &int(-7))
            .unwrap()
            .as_concrete_int(),
        Some(-35)
    );

    // Division truncates toward zero
    assert_eq!(
        evaluate_binary_op(&ctx, BinaryOp::Div, &int(-7), &int(2))
            .unwrap()
            .as_concrete_int(),
        Some(-3)
    );

    // Remainder follows the dividend
    assert_eq!(
        evaluate_binary_op(&ctx, BinaryOp::Rem, &int(-7), &int(2))
            .unwrap()
            .as_concrete_int(),
        Some(-1)
    );
}

#[test]
fn test_fixed_width_wraparound() {
    let ctx = Context::new(&Config::new());

    let max8 = SymbolicValue::int(127, 8);
    let one8 = SymbolicValue::int(1, 8);
    let sum = evaluate_binary_op(&ctx, BinaryOp::Add, &max8, &one8).unwrap();
    assert_eq!(sum.as_concrete_int(), Some(-128));
    assert_eq!(sum.value_type(), Type::int(8));

    let shifted = evaluate_binary_op(&ctx, BinaryOp::Shl, &SymbolicValue::int(1, 8), &SymbolicValue::int(7, 8))
        .unwrap();
    assert_eq!(shifted.as_concrete_int(), Some(-128));

    let too_far = evaluate_binary_op(&ctx, BinaryOp::Shl, &int(1), &int(64)).unwrap();
    assert_eq!(too_far.as_concrete_int(), Some(0));
}

#[test]
fn test_division_by_zero_matches_solver() {
    let ctx = Context::new(&Config::new());
    let x = SymbolicValue::fresh(&ctx, "x", &Type::int(64)).unwrap();

    for dividend in [5i64, -5, 0] {
        let concrete = evaluate_binary_op(&ctx, BinaryOp::Div, &int(dividend), &int(0)).unwrap();
        let symbolic = evaluate_binary_op(&ctx, BinaryOp::Div, &x, &int(0)).unwrap();

        let mut oracle = FeasibilityOracle::new(&ctx, None);
        let pinned = x.eq(&ctx, &int(dividend)).unwrap().to_bool(&ctx).unwrap();
        let differs = symbolic.not_eq(&ctx, &concrete).unwrap().to_bool(&ctx).unwrap();
        assert_eq!(oracle.check(&[pinned, differs]), Feasibility::Infeasible);
    }
}

#[test]
fn test_comparison_operations() {
    let ctx = Context::new(&Config::new());

    // Less than
    assert_eq!(
        evaluate_binary_op(&ctx, BinaryOp::Lt, &int(5), &int(7))
            .unwrap()
            .as_concrete_bool(),
        Some(true)
    );

    // Greater than or equal
    assert_eq!(
        evaluate_binary_op(&ctx, BinaryOp::Ge, &int(5), &int(7))
            .unwrap()
            .as_concrete_bool(),
        Some(false)
    );

    // Not equal across widths
    assert_eq!(
        evaluate_binary_op(&ctx, BinaryOp::NotEq, &SymbolicValue::int(-1, 8), &int(-1))
            .unwrap()
            .as_concrete_bool(),
        Some(false)
    );

    let x = SymbolicValue::fresh(&ctx, "x", &Type::int(64)).unwrap();
    let cmp = evaluate_binary_op(&ctx, BinaryOp::Gt, &x, &int(0)).unwrap();
    assert!(matches!(cmp, SymbolicValue::SymbolicBool(_)));
}

#[test]
fn test_mixed_int_float_promotion() {
    let ctx = Context::new(&Config::new());

    let sum = evaluate_binary_op(&ctx, BinaryOp::Add, &int(2), &SymbolicValue::float(0.25, 64)).unwrap();
    assert_eq!(sum.as_concrete_float(), Some(2.25));
    assert_eq!(sum.value_type(), Type::float(64));

    let narrow = SymbolicValue::float(0.1, 32);
    assert_eq!(narrow.as_concrete_float(), Some(0.1f32 as f64));

    let y = SymbolicValue::fresh(&ctx, "y", &Type::float(64)).unwrap();
    let product = evaluate_binary_op(&ctx, BinaryOp::Mul, &int(3), &y).unwrap();
    assert!(matches!(product, SymbolicValue::SymbolicFloat(_, 64)));
}

#[test]
fn test_logical_and_unary_operations() {
    let ctx = Context::new(&Config::new());
    let t = SymbolicValue::ConstantBool(true);
    let f = SymbolicValue::ConstantBool(false);

    assert_eq!(t.bool_and(&ctx, &f).unwrap().as_concrete_bool(), Some(false));
    assert_eq!(t.bool_or(&ctx, &f).unwrap().as_concrete_bool(), Some(true));
    assert_eq!(t.bool_xor(&ctx, &t).unwrap().as_concrete_bool(), Some(false));
    assert_eq!(f.not(&ctx).unwrap().as_concrete_bool(), Some(true));

    assert_eq!(
        evaluate_unary_op(&ctx, UnaryOp::Neg, &int(4)).unwrap().as_concrete_int(),
        Some(-4)
    );
    assert_eq!(
        evaluate_unary_op(&ctx, UnaryOp::BitNot, &int(0)).unwrap().as_concrete_int(),
        Some(-1)
    );

    let b = SymbolicValue::SymbolicBool(Bool::new_const(&ctx, "b"));
    let contradiction = b.bool_and(&ctx, &b.not(&ctx).unwrap()).unwrap();
    let mut oracle = FeasibilityOracle::new(&ctx, None);
    assert_eq!(
        oracle.check(&[contradiction.to_bool(&ctx).unwrap()]),
        Feasibility::Infeasible
    );
}

#[test]
fn test_incompatible_kinds_are_type_mismatch() {
    let ctx = Context::new(&Config::new());

    let err = evaluate_binary_op(&ctx, BinaryOp::BoolXor, &int(1), &SymbolicValue::ConstantBool(true))
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, SymbolicError::TypeMismatch { .. }));

    let err = evaluate_binary_op(&ctx, BinaryOp::Gt, &SymbolicValue::ConstantBool(true), &SymbolicValue::ConstantBool(false))
        .unwrap_err();
    assert_eq!(err.kind(), "type_mismatch");
}

#[test]
fn test_conversions() {
    let ctx = Context::new(&Config::new());

    assert_eq!(
        SymbolicValue::float(-2.75, 64)
            .convert(&ctx, &Type::int(64))
            .unwrap()
            .as_concrete_int(),
        Some(-2)
    );
    assert_eq!(
        int(300).convert(&ctx, &Type::int(8)).unwrap().as_concrete_int(),
        Some(44)
    );
    assert_eq!(
        int(3).convert(&ctx, &Type::Bool).unwrap().as_concrete_bool(),
        Some(true)
    );
    assert_eq!(
        SymbolicValue::ConstantBool(true)
            .convert(&ctx, &Type::int(64))
            .unwrap()
            .as_concrete_int(),
        Some(1)
    );
}

#[test]
fn test_pointer_equality() {
    let ctx = Context::new(&Config::new());

    let p = SymbolicValue::Pointer(Pointer::new(Address::Concrete(3), Type::int(64)));
    let q = SymbolicValue::Pointer(Pointer::new(Address::Concrete(3), Type::int(64)));
    let r = SymbolicValue::Pointer(Pointer::new(Address::Concrete(3), Type::Bool));
    let nil = SymbolicValue::Pointer(Pointer::nil(Type::int(64)));

    assert_eq!(p.eq(&ctx, &q).unwrap().as_concrete_bool(), Some(true));
    assert_eq!(p.eq(&ctx, &nil).unwrap().as_concrete_bool(), Some(false));
    // different memory lines never alias
    assert_eq!(p.eq(&ctx, &r).unwrap().as_concrete_bool(), Some(false));
}
