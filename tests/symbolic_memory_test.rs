use z3::ast::Int;
use z3::{Config, Context};

use pathsynth::executor::error::SymbolicError;
use pathsynth::executor::feasibility::{Feasibility, FeasibilityOracle};
use pathsynth::executor::symbolic_memory::{Address, Pointer, SymbolicMemory};
use pathsynth::executor::symbolic_value::SymbolicValue;
use pathsynth::program::Type;

fn provably_equal<'ctx>(ctx: &'ctx Context, a: &SymbolicValue<'ctx>, b: &SymbolicValue<'ctx>) -> bool {
    let differs = a.not_eq(ctx, b).unwrap();
    match differs.as_concrete_bool() {
        Some(d) => !d,
        None => {
            let mut oracle = FeasibilityOracle::new(ctx, None);
            oracle.check(&[differs.to_bool(ctx).unwrap()]) == Feasibility::Infeasible
        }
    }
}

fn pair_memory(ctx: &Context) -> SymbolicMemory {
    let mut memory = SymbolicMemory::new(ctx);
    memory.declare_struct("Pair", vec![Type::int(64), Type::float(64)]);
    memory
}

#[test]
fn test_store_then_load_round_trip() {
    let ctx = Context::new(&Config::new());
    let mut memory = SymbolicMemory::new(&ctx);

    let p = memory.new_pointer(&Type::int(64)).unwrap();
    let v = SymbolicValue::fresh(&ctx, "v", &Type::int(64)).unwrap();
    memory.store(&p, &v).unwrap();
    let loaded = memory.load(&p).unwrap();
    assert!(provably_equal(&ctx, &loaded, &v));

    let q = memory.new_pointer(&Type::Bool).unwrap();
    memory.store(&q, &SymbolicValue::ConstantBool(true)).unwrap();
    assert_eq!(memory.load(&q).unwrap().as_concrete_bool(), Some(true));
}

#[test]
fn test_round_trip_through_symbolic_address() {
    let ctx = Context::new(&Config::new());
    let mut memory = SymbolicMemory::new(&ctx);

    let p = Pointer::new(Address::Symbolic(Int::new_const(&ctx, "p")), Type::float(64));
    let v = SymbolicValue::fresh(&ctx, "v", &Type::float(64)).unwrap();
    memory.store(&p, &v).unwrap();
    let loaded = memory.load(&p).unwrap();
    assert!(provably_equal(&ctx, &loaded, &v));
}

#[test]
fn test_distinct_allocations_do_not_alias() {
    let ctx = Context::new(&Config::new());
    let mut memory = SymbolicMemory::new(&ctx);

    let p = memory.new_pointer(&Type::int(64)).unwrap();
    let q = memory.new_pointer(&Type::int(64)).unwrap();
    assert_ne!(p.address.as_concrete(), q.address.as_concrete());

    memory.store(&p, &SymbolicValue::int(1, 64)).unwrap();
    memory.store(&q, &SymbolicValue::int(2, 64)).unwrap();
    assert_eq!(memory.load(&p).unwrap().as_concrete_int(), Some(1));
    assert_eq!(memory.load(&q).unwrap().as_concrete_int(), Some(2));
}

#[test]
fn test_struct_field_isolation() {
    let ctx = Context::new(&Config::new());
    let mut memory = pair_memory(&ctx);

    let p1 = memory.new_pointer(&Type::structure("Pair")).unwrap();
    let p2 = memory.new_pointer(&Type::structure("Pair")).unwrap();

    let p2_field0_before = memory.load_field(&p2, 0).unwrap();
    let p1_field1_before = memory.load_field(&p1, 1).unwrap();

    let v = SymbolicValue::fresh(&ctx, "v", &Type::int(64)).unwrap();
    memory.store_field(&p1, 0, &v).unwrap();

    assert!(provably_equal(&ctx, &memory.load_field(&p1, 0).unwrap(), &v));
    assert!(provably_equal(
        &ctx,
        &memory.load_field(&p2, 0).unwrap(),
        &p2_field0_before
    ));
    assert!(provably_equal(
        &ctx,
        &memory.load_field(&p1, 1).unwrap(),
        &p1_field1_before
    ));
}

#[test]
fn test_storing_a_struct_copies_its_fields() {
    let ctx = Context::new(&Config::new());
    let mut memory = pair_memory(&ctx);

    let source = memory.new_pointer(&Type::structure("Pair")).unwrap();
    let target = memory.new_pointer(&Type::structure("Pair")).unwrap();
    memory.store_field(&source, 0, &SymbolicValue::int(7, 64)).unwrap();
    memory.store_field(&source, 1, &SymbolicValue::float(1.5, 64)).unwrap();

    memory
        .store(&target, &SymbolicValue::Pointer(source.clone()))
        .unwrap();
    assert_eq!(memory.load_field(&target, 0).unwrap().as_concrete_int(), Some(7));
    assert_eq!(memory.load_field(&target, 1).unwrap().as_concrete_float(), Some(1.5));

    // later writes to the source are not visible through the copy
    memory.store_field(&source, 0, &SymbolicValue::int(8, 64)).unwrap();
    assert_eq!(memory.load_field(&target, 0).unwrap().as_concrete_int(), Some(7));
}

#[test]
fn test_unknown_structure_and_field() {
    let ctx = Context::new(&Config::new());
    let mut memory = pair_memory(&ctx);

    let err = memory.new_pointer(&Type::structure("Missing")).unwrap_err();
    assert_eq!(err, SymbolicError::UnknownStructure("Missing".to_string()));
    assert!(!err.is_fatal());

    let p = memory.new_pointer(&Type::structure("Pair")).unwrap();
    let err = memory.load_field(&p, 5).unwrap_err();
    assert_eq!(
        err,
        SymbolicError::UnknownField {
            structure: "Pair".to_string(),
            index: 5
        }
    );
}

#[test]
fn test_array_elements_and_length() {
    let ctx = Context::new(&Config::new());
    let mut memory = SymbolicMemory::new(&ctx);

    let array = memory
        .new_array(&Type::int(64), &SymbolicValue::int(3, 64), 4)
        .unwrap();
    assert_eq!(memory.length(&array).unwrap().as_concrete_int(), Some(3));

    let e0 = memory
        .element_pointer(&array, &SymbolicValue::int(0, 64))
        .unwrap();
    let e1 = memory
        .element_pointer(&array, &SymbolicValue::int(1, 64))
        .unwrap();
    assert!(e0.address.as_concrete().is_some());
    assert_ne!(e0.address.as_concrete(), e1.address.as_concrete());

    memory.store(&e1, &SymbolicValue::int(42, 64)).unwrap();
    let again = memory
        .element_pointer(&array, &SymbolicValue::int(1, 64))
        .unwrap();
    assert_eq!(memory.load(&again).unwrap().as_concrete_int(), Some(42));
}

#[test]
fn test_input_objects() {
    let ctx = Context::new(&Config::new());
    let mut memory = pair_memory(&ctx);

    let (scalar, assumptions) = memory.new_input("a", &Type::int(32), 4).unwrap();
    assert!(matches!(scalar, SymbolicValue::SymbolicInt(_, 32)));
    assert!(assumptions.is_empty());

    let (object, _) = memory
        .new_input("p", &Type::structure("Pair"), 4)
        .unwrap();
    let object = object.as_pointer().unwrap().clone();
    assert!(!object.address.is_nil());

    let (array, assumptions) = memory
        .new_input("xs", &Type::array(Type::int(64)), 4)
        .unwrap();
    assert_eq!(assumptions.len(), 2);

    // the symbolic length is bounded by the assumptions
    let length = memory.length(array.as_pointer().unwrap()).unwrap();
    let too_long = length
        .gt(&ctx, &SymbolicValue::int(4, 64))
        .unwrap()
        .to_bool(&ctx)
        .unwrap();
    let mut constraints = assumptions.clone();
    constraints.push(too_long);
    let mut oracle = FeasibilityOracle::new(&ctx, None);
    assert_eq!(oracle.check(&constraints), Feasibility::Infeasible);
}

fn nested_memory(ctx: &Context) -> SymbolicMemory {
    let mut memory = SymbolicMemory::new(ctx);
    memory.declare_struct("In", vec![Type::int(64)]);
    memory.declare_struct(
        "Out",
        vec![Type::structure("In"), Type::array(Type::int(64))],
    );
    memory
}

#[test]
fn test_nested_struct_fields_are_isolated() {
    let ctx = Context::new(&Config::new());
    let mut memory = nested_memory(&ctx);

    let i = memory.new_pointer(&Type::structure("In")).unwrap();
    let o = memory.new_pointer(&Type::structure("Out")).unwrap();
    memory.store_field(&i, 0, &SymbolicValue::int(1, 64)).unwrap();

    let inner = memory.field_pointer(&o, 0).unwrap();
    let a = SymbolicValue::fresh(&ctx, "a", &Type::int(64)).unwrap();
    memory.store_field(&inner, 0, &a).unwrap();

    let x = memory.load_field(&i, 0).unwrap();
    assert!(provably_equal(&ctx, &x, &SymbolicValue::int(1, 64)));
    let y = memory.load_field(&inner, 0).unwrap();
    assert!(provably_equal(&ctx, &y, &a));

    // the nested objects have concrete addresses of their own
    let nested = memory.load(&inner).unwrap();
    let nested = nested.as_pointer().unwrap();
    assert!(nested.address.as_concrete().is_some());
    assert_ne!(nested.address.as_concrete(), i.address.as_concrete());

    let xs = memory.load_field(&o, 1).unwrap();
    let length = memory.length(xs.as_pointer().unwrap()).unwrap();
    assert_eq!(length.as_concrete_int(), Some(0));
}

#[test]
fn test_copying_an_outer_struct_copies_the_inner_one() {
    let ctx = Context::new(&Config::new());
    let mut memory = nested_memory(&ctx);

    let source = memory.new_pointer(&Type::structure("Out")).unwrap();
    let target = memory.new_pointer(&Type::structure("Out")).unwrap();
    let source_inner = memory.field_pointer(&source, 0).unwrap();
    memory.store_field(&source_inner, 0, &SymbolicValue::int(5, 64)).unwrap();

    memory
        .store(&target, &SymbolicValue::Pointer(source.clone()))
        .unwrap();
    let target_inner = memory.field_pointer(&target, 0).unwrap();
    assert_eq!(memory.load_field(&target_inner, 0).unwrap().as_concrete_int(), Some(5));

    memory.store_field(&source_inner, 0, &SymbolicValue::int(6, 64)).unwrap();
    assert_eq!(memory.load_field(&target_inner, 0).unwrap().as_concrete_int(), Some(5));
}

#[test]
fn test_input_struct_arrays_are_bounded() {
    let ctx = Context::new(&Config::new());
    let mut memory = nested_memory(&ctx);

    let (object, assumptions) = memory
        .new_input("o", &Type::structure("Out"), 2)
        .unwrap();
    assert_eq!(assumptions.len(), 2);

    let xs = memory.load_field(object.as_pointer().unwrap(), 1).unwrap();
    let length = memory.length(xs.as_pointer().unwrap()).unwrap();
    let too_long = length
        .gt(&ctx, &SymbolicValue::int(2, 64))
        .unwrap()
        .to_bool(&ctx)
        .unwrap();
    let mut constraints = assumptions.clone();
    constraints.push(too_long);
    let mut oracle = FeasibilityOracle::new(&ctx, None);
    assert_eq!(oracle.check(&constraints), Feasibility::Infeasible);
}

#[test]
fn test_self_containing_struct_is_rejected() {
    let ctx = Context::new(&Config::new());
    let mut memory = SymbolicMemory::new(&ctx);
    memory.declare_struct("Loop", vec![Type::structure("Loop")]);
    memory.declare_struct("Tree", vec![Type::int(64), Type::array(Type::structure("Tree"))]);

    let err = memory.new_pointer(&Type::structure("Loop")).unwrap_err();
    assert_eq!(err.kind(), "unsupported_construct");

    // recursion through an array is fine
    let (tree, _) = memory.new_input("t", &Type::structure("Tree"), 2).unwrap();
    assert!(!tree.as_pointer().unwrap().address.is_nil());
}
