use bumpalo::Bump;
use water_parser::ast::Decl;
use water_parser::Parser;

use super::*;
use crate::context::CompilationContext;
use crate::directory::ClassDirectory;
use crate::options::OptimizationConfig;
use crate::types::OBJECT;

/// Compile the initializer of `var probe = <source>;` in a static method of
/// the container, with `locals` declared first. Returns the type and the
/// instruction listing.
fn compile_with(
    source: &str,
    locals: &[(&str, WaterType)],
    options: OptimizationConfig,
) -> Result<(WaterType, String)> {
    let arena = Bump::new();
    let text = format!("var probe = {};", source);
    let program = Parser::parse(&text, &arena).expect("parse");
    let Decl::Var(var) = &program.decls[0] else { panic!("not a var") };
    let init = var.init.expect("initializer");

    let ctx = CompilationContext::new("main.wtr", "", true, options);
    let dir = ClassDirectory::default();
    let mut frame = Frame::new(ctx.container(), true, WaterType::VOID);
    for (name, ty) in locals {
        frame.locals.declare(name, ty.clone(), false).unwrap();
    }
    let ty = ExprCompiler::new(&ctx, &dir, &mut frame).infer(init)?;
    Ok((ty, format!("{:?}", frame.code)))
}

fn compile(source: &str, locals: &[(&str, WaterType)]) -> Result<(WaterType, String)> {
    compile_with(source, locals, OptimizationConfig::default())
}

fn error(source: &str, locals: &[(&str, WaterType)]) -> String {
    match compile(source, locals) {
        Ok((ty, listing)) => panic!("expected an error, got {ty}: {listing}"),
        Err(err) => err.to_string(),
    }
}

fn nullable_string() -> WaterType {
    WaterType::string().as_nullable()
}

#[test]
fn constants_are_folded() {
    let (ty, listing) = compile("1 + 2 * 3", &[]).unwrap();
    assert_eq!(ty, WaterType::INT);
    assert!(listing.contains("Bipush(7)"), "{listing}");
    assert!(!listing.contains("Iadd"), "{listing}");

    let (ty, listing) = compile("\"a\" + 1 + true", &[]).unwrap();
    assert!(ty.is_string());
    assert!(listing.contains("a1true"), "{listing}");
}

#[test]
fn folding_can_be_disabled() {
    let (ty, listing) = compile_with("1 + 2", &[], OptimizationConfig::empty()).unwrap();
    assert_eq!(ty, WaterType::INT);
    assert!(listing.contains("Iconst1") && listing.contains("Iconst2") && listing.contains("Iadd"), "{listing}");
}

#[test]
fn arithmetic_promotes_operands() {
    let locals = [("i", WaterType::INT), ("d", WaterType::DOUBLE)];
    let (ty, listing) = compile("i + d", &locals).unwrap();
    assert_eq!(ty, WaterType::DOUBLE);
    assert!(listing.contains("I2d") && listing.contains("Dadd"), "{listing}");

    let locals = [("b", WaterType::BYTE), ("s", WaterType::SHORT)];
    let (ty, _) = compile("b * s", &locals).unwrap();
    assert_eq!(ty, WaterType::INT);
}

#[test]
fn shifts_keep_the_left_type() {
    let locals = [("l", WaterType::LONG), ("n", WaterType::LONG)];
    let (ty, listing) = compile("l << n", &locals).unwrap();
    assert_eq!(ty, WaterType::LONG);
    assert!(listing.contains("L2i") && listing.contains("Lshl"), "{listing}");
}

#[test]
fn invalid_operand_types() {
    let locals = [("flag", WaterType::BOOLEAN), ("i", WaterType::INT)];
    assert_eq!(
        error("flag - i", &locals),
        "Unsupported operation of '-' between types 'boolean' and 'int'"
    );
    assert_eq!(
        error("-flag", &locals),
        "Can only perform '-' on numeric values. (boolean is not numeric)"
    );
    assert_eq!(
        error("!i", &locals),
        "Can only perform '!' on boolean values. (int =/= boolean)"
    );
}

#[test]
fn string_concatenation_uses_one_builder() {
    let locals = [("name", WaterType::string()), ("age", WaterType::INT)];
    let (ty, listing) = compile("\"Hi \" + name + \", \" + age", &locals).unwrap();
    assert!(ty.is_string() && !ty.is_nullable());
    assert_eq!(listing.matches("<init>").count(), 1, "{listing}");
    assert_eq!(listing.matches("toString").count(), 1, "{listing}");
    assert!(listing.contains("(I)Ljava/lang/StringBuilder;"), "{listing}");
}

#[test]
fn string_repetition() {
    let locals = [("s", WaterType::string()), ("n", WaterType::INT)];
    let (ty, listing) = compile("s * n", &locals).unwrap();
    assert!(ty.is_string());
    assert!(listing.contains("repeat"), "{listing}");

    let locals = [("s", nullable_string()), ("n", WaterType::INT)];
    assert_eq!(
        error("s * n", &locals),
        "Unsupported operation of '*' between types 'java.lang.String?' and 'int'"
    );
}

#[test]
fn comparisons_materialize_booleans() {
    let locals = [("a", WaterType::INT), ("b", WaterType::INT)];
    let (ty, listing) = compile("a < b", &locals).unwrap();
    assert_eq!(ty, WaterType::BOOLEAN);
    assert!(listing.contains("IfIcmpge"), "{listing}");

    let locals = [("x", WaterType::DOUBLE), ("y", WaterType::DOUBLE)];
    let (_, listing) = compile("x < y", &locals).unwrap();
    assert!(listing.contains("Dcmpg"), "{listing}");
    let (_, listing) = compile("x > y", &locals).unwrap();
    assert!(listing.contains("Dcmpl"), "{listing}");
}

#[test]
fn logical_operators_short_circuit() {
    let locals = [("a", WaterType::BOOLEAN), ("b", WaterType::BOOLEAN)];
    let (ty, listing) = compile("a && b || !a", &locals).unwrap();
    assert_eq!(ty, WaterType::BOOLEAN);
    assert!(listing.contains("Ifeq") && listing.contains("Ifne"), "{listing}");
    assert!(!listing.contains("Iand") && !listing.contains("Ior"), "{listing}");
}

#[test]
fn reference_equality() {
    let locals = [("a", WaterType::string()), ("b", WaterType::string())];
    let (_, listing) = compile("a == b", &locals).unwrap();
    assert!(listing.contains("equals"), "{listing}");
    let (_, listing) = compile("a === b", &locals).unwrap();
    assert!(listing.contains("IfAcmp"), "{listing}");
    let (_, listing) = compile("a == null", &locals).unwrap();
    assert!(listing.contains("Ifnonnull") || listing.contains("Ifnull"), "{listing}");

    let locals = [("a", nullable_string()), ("b", WaterType::string())];
    assert_eq!(
        error("a == b", &locals),
        "Cannot perform equality check on nullable type ('java.lang.String?')"
    );
}

#[test]
fn address_comparison_of_primitives_is_rejected() {
    let locals = [("a", WaterType::INT), ("b", WaterType::INT)];
    assert_eq!(
        error("a === b", &locals),
        "Cannot perform address comparison on primitives ('int', 'int')"
    );
}

#[test]
fn method_calls_on_jdk_classes() {
    let locals = [("s", WaterType::string())];
    let (ty, listing) = compile("s.length()", &locals).unwrap();
    assert_eq!(ty, WaterType::INT);
    assert!(listing.contains("Invokevirtual") && listing.contains("length"), "{listing}");

    let (ty, listing) = compile("Math.max(1, 2L)", &[]).unwrap();
    assert_eq!(ty, WaterType::LONG);
    assert!(listing.contains("Invokestatic") && listing.contains("(JJ)J"), "{listing}");
}

#[test]
fn nullable_receivers_need_safe_calls() {
    let locals = [("s", nullable_string())];
    assert_eq!(
        error("s.length()", &locals),
        "Cannot use '.' to call methods on a nullable type ('java.lang.String?')"
    );
    let (ty, listing) = compile("s?.length()", &locals).unwrap();
    assert!(ty.is_class("java/lang/Integer") && ty.is_nullable(), "{ty}");
    assert!(listing.contains("Ifnull") && listing.contains("valueOf"), "{listing}");

    let locals = [("s", WaterType::string())];
    assert_eq!(
        error("s?.length()", &locals),
        "Cannot use '?.' on non-nullable type ('java.lang.String')"
    );
}

#[test]
fn null_safe_chains_share_one_null_branch() {
    let locals = [("s", nullable_string())];
    let (ty, listing) = compile("s?.trim()?.length()", &locals).unwrap();
    assert!(ty.is_class("java/lang/Integer") && ty.is_nullable(), "{ty}");
    assert_eq!(listing.matches("Jump(Ifnull, Label(0))").count(), 2, "{listing}");
    assert_eq!(listing.matches("Ifnull").count(), 2, "{listing}");
    assert_eq!(listing.matches("AconstNull").count(), 1, "{listing}");
    assert_eq!(listing.matches("Jump(Goto").count(), 1, "{listing}");
}

#[test]
fn coalesce_and_non_null_assertion() {
    let locals = [("s", nullable_string())];
    let (ty, listing) = compile("s ?? \"none\"", &locals).unwrap();
    assert!(ty.is_string() && !ty.is_nullable());
    assert!(listing.contains("Ifnonnull") || listing.contains("Ifnull"), "{listing}");

    let (ty, listing) = compile("s!!", &locals).unwrap();
    assert!(ty.is_string() && !ty.is_nullable());
    assert!(listing.contains("NullPointerException") && listing.contains("Athrow"), "{listing}");

    let locals = [("s", WaterType::string())];
    assert_eq!(
        error("s ?? \"none\"", &locals),
        "Cannot perform '??' on a non-nullable type ('java.lang.String')"
    );
}

#[test]
fn coalesce_fallback_must_fit_without_conversion() {
    let locals = [("n", WaterType::object("java/lang/Integer").as_nullable())];
    assert_eq!(
        error("n ?? 0", &locals),
        "Cannot perform '??' on types 'java.lang.Integer?' and 'int'"
    );

    let locals = [("o", WaterType::object(OBJECT).as_nullable())];
    let (ty, listing) = compile("o ?? \"x\"", &locals).unwrap();
    assert!(ty.is_class(OBJECT) && !ty.is_nullable(), "{ty}");
    assert!(!listing.contains("valueOf"), "{listing}");

    let locals = [("s", nullable_string()), ("t", nullable_string())];
    assert_eq!(
        error("s ?? t", &locals),
        "Cannot perform '??' on types 'java.lang.String?' and 'java.lang.String?'"
    );
    assert_eq!(
        error("s ?? 1", &[("s", nullable_string())]),
        "Cannot perform '??' on types 'java.lang.String?' and 'int'"
    );
}

#[test]
fn unknown_names() {
    assert_eq!(error("missing + 1", &[]), "Cannot resolve variable 'missing' in current scope.");
    assert_eq!(error("this", &[]), "Cannot use 'this' in a static context");
    let err = error("nothing(1)", &[]);
    assert!(err.starts_with("Could not resolve function 'nothing'"), "{err}");
}

#[test]
fn builtin_println_goes_through_system_out() {
    let (ty, listing) = compile("println(\"hello\")", &[]).unwrap();
    assert!(ty.is_void());
    assert!(listing.contains("java/lang/System") && listing.contains("out"), "{listing}");
    assert!(listing.contains("(Ljava/lang/String;)V"), "{listing}");
}

#[test]
fn assignments_store_and_keep_the_value() {
    let locals = [("x", WaterType::INT), ("d", WaterType::DOUBLE)];
    let (ty, listing) = compile("x = 5", &locals).unwrap();
    assert_eq!(ty, WaterType::INT);
    assert!(listing.contains("Dup") && listing.contains("Istore"), "{listing}");

    let (ty, listing) = compile("d = x", &locals).unwrap();
    assert_eq!(ty, WaterType::DOUBLE);
    assert!(listing.contains("I2d") && listing.contains("Dstore"), "{listing}");

    let (_, listing) = compile("x += 2.5", &locals).unwrap();
    assert!(listing.contains("Dadd") && listing.contains("D2i"), "{listing}");

    assert_eq!(
        error("x = \"text\"", &locals),
        "Cannot assign type 'java.lang.String' to variable of type 'int'"
    );
}

#[test]
fn int_locals_are_updated_in_place() {
    let locals = [("i", WaterType::INT), ("l", WaterType::LONG)];
    let (ty, listing) = compile("i++", &locals).unwrap();
    assert_eq!(ty, WaterType::INT);
    assert!(listing.contains("Iinc"), "{listing}");

    let (ty, listing) = compile("--l", &locals).unwrap();
    assert_eq!(ty, WaterType::LONG);
    assert!(listing.contains("Lsub") || listing.contains("Ladd"), "{listing}");
    assert!(!listing.contains("Iinc"), "{listing}");
}

#[test]
fn arrays() {
    let (ty, listing) = compile("new int[3]", &[]).unwrap();
    assert_eq!(ty, WaterType::array_of(WaterType::INT));
    assert!(listing.contains("NewArray(Int)"), "{listing}");

    let (ty, listing) = compile("new String[2][4]", &[]).unwrap();
    assert_eq!(ty.dimensions(), 2);
    assert!(listing.contains("MultiANewArray"), "{listing}");

    let locals = [("values", WaterType::array_of(WaterType::LONG))];
    let (ty, listing) = compile("values[1] + values.length", &locals).unwrap();
    assert_eq!(ty, WaterType::LONG);
    assert!(listing.contains("Laload") && listing.contains("Arraylength"), "{listing}");

    assert_eq!(
        error("values[1.5]", &locals),
        "Index must be an integer type (got 'double')"
    );
    assert_eq!(error("values.length = 2", &locals), "Invalid lvalue - cannot assign");
}

#[test]
fn casts() {
    let locals = [("d", WaterType::DOUBLE), ("o", WaterType::object(OBJECT))];
    let (ty, listing) = compile("d as int", &locals).unwrap();
    assert_eq!(ty, WaterType::INT);
    assert!(listing.contains("D2i"), "{listing}");

    let (ty, listing) = compile("o as String", &locals).unwrap();
    assert!(ty.is_string());
    assert!(listing.contains("Checkcast"), "{listing}");

    let (ty, listing) = compile("\"42\" as int", &locals).unwrap();
    assert_eq!(ty, WaterType::INT);
    assert!(listing.contains("parseInt"), "{listing}");

    assert_eq!(
        error("o as int", &locals),
        "Cannot cast between objects and primitives ('java.lang.Object' to 'int')"
    );
}

#[test]
fn instanceof_requires_an_object() {
    let locals = [("o", WaterType::object(OBJECT)), ("i", WaterType::INT)];
    let (ty, listing) = compile("o instanceof String", &locals).unwrap();
    assert_eq!(ty, WaterType::BOOLEAN);
    assert!(listing.contains("Instanceof"), "{listing}");
    assert_eq!(
        error("i instanceof String", &locals),
        "Can only perform 'instanceof' on objects (got 'int')"
    );
}

#[test]
fn constructors_are_overload_resolved() {
    let (ty, listing) = compile("new StringBuilder(\"x\")", &[]).unwrap();
    assert!(ty.is_class("java/lang/StringBuilder"));
    assert!(listing.contains("New") && listing.contains("(Ljava/lang/String;)V"), "{listing}");

    let err = error("new Comparable()", &[]);
    assert_eq!(err, "Cannot instantiate abstract class 'java.lang.Comparable'");
}

#[test]
fn type_of_emits_nothing() {
    let arena = Bump::new();
    let program = Parser::parse("var probe = 1 + 2L;", &arena).unwrap();
    let Decl::Var(var) = &program.decls[0] else { panic!("not a var") };
    let ctx = CompilationContext::new("main.wtr", "", true, OptimizationConfig::empty());
    let dir = ClassDirectory::default();
    let mut frame = Frame::new(ctx.container(), true, WaterType::VOID);
    let ty = ExprCompiler::new(&ctx, &dir, &mut frame).type_of(var.init.unwrap()).unwrap();
    assert_eq!(ty, WaterType::LONG);
    assert!(frame.code.is_empty());
}
