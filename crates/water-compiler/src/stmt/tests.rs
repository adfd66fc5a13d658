use bumpalo::Bump;
use water_classfile::{AssembledCode, ConstantPool};
use water_parser::ast::{Decl, FunctionBody};
use water_parser::Parser;

use crate::context::CompilationContext;
use crate::directory::ClassDirectory;
use crate::error::Result;
use crate::function_compiler::FunctionCompiler;
use crate::options::OptimizationConfig;
use crate::types::WaterType;

/// Compile the first function of `source` as a static method and
/// assemble it. Returns the instruction listing and the assembled body.
fn compile_function(source: &str) -> Result<(String, AssembledCode)> {
    let arena = Bump::new();
    let program = Parser::parse(source, &arena).expect("parse");
    let Decl::Function(function) = &program.decls[0] else { panic!("not a function") };
    let FunctionBody::Block(body) = function.body else { panic!("not a block body") };

    let ctx = CompilationContext::new("main.wtr", "", true, OptimizationConfig::default());
    let dir = ClassDirectory::default();
    let return_type = match &function.return_type {
        Some(ty) => ctx.resolve_type(ty, &dir)?,
        None => WaterType::VOID,
    };
    let mut params = Vec::new();
    for param in function.params {
        params.push((param.name, ctx.resolve_type(&param.ty, &dir)?));
    }

    let mut compiler = FunctionCompiler::new(&ctx, &dir, ctx.container(), true, return_type);
    compiler.setup_parameters(&params)?;
    compiler.compile_body(body)?;
    compiler.verify_returns(body, &function.name.token())?;
    let code = compiler.finish();
    let listing = format!("{:?}", code);
    let assembled = code.assemble(&mut ConstantPool::new())?;
    Ok((listing, assembled))
}

fn error(source: &str) -> String {
    match compile_function(source) {
        Ok((listing, _)) => panic!("expected an error: {listing}"),
        Err(err) => err.to_string(),
    }
}

#[test]
fn if_else_with_returns() {
    let (listing, code) =
        compile_function("function max(a: int, b: int) -> int { if (a > b) { return a; } else { return b; } }")
            .unwrap();
    assert!(listing.contains("IfIcmple"), "{listing}");
    assert!(listing.contains("Ireturn"), "{listing}");
    assert_eq!(code.max_locals, 2);
}

#[test]
fn missing_return() {
    assert_eq!(
        error("function f(a: boolean) -> int { if (a) { return 1; } }"),
        "Non-void function must return a value."
    );
}

#[test]
fn conditions_must_be_boolean() {
    assert_eq!(error("function f() { if (1) { } }"), "Invalid condition type (int =/= boolean)");
    assert_eq!(error("function f() { while (\"x\") { } }"), "Invalid condition type (java.lang.String =/= boolean)");
}

#[test]
fn while_loop() {
    let (listing, code) = compile_function(
        "function sum(n: int) -> int { var total = 0; var i = 0; while (i < n) { total += i; i++; } return total; }",
    )
    .unwrap();
    assert!(listing.contains("Goto") && listing.contains("Iinc"), "{listing}");
    assert!(listing.contains("IfIcmpge"), "{listing}");
    assert_eq!(code.max_locals, 3);
}

#[test]
fn for_loop_variables_are_scoped() {
    let (listing, _) = compile_function("function f() { for (var i = 0; i < 3; i++) { println(i); } }").unwrap();
    assert!(listing.contains("Iinc") && listing.contains("(I)V"), "{listing}");
    assert_eq!(
        error("function f() { for (var i = 0; i < 3; i++) { } println(i); }"),
        "Cannot resolve variable 'i' in current scope."
    );
}

#[test]
fn local_declarations() {
    assert_eq!(
        error("function f() { var x = 1; var x = 2; }"),
        "Redefinition of variable 'x' in same scope."
    );
    assert!(compile_function("function f() { var x = 1; { var x = \"inner\"; println(x); } println(x); }").is_ok());
    assert_eq!(
        error("function f() { var x: int = \"a\"; }"),
        "Cannot assign type of 'java.lang.String' to annotated type of 'int'."
    );
    assert_eq!(
        error("function f() { var s: String; }"),
        "Cannot default initialize variable of type 'java.lang.String'"
    );
    assert_eq!(error("function f() { const x = 1; x = 2; }"), "Reassignment of constant 'x'.");

    let (listing, _) = compile_function("function f() { var s: String?; var n: long; var d: double = 1; }").unwrap();
    assert!(listing.contains("AconstNull") && listing.contains("Lconst0"), "{listing}");
    assert!(listing.contains("Dconst1") || listing.contains("I2d"), "{listing}");
}

#[test]
fn return_checks() {
    assert_eq!(error("function f() { return 1; }"), "Cannot return value from void function");
    assert_eq!(error("function f() -> int { return; }"), "Non-void function's return must have a value.");
    assert_eq!(
        error("function f() -> int { return \"s\"; }"),
        "Cannot return type 'java.lang.String' from function expecting 'int'"
    );
    assert_eq!(error("function f() -> int { return println(); }"), "Cannot return void value");

    let (listing, _) = compile_function("function f(x: int) -> long { return x; }").unwrap();
    assert!(listing.contains("I2l") && listing.contains("Lreturn"), "{listing}");
}

#[test]
fn throw_checks() {
    assert_eq!(error("function f() { throw 5; }"), "Cannot throw primitive type (got 'int').");
    assert_eq!(
        error("function f() { throw \"x\"; }"),
        "throw target must be an extension of java.lang.Throwable ('java.lang.String' cannot be cast)."
    );
    let (listing, _) = compile_function("function f() { throw new RuntimeException(\"x\"); }").unwrap();
    assert!(listing.contains("Athrow"), "{listing}");
}

#[test]
fn try_catch_registers_a_handler() {
    let (_, code) = compile_function(
        "function f() -> int { try { return Integer.parseInt(\"x\"); } catch (e: RuntimeException) { return -1; } }",
    )
    .unwrap();
    assert_eq!(code.exception_table.len(), 1);
    assert_ne!(code.exception_table[0].catch_type, 0);
}

#[test]
fn catch_types_must_be_throwable() {
    assert_eq!(
        error("function f() { try { } catch (e: String) { } }"),
        "catch target must be an extension of java.lang.Throwable ('java.lang.String' cannot be cast)."
    );
}

#[test]
fn finally_runs_before_return() {
    let (listing, code) = compile_function(
        "function f() -> int { try { return Integer.parseInt(\"1\"); } finally { println(\"done\"); } }",
    )
    .unwrap();
    // One copy before the return, one in the catch-all handler.
    assert_eq!(listing.matches("\"done\"").count(), 2, "{listing}");
    assert!(code.exception_table.iter().all(|entry| entry.catch_type == 0));
    assert_eq!(code.exception_table.len(), 2);
}

#[test]
fn finally_on_normal_and_exceptional_paths() {
    let (listing, code) = compile_function(
        "function f() { try { println(1); } catch (e: RuntimeException) { println(2); } finally { println(3); } }",
    )
    .unwrap();
    // After the body, after the catch, and in the catch-all handler.
    assert_eq!(listing.matches("Iconst3").count(), 3, "{listing}");
    let typed = code.exception_table.iter().filter(|e| e.catch_type != 0).count();
    let any = code.exception_table.iter().filter(|e| e.catch_type == 0).count();
    assert_eq!((typed, any), (1, 2));
}

#[test]
fn instanceof_narrows_inside_the_then_branch() {
    let (listing, _) = compile_function(
        "function f(o: Object) -> int { if (o instanceof String) { return o.length(); } return 0; }",
    )
    .unwrap();
    assert!(listing.contains("Instanceof") && listing.contains("Checkcast"), "{listing}");

    let err = error("function f(o: Object) { if (o instanceof String) { } println(o.length()); }");
    assert!(err.contains("'length'"), "{err}");

    assert_eq!(
        error("function f(s: String) { if (s instanceof Integer) { } }"),
        "Cannot check for an instance between 'java.lang.String' and 'java.lang.Integer'"
    );
}
