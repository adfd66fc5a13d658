//! Function, method, `super` and constructor calls.
//!
//! Every call follows the same steps: type the arguments without emitting
//! them, pick an overload, then emit the receiver, the arguments
//! converted to the chosen parameter types, and the invoke instruction.

use water_classfile::{AccessFlags, Opcode};
use water_core::SemanticErrorKind;
use water_parser::ast::{CallExpr, MethodCallExpr, NewExpr, SuperCallExpr};
use water_parser::Token;

use super::{ExprCompiler, Result};
use crate::directory::{Member, MethodInfo};
use crate::error::{semantic, semantic_kind, unresolved, CompileError, ResolveExt};
use crate::overload::{resolve_overload, OverloadError};
use crate::scope::{Function, FunctionKind};
use crate::types::{describe_types, MethodType, WaterType, OBJECT};

const PRINT_STREAM: &str = "java/io/PrintStream";

fn no_overload(what: &str, name: &str, token: &Token<'_>, args: &[WaterType]) -> CompileError {
    semantic_kind(
        SemanticErrorKind::NoApplicableOverload,
        token,
        format!("Could not resolve {} '{}' with arguments: {}", what, name, describe_types(args)),
    )
}

/// Call of a bare name: a function of the current class, an inherited
/// method, a top-level function or a builtin.
pub fn compile_call(compiler: &mut ExprCompiler<'_>, call: &CallExpr<'_>) -> Result<WaterType> {
    let token = call.name.token();
    let name = call.name.name;
    let args = compiler.arg_types(call.args)?;
    let candidates = function_candidates(compiler, name, &token)?;
    let is_static = compiler.frame.is_static;
    let chosen = match resolve_overload(&candidates, &args, compiler.directory, |f| {
        f.kind != FunctionKind::Instance || !is_static
    }) {
        Ok(chosen) => chosen.candidate.clone(),
        Err(OverloadError::NoApplicable) => return Err(no_overload("function", name, &token, &args)),
        Err(OverloadError::WrongContext) => {
            return Err(semantic_kind(
                SemanticErrorKind::StaticContext,
                &token,
                format!("Cannot invoke non-static function '{}' from a static context", name),
            ));
        }
        Err(OverloadError::Unresolved(err)) => return Err(unresolved(&token, err)),
    };
    tracing::trace!(function = name, owner = %chosen.owner, "resolved call");

    let descriptor = chosen.descriptor();
    match chosen.kind {
        FunctionKind::Builtin => {
            compiler.code().field(Opcode::Getstatic, "java/lang/System", "out", "Ljava/io/PrintStream;");
            compiler.compile_args(call.args, &chosen.ty.params)?;
            compiler.code().invoke(Opcode::Invokevirtual, PRINT_STREAM, &chosen.name, &descriptor, false);
        }
        FunctionKind::Static => {
            compiler.compile_args(call.args, &chosen.ty.params)?;
            compiler.code().invoke(Opcode::Invokestatic, &chosen.owner, &chosen.name, &descriptor, false);
        }
        FunctionKind::Instance => {
            let class = compiler.frame.class.clone();
            compiler.code().load(Opcode::Aload, 0);
            compiler.compile_args(call.args, &chosen.ty.params)?;
            let op = if chosen.is_private { Opcode::Invokespecial } else { Opcode::Invokevirtual };
            compiler.code().invoke(op, &class, &chosen.name, &descriptor, false);
        }
    }
    Ok(chosen.ty.ret)
}

/// Overload candidates for a bare name, in lookup order.
fn function_candidates(compiler: &ExprCompiler<'_>, name: &str, token: &Token<'_>) -> Result<Vec<Function>> {
    let ctx = compiler.ctx;
    let class = compiler.frame.class.as_str();
    let mut candidates = Vec::new();
    if let Some(scope) = ctx.class(class) {
        candidates.extend(scope.members.functions(name).iter().cloned());
        if class != ctx.container() {
            for method in compiler.directory.find_methods(&scope.superclass, name).at(token)? {
                if method.info.access.is_private() || !compiler.can_access(&method.owner, method.info.access, token)? {
                    continue;
                }
                candidates.push(Function {
                    kind: if method.info.is_static() { FunctionKind::Static } else { FunctionKind::Instance },
                    name: method.info.name,
                    owner: method.owner,
                    ty: method.info.ty,
                    is_private: false,
                });
            }
            if let Some(container) = ctx.class(ctx.container()) {
                candidates.extend(
                    container
                        .members
                        .functions(name)
                        .iter()
                        .filter(|f| f.kind == FunctionKind::Static && !f.is_private)
                        .cloned(),
                );
            }
        }
    }
    candidates.extend(ctx.builtins().functions(name).iter().cloned());
    Ok(candidates)
}

/// Pick among `methods` for a call made through a class name
/// (`static_access`) or through an object.
fn resolve_method(
    compiler: &ExprCompiler<'_>,
    methods: &[Member<MethodInfo>],
    args: &[WaterType],
    name: &str,
    token: &Token<'_>,
    static_access: bool,
) -> Result<Member<MethodInfo>> {
    match resolve_overload(methods, args, compiler.directory, |m| m.info.is_static() == static_access) {
        Ok(chosen) => Ok(chosen.candidate.clone()),
        Err(OverloadError::NoApplicable) => Err(no_overload("method", name, token, args)),
        Err(OverloadError::WrongContext) => {
            let message = if static_access {
                "Cannot invoke non-static method from static class."
            } else {
                "Cannot invoke static method from non-static object."
            };
            Err(semantic_kind(SemanticErrorKind::StaticContext, token, message))
        }
        Err(OverloadError::Unresolved(err)) => Err(unresolved(token, err)),
    }
}

/// Methods called `name` on `class` that the current class may call.
fn visible_methods(
    compiler: &ExprCompiler<'_>,
    class: &str,
    name: &str,
    token: &Token<'_>,
) -> Result<Vec<Member<MethodInfo>>> {
    let mut visible = Vec::new();
    for method in compiler.directory.find_methods(class, name).at(token)? {
        if compiler.can_access(&method.owner, method.info.access, token)? {
            visible.push(method);
        }
    }
    Ok(visible)
}

/// `receiver.name(args)`, `receiver?.name(args)` and `Class.name(args)`.
pub fn compile_method_call(compiler: &mut ExprCompiler<'_>, call: &MethodCallExpr<'_>) -> Result<WaterType> {
    let token = call.name.token();
    let name = call.name.name;

    if !call.null_safe
        && let Some(class) = compiler.static_class(call.receiver)?
    {
        let args = compiler.arg_types(call.args)?;
        let methods = visible_methods(compiler, &class, name, &token)?;
        let chosen = resolve_method(compiler, &methods, &args, name, &token, true)?;
        compiler.compile_args(call.args, &chosen.info.ty.params)?;
        compiler.invoke_method(&class, &chosen, false);
        return Ok(chosen.info.ty.ret);
    }

    let receiver_ty = compiler.type_of(call.receiver)?;
    if call.null_safe && !receiver_ty.is_nullable() {
        return Err(semantic(
            &token,
            format!("Cannot use '?.' on non-nullable type ('{}')", receiver_ty),
        ));
    }
    if !call.null_safe && receiver_ty.is_nullable() {
        return Err(semantic(
            &token,
            format!("Cannot use '.' to call methods on a nullable type ('{}')", receiver_ty),
        ));
    }
    let receiver_ty = receiver_ty.as_non_nullable();
    let class = match receiver_ty.class_name() {
        Some(class) => class.to_string(),
        None if receiver_ty.is_array() => OBJECT.to_string(),
        None => {
            return Err(semantic(
                &token,
                format!("Cannot invoke method on type '{}'", receiver_ty),
            ));
        }
    };

    let args = compiler.arg_types(call.args)?;
    let methods = visible_methods(compiler, &class, name, &token)?;
    let chosen = resolve_method(compiler, &methods, &args, name, &token, false)?;

    let chain = if call.null_safe {
        Some(compiler.open_null_chain(call.receiver)?)
    } else {
        compiler.infer(call.receiver)?;
        None
    };
    compiler.compile_args(call.args, &chosen.info.ty.params)?;
    compiler.invoke_method(&class, &chosen, false);
    let ret = chosen.info.ty.ret;
    match chain {
        Some(chain) => compiler.close_null_chain(chain, Some(&ret)),
        None => Ok(ret),
    }
}

/// `super.name(args)`: the superclass implementation, called with
/// `invokespecial`.
pub fn compile_super_call(compiler: &mut ExprCompiler<'_>, call: &SuperCallExpr<'_>) -> Result<WaterType> {
    let ctx = compiler.ctx;
    let class = compiler.frame.class.clone();
    let superclass = match ctx.class(&class) {
        Some(scope) if class != ctx.container() => scope.superclass.clone(),
        _ => return Err(semantic(&call.super_token, "Can only use 'super' within a class.")),
    };
    if compiler.frame.is_static {
        return Err(semantic_kind(
            SemanticErrorKind::StaticContext,
            &call.super_token,
            "Cannot use 'super' in a static context",
        ));
    }

    let token = call.name.token();
    let name = call.name.name;
    let args = compiler.arg_types(call.args)?;
    let methods: Vec<_> = visible_methods(compiler, &superclass, name, &token)?
        .into_iter()
        .filter(|m| !m.info.access.contains(AccessFlags::ABSTRACT))
        .collect();
    let chosen = resolve_method(compiler, &methods, &args, name, &token, false)?;

    compiler.code().load(Opcode::Aload, 0);
    compiler.compile_args(call.args, &chosen.info.ty.params)?;
    compiler.invoke_method(&superclass, &chosen, true);
    Ok(chosen.info.ty.ret)
}

/// `new T(args)`.
pub fn compile_new(compiler: &mut ExprCompiler<'_>, new: &NewExpr<'_>) -> Result<WaterType> {
    let token = new.new_token;
    let ty = compiler.ctx.resolve_type(&new.ty, compiler.directory)?;
    let Some(class) = ty.class_name().map(str::to_string) else {
        return Err(semantic(&token, format!("Cannot instantiate type '{}'", ty)));
    };
    let info = compiler.directory.require(&class).at(&token)?;
    let display = class.replace('/', ".");
    if info.is_interface() || info.is_abstract() {
        return Err(semantic(&token, format!("Cannot instantiate abstract class '{}'", display)));
    }
    if info.access.contains(AccessFlags::ENUM) {
        return Err(semantic(&token, format!("Cannot instantiate enum '{}'", display)));
    }

    let args = compiler.arg_types(new.args)?;
    let mut constructors = Vec::new();
    for constructor in &info.constructors {
        if compiler.can_access(&class, constructor.access, &token)? {
            constructors.push(constructor.clone());
        }
    }
    let chosen = match resolve_overload(&constructors, &args, compiler.directory, |_| true) {
        Ok(chosen) => chosen.candidate.clone(),
        Err(OverloadError::Unresolved(err)) => return Err(unresolved(&token, err)),
        Err(_) => return Err(no_overload("constructor of", &display, &token, &args)),
    };

    compiler.code().type_insn(Opcode::New, &class);
    compiler.code().emit(Opcode::Dup);
    compiler.compile_args(new.args, &chosen.ty.params)?;
    let descriptor = MethodType::new(chosen.ty.params.clone(), WaterType::VOID).descriptor();
    compiler.code().invoke(Opcode::Invokespecial, &class, "<init>", &descriptor, false);
    Ok(WaterType::object(class))
}
