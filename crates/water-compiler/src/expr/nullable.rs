//! Null-aware operators: `?.` / `?[` chains, `??` and the `!` assertion.
//!
//! A chain such as `a?.b?.c` shares one jump target between all its
//! links. Each link tests its receiver with `dup; ifnull <target>`; the
//! outermost link (the head) binds the target, where the null receiver is
//! replaced by the chain's `null` result:
//!
//! ```text
//!     <a>  dup ifnull L   getfield b
//!          dup ifnull L   getfield c   <box>   goto end
//! L:  pop  aconst_null
//! end:
//! ```

use water_classfile::{Label, Opcode};
use water_core::SemanticErrorKind;
use water_parser::ast::{BinaryExpr, Expr, NonNullExpr};

use super::{ExprCompiler, Result};
use crate::error::semantic_kind;
use crate::types::{TypedCode, WaterType};

/// A `?.` link whose null branch still has to be closed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NullChain {
    label: Label,
    /// Whether this link binds the shared label.
    head: bool,
}

/// Whether `expr` is itself a `?.` or `?[` link.
fn is_null_safe(expr: &Expr<'_>) -> bool {
    match expr.unparen() {
        Expr::Member(m) => m.null_safe,
        Expr::MethodCall(m) => m.null_safe,
        Expr::Index(i) => i.null_safe,
        _ => false,
    }
}

/// Type of a value produced through a null chain.
pub(crate) fn null_safe_type(access: &WaterType) -> WaterType {
    if access.is_void() {
        WaterType::VOID
    } else {
        access.box_type().as_nullable()
    }
}

impl ExprCompiler<'_> {
    /// Push the receiver of a `?.` link and branch away when it is null.
    pub(crate) fn open_null_chain(&mut self, object: &Expr<'_>) -> Result<NullChain> {
        let inherited = self.null_chain.take();
        let head = inherited.is_none();
        let label = match inherited {
            Some(label) => label,
            None => self.code().new_label(),
        };
        if is_null_safe(object) {
            self.null_chain = Some(label);
        }
        let result = self.infer(object);
        self.null_chain = None;
        result?;
        self.code().emit(Opcode::Dup);
        self.code().jump(Opcode::Ifnull, label);
        Ok(NullChain { label, head })
    }

    /// Finish a link whose access left `value` on the stack (`None` when
    /// the access produced nothing).
    pub(crate) fn close_null_chain(&mut self, chain: NullChain, value: Option<&WaterType>) -> Result<WaterType> {
        let value = value.filter(|ty| !ty.is_void());
        if let Some(ty) = value {
            self.code().box_value(ty);
        }
        if chain.head {
            let end = self.code().new_label();
            self.code().jump(Opcode::Goto, end);
            self.code().bind(chain.label)?;
            self.code().emit(Opcode::Pop);
            if value.is_some() {
                self.code().push_null();
            }
            self.code().bind(end)?;
        }
        Ok(value.map_or(WaterType::VOID, null_safe_type))
    }
}

/// `expr!`: throw a `NullPointerException` when the value is null.
pub fn compile_non_null(compiler: &mut ExprCompiler<'_>, assert: &NonNullExpr<'_>) -> Result<WaterType> {
    let ty = compiler.infer(assert.operand)?;
    if ty.is_primitive() {
        return Err(semantic_kind(
            SemanticErrorKind::UnsupportedOperation,
            &assert.op_token,
            format!("Cannot assert non-null on primitive type '{}'", ty),
        ));
    }
    let code = compiler.code();
    let ok = code.new_label();
    code.emit(Opcode::Dup);
    code.jump(Opcode::Ifnonnull, ok);
    code.type_insn(Opcode::New, "java/lang/NullPointerException");
    code.emit(Opcode::Dup);
    code.invoke(Opcode::Invokespecial, "java/lang/NullPointerException", "<init>", "()V", false);
    code.emit(Opcode::Athrow);
    code.bind(ok)?;
    Ok(ty.as_non_nullable())
}

/// `left ?? right`: `left` unless it is null.
///
/// The fallback must fit the non-nullable left type as is; nothing is
/// boxed or widened.
pub fn compile_coalesce(compiler: &mut ExprCompiler<'_>, bin: &BinaryExpr<'_>) -> Result<WaterType> {
    let left = compiler.type_of(bin.left)?;
    let right = compiler.type_of(bin.right)?;
    if !left.is_nullable() || left.is_null() {
        return Err(semantic_kind(
            SemanticErrorKind::UnsupportedOperation,
            &bin.op_token,
            format!("Cannot perform '??' on a non-nullable type ('{}')", left),
        ));
    }
    let result = left.as_non_nullable();
    if !compiler.is_assignable(&result, &right, &bin.op_token)? {
        return Err(semantic_kind(
            SemanticErrorKind::UnsupportedOperation,
            &bin.op_token,
            format!("Cannot perform '??' on types '{}' and '{}'", left, right),
        ));
    }

    compiler.infer(bin.left)?;
    let end = compiler.code().new_label();
    compiler.code().emit(Opcode::Dup);
    compiler.code().jump(Opcode::Ifnonnull, end);
    compiler.code().emit(Opcode::Pop);
    compiler.infer(bin.right)?;
    compiler.code().bind(end)?;
    Ok(result)
}
