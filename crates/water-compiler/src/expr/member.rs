//! Member access (`obj.field`, `Class.field`) and indexing (`arr[i]`).

use water_core::SemanticErrorKind;
use water_parser::ast::{IndexExpr, MemberExpr};
use water_parser::Token;

use super::place::{property_accessors, Place, PlaceKind, Receiver, Target};
use super::{ExprCompiler, Result};
use crate::error::{semantic, semantic_kind, ResolveExt};
use crate::types::{WaterType, OBJECT};

pub fn compile_member(compiler: &mut ExprCompiler<'_>, member: &MemberExpr<'_>) -> Result<WaterType> {
    let place = resolve_member(compiler, member)?;
    compiler.read_place(&place)
}

pub fn compile_index(compiler: &mut ExprCompiler<'_>, index: &IndexExpr<'_>) -> Result<WaterType> {
    let place = resolve_index(compiler, index)?;
    compiler.read_place(&place)
}

/// `?.` needs a nullable receiver and `.` a non-nullable one.
fn check_receiver(ty: &WaterType, null_safe: bool, token: &Token<'_>, safe: &str, plain: &str) -> Result<()> {
    if null_safe && !ty.is_nullable() {
        return Err(semantic(
            token,
            format!("Cannot use '{}' on non-nullable type ('{}')", safe, ty),
        ));
    }
    if !null_safe && ty.is_nullable() {
        return Err(semantic(
            token,
            format!("Cannot use '{}' to access members on a nullable type ('{}')", plain, ty),
        ));
    }
    Ok(())
}

fn unresolved_field(token: &Token<'_>, name: &str, class: &str) -> crate::error::CompileError {
    semantic_kind(
        SemanticErrorKind::Unresolved,
        token,
        format!("Could not resolve field '{}' in class '{}'", name, class.replace('/', ".")),
    )
}

pub(crate) fn resolve_member<'p>(compiler: &mut ExprCompiler<'_>, member: &MemberExpr<'p>) -> Result<Place<'p>> {
    if !member.null_safe
        && let Some(class) = compiler.static_class(member.object)?
    {
        return resolve_static_member(compiler, &class, member);
    }

    let token = member.name.token();
    let name = member.name.name;
    let object_ty = compiler.type_of(member.object)?;
    check_receiver(&object_ty, member.null_safe, &token, "?.", ".")?;
    let object_ty = object_ty.as_non_nullable();
    let receiver = Receiver::Expr {
        expr: member.object,
        null_safe: member.null_safe,
    };

    if object_ty.is_array() && name == "length" {
        return Ok(Place {
            ty: WaterType::INT,
            name: name.to_string(),
            token,
            kind: PlaceKind::Member,
            is_const: true,
            target: Target::Length(receiver),
        });
    }

    let class = match object_ty.class_name() {
        Some(class) => class.to_string(),
        None if object_ty.is_array() => OBJECT.to_string(),
        None => {
            return Err(semantic(
                &token,
                format!("Cannot access member on type '{}'", object_ty),
            ));
        }
    };

    let field = compiler.directory.find_field(&class, name).at(&token)?;
    if let Some(field) = &field
        && compiler.can_access(&field.owner, field.info.access, &token)?
    {
        if field.info.access.is_static() {
            return Err(semantic_kind(
                SemanticErrorKind::StaticContext,
                &token,
                "Cannot access static member from non-static object.",
            ));
        }
        return Ok(Place {
            ty: field.info.ty.clone(),
            name: name.to_string(),
            token,
            kind: PlaceKind::Member,
            is_const: field.info.access.is_final(),
            target: Target::Field {
                object: Some(receiver),
                owner: field.owner.clone(),
                name: name.to_string(),
            },
        });
    }

    match property_accessors(compiler, &class, name, false, &token)? {
        Some((getter, setters)) => Ok(Place {
            ty: getter.info.ty.ret.clone(),
            name: name.to_string(),
            token,
            kind: PlaceKind::Member,
            is_const: field.is_some_and(|f| f.info.access.is_final()),
            target: Target::Accessors {
                object: Some(receiver),
                owner: class,
                getter,
                setters,
            },
        }),
        None => Err(unresolved_field(&token, name, &class)),
    }
}

/// `Class.name`: a static field or static property.
fn resolve_static_member<'p>(
    compiler: &mut ExprCompiler<'_>,
    class: &str,
    member: &MemberExpr<'p>,
) -> Result<Place<'p>> {
    let token = member.name.token();
    let name = member.name.name;
    let field = compiler.directory.find_field(class, name).at(&token)?;
    if let Some(field) = &field
        && compiler.can_access(&field.owner, field.info.access, &token)?
    {
        if !field.info.access.is_static() {
            return Err(semantic_kind(
                SemanticErrorKind::StaticContext,
                &token,
                "Cannot invoke non-static member from static class.",
            ));
        }
        return Ok(Place {
            ty: field.info.ty.clone(),
            name: name.to_string(),
            token,
            kind: PlaceKind::Member,
            is_const: field.info.access.is_final(),
            target: Target::Field {
                object: None,
                owner: field.owner.clone(),
                name: name.to_string(),
            },
        });
    }

    match property_accessors(compiler, class, name, true, &token)? {
        Some((getter, setters)) => Ok(Place {
            ty: getter.info.ty.ret.clone(),
            name: name.to_string(),
            token,
            kind: PlaceKind::Member,
            is_const: field.is_some_and(|f| f.info.access.is_final()),
            target: Target::Accessors {
                object: None,
                owner: class.to_string(),
                getter,
                setters,
            },
        }),
        None => Err(unresolved_field(&token, name, class)),
    }
}

pub(crate) fn resolve_index<'p>(compiler: &mut ExprCompiler<'_>, index: &IndexExpr<'p>) -> Result<Place<'p>> {
    let token = index.bracket;
    let object_ty = compiler.type_of(index.object)?;
    check_receiver(&object_ty, index.null_safe, &token, "?[", "[")?;
    let Some(element) = object_ty.element_type().cloned() else {
        return Err(semantic(
            &token,
            format!("Cannot get index of type '{}'", object_ty),
        ));
    };
    let index_ty = compiler.type_of(index.index)?;
    if !index_ty.is_int_group() {
        return Err(semantic(
            &index.index.token(),
            format!("Index must be an integer type (got '{}')", index_ty),
        ));
    }
    Ok(Place {
        ty: element,
        name: token.lexeme.to_string(),
        token,
        kind: PlaceKind::Element,
        is_const: false,
        target: Target::Element {
            array: Receiver::Expr {
                expr: index.object,
                null_safe: index.null_safe,
            },
            index: index.index,
        },
    })
}
