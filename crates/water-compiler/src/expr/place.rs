//! Storage locations named by expressions.
//!
//! Identifiers, member accesses and index expressions all resolve to a
//! [`Place`]: where the value lives, what has to be on the stack to reach
//! it, and how to load or store it. Reads, assignments and `++`/`--`
//! share this one resolution so they can never disagree on what a name
//! means.
//!
//! The stack protocol is always the same:
//! 1. `emit_receivers` pushes the object (and index) the place needs
//! 2. `load_place` / `store_place` consume them

use water_classfile::Opcode;
use water_core::SemanticErrorKind;
use water_parser::ast::{Expr, Ident};
use water_parser::Token;

use super::nullable::NullChain;
use super::{ExprCompiler, Result};
use crate::directory::{Member, MethodInfo};
use crate::error::{semantic_kind, ResolveExt};
use crate::scope::{getter_name, setter_name, Variable, VariableKind};
use crate::types::{MethodType, TypedCode, WaterType};
use water_classfile::AccessFlags;

/// The object a member is read from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Receiver<'p> {
    This,
    Expr { expr: &'p Expr<'p>, null_safe: bool },
}

/// Where a place's value lives.
#[derive(Debug, Clone)]
pub(crate) enum Target<'p> {
    Local(u16),
    /// A field read directly; static when `object` is `None`.
    Field {
        object: Option<Receiver<'p>>,
        owner: String,
        name: String,
    },
    /// A property reached through its getter and setters.
    Accessors {
        object: Option<Receiver<'p>>,
        owner: String,
        getter: Member<MethodInfo>,
        setters: Vec<Member<MethodInfo>>,
    },
    Element {
        array: Receiver<'p>,
        index: &'p Expr<'p>,
    },
    Length(Receiver<'p>),
}

/// How the place was written, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlaceKind {
    Variable,
    Member,
    Element,
}

#[derive(Debug, Clone)]
pub(crate) struct Place<'p> {
    pub ty: WaterType,
    pub name: String,
    pub token: Token<'p>,
    pub kind: PlaceKind,
    pub is_const: bool,
    pub target: Target<'p>,
}

impl Place<'_> {
    /// Stack slots taken by the receivers of this place.
    pub fn receiver_slots(&self) -> u16 {
        match &self.target {
            Target::Local(_) => 0,
            Target::Field { object, .. } | Target::Accessors { object, .. } => u16::from(object.is_some()),
            Target::Element { .. } => 2,
            Target::Length(_) => 1,
        }
    }
}

/// Resolve an assignment or update target.
pub(crate) fn resolve_place<'p>(
    compiler: &mut ExprCompiler<'_>,
    expr: &'p Expr<'p>,
    invalid: &str,
) -> Result<Place<'p>> {
    match expr.unparen() {
        Expr::Ident(ident) => resolve_ident(compiler, ident),
        Expr::Member(member) => super::member::resolve_member(compiler, member),
        Expr::Index(index) => super::member::resolve_index(compiler, index),
        other => Err(semantic_kind(SemanticErrorKind::InvalidAssignment, &other.token(), invalid)),
    }
}

pub(crate) fn resolve_ident<'p>(compiler: &mut ExprCompiler<'_>, ident: &Ident<'p>) -> Result<Place<'p>> {
    lookup_variable(compiler, ident)?.ok_or_else(|| {
        semantic_kind(
            SemanticErrorKind::Unresolved,
            &ident.token(),
            format!("Cannot resolve variable '{}' in current scope.", ident.name),
        )
    })
}

/// Find the variable a bare name refers to: locals, then the current
/// class, then inherited fields, then the file's globals.
pub(crate) fn lookup_variable<'p>(compiler: &mut ExprCompiler<'_>, ident: &Ident<'p>) -> Result<Option<Place<'p>>> {
    let token = ident.token();
    if let Some(var) = compiler.frame.locals.lookup(ident.name)
        && let VariableKind::Local(slot) = var.kind
    {
        return Ok(Some(Place {
            ty: var.ty.clone(),
            name: var.name.clone(),
            token,
            kind: PlaceKind::Variable,
            is_const: var.is_const,
            target: Target::Local(slot),
        }));
    }

    let ctx = compiler.ctx;
    let class = compiler.frame.class.clone();
    let Some(scope) = ctx.class(&class) else { return Ok(None) };
    if let Some(var) = scope.members.variable(ident.name) {
        return own_member(compiler, var, token).map(Some);
    }
    if class == ctx.container() {
        return Ok(None);
    }
    if let Some(place) = inherited(compiler, &scope.superclass, ident)? {
        return Ok(Some(place));
    }
    match ctx.class(ctx.container()).and_then(|c| c.members.variable(ident.name)) {
        Some(var) => global(var, token).map(Some),
        None => Ok(None),
    }
}

fn own_member<'p>(compiler: &ExprCompiler<'_>, var: &Variable, token: Token<'p>) -> Result<Place<'p>> {
    let object = if var.kind == VariableKind::Field {
        Some(this_receiver(compiler, &var.name, &token)?)
    } else {
        None
    };
    Ok(Place {
        ty: var.ty.clone(),
        name: var.name.clone(),
        token,
        kind: PlaceKind::Variable,
        is_const: var.is_const,
        target: Target::Field {
            object,
            owner: var.owner.clone(),
            name: var.name.clone(),
        },
    })
}

fn this_receiver<'p>(compiler: &ExprCompiler<'_>, name: &str, token: &Token<'_>) -> Result<Receiver<'p>> {
    if compiler.frame.is_static {
        return Err(semantic_kind(
            SemanticErrorKind::StaticContext,
            token,
            format!("Cannot access instance member '{}' in a static context", name),
        ));
    }
    Ok(Receiver::This)
}

/// A field declared by a superclass, used by its bare name.
fn inherited<'p>(compiler: &mut ExprCompiler<'_>, superclass: &str, ident: &Ident<'p>) -> Result<Option<Place<'p>>> {
    let token = ident.token();
    let Some(field) = compiler.directory.find_field(superclass, ident.name).at(&token)? else {
        return Ok(None);
    };
    let is_static = field.info.access.is_static();
    let object = if is_static {
        None
    } else {
        Some(this_receiver(compiler, ident.name, &token)?)
    };
    if compiler.can_access(&field.owner, field.info.access, &token)? {
        return Ok(Some(Place {
            ty: field.info.ty.clone(),
            name: ident.name.to_string(),
            token,
            kind: PlaceKind::Variable,
            is_const: field.info.access.is_final(),
            target: Target::Field {
                object,
                owner: field.owner,
                name: ident.name.to_string(),
            },
        }));
    }
    let Some((getter, setters)) = property_accessors(compiler, superclass, ident.name, is_static, &token)? else {
        return Ok(None);
    };
    Ok(Some(Place {
        ty: getter.info.ty.ret.clone(),
        name: ident.name.to_string(),
        token,
        kind: PlaceKind::Variable,
        is_const: field.info.access.is_final(),
        target: Target::Accessors {
            object,
            owner: superclass.to_string(),
            getter,
            setters,
        },
    }))
}

/// A top-level variable used from one of the file's classes. Globals are
/// private statics of the container, reached through their accessors.
fn global<'p>(var: &Variable, token: Token<'p>) -> Result<Place<'p>> {
    if var.is_private {
        return Err(semantic_kind(
            SemanticErrorKind::Unresolved,
            &token,
            format!("Cannot access private variable '{}' outside of its declaring class", var.name),
        ));
    }
    let accessor = |name: String, ty: MethodType| Member {
        owner: var.owner.clone(),
        info: MethodInfo {
            name,
            access: AccessFlags::PUBLIC | AccessFlags::STATIC,
            ty,
        },
    };
    let getter = accessor(var.getter_name(), MethodType::new(Vec::new(), var.ty.clone()));
    let setters = if var.is_const {
        Vec::new()
    } else {
        vec![accessor(var.setter_name(), MethodType::new(vec![var.ty.clone()], WaterType::VOID))]
    };
    Ok(Place {
        ty: var.ty.clone(),
        name: var.name.clone(),
        token,
        kind: PlaceKind::Variable,
        is_const: var.is_const,
        target: Target::Accessors {
            object: None,
            owner: var.owner.clone(),
            getter,
            setters,
        },
    })
}

/// Getter (`getX`, then `x`) and setters (`setX`) standing in for a
/// field that cannot be accessed directly.
pub(crate) fn property_accessors(
    compiler: &ExprCompiler<'_>,
    class: &str,
    name: &str,
    is_static: bool,
    token: &Token<'_>,
) -> Result<Option<(Member<MethodInfo>, Vec<Member<MethodInfo>>)>> {
    let mut getter = None;
    'search: for candidate in [getter_name(name), name.to_string()] {
        for method in compiler.directory.find_methods(class, &candidate).at(token)? {
            let ty = &method.info.ty;
            if ty.params.is_empty()
                && !ty.ret.is_void()
                && method.info.is_static() == is_static
                && compiler.can_access(&method.owner, method.info.access, token)?
            {
                getter = Some(method);
                break 'search;
            }
        }
    }
    let Some(getter) = getter else { return Ok(None) };

    let mut setters = Vec::new();
    for method in compiler.directory.find_methods(class, &setter_name(name)).at(token)? {
        if method.info.ty.params.len() == 1
            && method.info.is_static() == is_static
            && compiler.can_access(&method.owner, method.info.access, token)?
        {
            setters.push(method);
        }
    }
    Ok(Some((getter, setters)))
}

impl ExprCompiler<'_> {
    /// Read the value of a place.
    pub(crate) fn read_place(&mut self, place: &Place<'_>) -> Result<WaterType> {
        let chain = self.emit_receivers(place)?;
        self.load_place(place);
        match chain {
            Some(chain) => self.close_null_chain(chain, Some(&place.ty)),
            None => Ok(place.ty.clone()),
        }
    }

    /// Push what the place needs to be loaded or stored. Returns the open
    /// null chain when the receiver was reached with `?.` or `?[`.
    pub(crate) fn emit_receivers(&mut self, place: &Place<'_>) -> Result<Option<NullChain>> {
        match &place.target {
            Target::Local(_) | Target::Field { object: None, .. } | Target::Accessors { object: None, .. } => Ok(None),
            Target::Field {
                object: Some(receiver), ..
            }
            | Target::Accessors {
                object: Some(receiver), ..
            }
            | Target::Length(receiver) => self.emit_receiver(receiver),
            Target::Element { array, index } => {
                let chain = self.emit_receiver(array)?;
                let ty = self.type_of(index)?;
                self.infer(index)?;
                self.code().cast_primitive(&ty, &WaterType::INT);
                Ok(chain)
            }
        }
    }

    fn emit_receiver(&mut self, receiver: &Receiver<'_>) -> Result<Option<NullChain>> {
        match receiver {
            Receiver::This => {
                self.code().load(Opcode::Aload, 0);
                Ok(None)
            }
            Receiver::Expr { expr, null_safe: false } => {
                self.infer(expr)?;
                Ok(None)
            }
            Receiver::Expr { expr, null_safe: true } => self.open_null_chain(expr).map(Some),
        }
    }

    /// Duplicate the receivers so the place can be loaded and then stored.
    pub(crate) fn dup_receivers(&mut self, place: &Place<'_>) {
        match place.receiver_slots() {
            0 => {}
            1 => self.code().emit(Opcode::Dup),
            _ => self.code().emit(Opcode::Dup2),
        }
    }

    /// Load with the receivers on the stack.
    pub(crate) fn load_place(&mut self, place: &Place<'_>) {
        match &place.target {
            Target::Local(slot) => self.code().load_local(&place.ty, *slot),
            Target::Field { object, owner, name } => {
                let op = if object.is_some() { Opcode::Getfield } else { Opcode::Getstatic };
                let descriptor = place.ty.descriptor();
                self.code().field(op, owner, name, &descriptor);
            }
            Target::Accessors { owner, getter, .. } => self.invoke_method(owner, getter, false),
            Target::Element { .. } => self.code().array_load(&place.ty),
            Target::Length(_) => self.code().emit(Opcode::Arraylength),
        }
    }

    /// Store the value on top of the stack, receivers beneath it.
    pub(crate) fn store_place(&mut self, place: &Place<'_>, setter: Option<&Member<MethodInfo>>) -> Result<()> {
        match &place.target {
            Target::Local(slot) => self.code().store_local(&place.ty, *slot),
            Target::Field { object, owner, name } => {
                let op = if object.is_some() { Opcode::Putfield } else { Opcode::Putstatic };
                let descriptor = place.ty.descriptor();
                self.code().field(op, owner, name, &descriptor);
            }
            Target::Accessors { owner, .. } => {
                let Some(setter) = setter else {
                    return Err(invalid_lvalue(&place.token));
                };
                self.invoke_method(owner, setter, false);
                let ret = setter.info.ty.ret.clone();
                self.code().pop_value(&ret);
            }
            Target::Element { .. } => self.code().array_store(&place.ty),
            Target::Length(_) => return Err(invalid_lvalue(&place.token)),
        }
        Ok(())
    }
}

pub(crate) fn invalid_lvalue(token: &Token<'_>) -> crate::error::CompileError {
    semantic_kind(SemanticErrorKind::InvalidAssignment, token, "Invalid lvalue - cannot assign")
}
