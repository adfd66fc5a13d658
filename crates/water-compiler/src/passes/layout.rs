//! Class layout shared by the skeleton and compilation passes.
//!
//! Both passes must produce members with identical names, flags and
//! descriptors; everything that decides the shape of a class lives here
//! so the two passes cannot drift apart.

use water_classfile::{AccessFlags, ClassBuilder, CodeBuilder, FieldDef, MethodDef, Opcode};
use water_parser::ast::{Access, EnumDecl, Ident, Modifiers, Param, TypeExpr};
use water_parser::Token;

use crate::context::CompilationContext;
use crate::directory::TypeDirectory;
use crate::error::{semantic, ResolveExt, Result};
use crate::scope::{getter_name, setter_name};
use crate::types::{MethodType, TypedCode, WaterType, THROWABLE};

/// Superclass of every enum.
pub(crate) const ENUM: &str = "java/lang/Enum";
const MAIN_ARGS: &str = "([Ljava/lang/String;)V";

/// Internal name of a class declared inside `outer` (the container or an
/// enclosing class). Private classes are nested as `Outer$Name`.
pub(crate) fn class_name(package: &str, outer: &str, name: &str, modifiers: &Modifiers<'_>) -> String {
    if modifiers.is_private() {
        format!("{}${}", outer, name)
    } else {
        format!("{}{}", package, name)
    }
}

pub(crate) fn class_access(modifiers: &Modifiers<'_>) -> AccessFlags {
    if modifiers.is_private() {
        AccessFlags::SUPER
    } else {
        AccessFlags::PUBLIC | AccessFlags::SUPER
    }
}

pub(crate) fn enum_access(modifiers: &Modifiers<'_>) -> AccessFlags {
    class_access(modifiers) | AccessFlags::FINAL | AccessFlags::ENUM
}

/// Flags of a function or constructor.
pub(crate) fn member_access(modifiers: &Modifiers<'_>) -> AccessFlags {
    match modifiers.access {
        Some(Access::Private) => AccessFlags::PRIVATE,
        Some(Access::Public) | None => AccessFlags::PUBLIC,
    }
}

/// Flags of a function: top-level functions are `static final`.
pub(crate) fn function_access(modifiers: &Modifiers<'_>, is_global: bool) -> AccessFlags {
    let mut access = member_access(modifiers);
    if is_global {
        access |= AccessFlags::STATIC | AccessFlags::FINAL;
    } else if modifiers.is_static() {
        access |= AccessFlags::STATIC;
    }
    access
}

/// Resolve parameter types.
pub(crate) fn param_types(
    ctx: &CompilationContext,
    directory: &dyn TypeDirectory,
    params: &[Param<'_>],
) -> Result<Vec<WaterType>> {
    let mut types = Vec::with_capacity(params.len());
    for param in params {
        let ty = ctx.resolve_type(&param.ty, directory)?;
        if ty.is_void() {
            return Err(semantic(
                &param.name.token(),
                format!("Cannot declare parameter '{}' of type void", param.name.name),
            ));
        }
        types.push(ty);
    }
    Ok(types)
}

/// Pair parameter names with their types.
pub(crate) fn named_params<'ast>(params: &[Param<'ast>], types: &[WaterType]) -> Vec<(Ident<'ast>, WaterType)> {
    params.iter().map(|p| p.name).zip(types.iter().cloned()).collect()
}

/// Internal names of a `throws` list.
pub(crate) fn exceptions(
    ctx: &CompilationContext,
    directory: &dyn TypeDirectory,
    token: &Token<'_>,
    throws: &[TypeExpr<'_>],
) -> Result<Vec<String>> {
    let throwable = WaterType::object(THROWABLE);
    let mut names = Vec::with_capacity(throws.len());
    for ty in throws {
        let ty = ctx.resolve_type(ty, directory)?;
        if ty.is_primitive() {
            return Err(semantic(token, format!("Cannot throw primitive type (got '{}').", ty)));
        }
        let is_throwable = throwable.is_assignable_from(&ty.as_non_nullable(), directory).at(token)?;
        match ty.class_name() {
            Some(class) if is_throwable => names.push(class.to_string()),
            _ => {
                return Err(semantic(
                    token,
                    format!("throw target must be an extension of java.lang.Throwable ('{}' cannot be cast).", ty),
                ))
            }
        }
    }
    Ok(names)
}

/// A method definition carrying the Nullable metadata of its signature.
pub(crate) fn method(
    access: AccessFlags,
    name: &str,
    ty: &MethodType,
    code: CodeBuilder,
    exceptions: Vec<String>,
) -> MethodDef {
    let mut def = MethodDef::new(access, name, ty.descriptor(), code);
    def.exceptions = exceptions;
    def.nullable = ty.ret.annotation();
    let parameters: Vec<_> = ty.params.iter().map(WaterType::annotation).collect();
    if parameters.iter().any(Option::is_some) {
        def.parameters = parameters;
    }
    def
}

/// A placeholder body that returns a dummy value of `ret`.
pub(crate) fn stub_code(ret: &WaterType, arg_slots: u16) -> CodeBuilder {
    let mut code = CodeBuilder::new(arg_slots);
    if !ret.is_void() {
        code.push_dummy(ret);
    }
    code.return_value(ret);
    code
}

/// Local slots taken by the receiver and the parameters.
pub(crate) fn arg_slots(ty: &MethodType, is_static: bool) -> u16 {
    ty.param_slots() + u16::from(!is_static)
}

/// The private field backing a variable.
pub(crate) fn field(name: &str, ty: &WaterType, is_static: bool, is_const: bool) -> FieldDef {
    let mut access = AccessFlags::PRIVATE;
    if is_static {
        access |= AccessFlags::STATIC;
    }
    if is_const {
        access |= AccessFlags::FINAL;
    }
    let mut def = FieldDef::new(access, name, ty.descriptor());
    def.nullable = ty.annotation();
    def
}

/// Public getter and (unless `is_const`) setter of a field. Accessors of
/// top-level variables are `final`.
pub(crate) fn accessors(
    owner: &str,
    name: &str,
    ty: &WaterType,
    is_static: bool,
    is_const: bool,
    is_global: bool,
) -> Vec<MethodDef> {
    let mut access = AccessFlags::PUBLIC;
    if is_static {
        access |= AccessFlags::STATIC;
    }
    if is_global {
        access |= AccessFlags::FINAL;
    }
    let descriptor = ty.descriptor();
    let receiver = u16::from(!is_static);
    let (get, put) = if is_static {
        (Opcode::Getstatic, Opcode::Putstatic)
    } else {
        (Opcode::Getfield, Opcode::Putfield)
    };

    let mut getter = CodeBuilder::new(receiver);
    if !is_static {
        getter.load(Opcode::Aload, 0);
    }
    getter.field(get, owner, name, &descriptor);
    getter.return_value(ty);
    let getter_ty = MethodType::new(Vec::new(), ty.clone());
    let mut methods = vec![method(access, &getter_name(name), &getter_ty, getter, Vec::new())];

    if !is_const {
        let mut setter = CodeBuilder::new(receiver + ty.size());
        if !is_static {
            setter.load(Opcode::Aload, 0);
        }
        setter.load_local(ty, receiver);
        setter.field(put, owner, name, &descriptor);
        setter.return_value(&WaterType::VOID);
        let setter_ty = MethodType::new(vec![ty.clone()], WaterType::VOID);
        methods.push(method(access, &setter_name(name), &setter_ty, setter, Vec::new()));
    }
    methods
}

/// Add `main(String[])` forwarding to a `public static main()`, unless
/// the class declares one itself.
pub(crate) fn add_main_bridge(class: &mut ClassBuilder) {
    if class.has_method("main", MAIN_ARGS) {
        return;
    }
    let entry = class.methods().iter().find(|m| {
        m.name == "main" && m.descriptor == "()V" && m.access.is_public() && m.access.is_static()
    });
    if let Some(entry) = entry {
        let exceptions = entry.exceptions.clone();
        let name = class.name().to_string();
        class.add_method(main_bridge(&name, exceptions));
    }
}

/// `public static main(String[])` forwarding to `main()`.
fn main_bridge(class: &str, exceptions: Vec<String>) -> MethodDef {
    let mut code = CodeBuilder::new(1);
    code.invoke(Opcode::Invokestatic, class, "main", "()V", false);
    code.emit(Opcode::Return);
    let mut def = MethodDef::new(
        AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::SYNTHETIC,
        "main",
        MAIN_ARGS,
        code,
    );
    def.exceptions = exceptions;
    def
}

/// The complete class of an enum declaration.
///
/// ```text
/// final class Color extends Enum<Color> {
///     public static final Color RED, GREEN;
///     private static final Color[] $VALUES;
///     private Color(String name, int ordinal)
///     public static Color[] values()
///     public static Color valueOf(String name)
/// }
/// ```
pub(crate) fn enum_class(name: &str, decl: &EnumDecl<'_>, source_file: &str) -> ClassBuilder {
    let ty = WaterType::object(name);
    let descriptor = ty.descriptor();
    let array = WaterType::array_of(ty.clone()).descriptor();

    let mut class = ClassBuilder::new(enum_access(&decl.modifiers), name, ENUM);
    class.set_source_file(source_file);
    class.set_signature(format!("L{}<{}>;", ENUM, descriptor));

    for constant in decl.constants {
        class.add_field(FieldDef::new(
            AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL | AccessFlags::ENUM,
            constant.name,
            &descriptor,
        ));
    }
    class.add_field(FieldDef::new(
        AccessFlags::PRIVATE | AccessFlags::STATIC | AccessFlags::FINAL | AccessFlags::SYNTHETIC,
        "$VALUES",
        &array,
    ));

    let line = u16::try_from(decl.span.line).unwrap_or(u16::MAX);

    let mut clinit = CodeBuilder::new(0);
    clinit.line(line);
    for (ordinal, constant) in decl.constants.iter().enumerate() {
        let ordinal = i32::try_from(ordinal).unwrap_or(i32::MAX);
        clinit.type_insn(Opcode::New, name);
        clinit.emit(Opcode::Dup);
        clinit.push_string(constant.name);
        clinit.push_int(ordinal);
        clinit.invoke(Opcode::Invokespecial, name, "<init>", "(Ljava/lang/String;I)V", false);
        clinit.field(Opcode::Putstatic, name, constant.name, &descriptor);
    }
    clinit.push_int(i32::try_from(decl.constants.len()).unwrap_or(i32::MAX));
    clinit.type_insn(Opcode::Anewarray, name);
    for (index, constant) in decl.constants.iter().enumerate() {
        clinit.emit(Opcode::Dup);
        clinit.push_int(i32::try_from(index).unwrap_or(i32::MAX));
        clinit.field(Opcode::Getstatic, name, constant.name, &descriptor);
        clinit.emit(Opcode::Aastore);
    }
    clinit.field(Opcode::Putstatic, name, "$VALUES", &array);
    clinit.emit(Opcode::Return);
    class.add_method(MethodDef::new(AccessFlags::STATIC, "<clinit>", "()V", clinit));

    let mut init = CodeBuilder::new(3);
    init.line(line);
    init.load(Opcode::Aload, 0);
    init.load(Opcode::Aload, 1);
    init.load(Opcode::Iload, 2);
    init.invoke(Opcode::Invokespecial, ENUM, "<init>", "(Ljava/lang/String;I)V", false);
    init.emit(Opcode::Return);
    class.add_method(MethodDef::new(AccessFlags::PRIVATE, "<init>", "(Ljava/lang/String;I)V", init));

    let mut values = CodeBuilder::new(0);
    values.line(line);
    values.field(Opcode::Getstatic, name, "$VALUES", &array);
    values.invoke(Opcode::Invokevirtual, &array, "clone", "()Ljava/lang/Object;", false);
    values.type_insn(Opcode::Checkcast, &array);
    values.emit(Opcode::Areturn);
    class.add_method(MethodDef::new(
        AccessFlags::PUBLIC | AccessFlags::STATIC,
        "values",
        format!("(){}", array),
        values,
    ));

    let mut value_of = CodeBuilder::new(1);
    value_of.line(line);
    value_of.push_class(name);
    value_of.load(Opcode::Aload, 0);
    value_of.invoke(
        Opcode::Invokestatic,
        ENUM,
        "valueOf",
        "(Ljava/lang/Class;Ljava/lang/String;)Ljava/lang/Enum;",
        false,
    );
    value_of.type_insn(Opcode::Checkcast, name);
    value_of.emit(Opcode::Areturn);
    class.add_method(MethodDef::new(
        AccessFlags::PUBLIC | AccessFlags::STATIC,
        "valueOf",
        format!("(Ljava/lang/String;){}", descriptor),
        value_of,
    ));
    class
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use water_classfile::ClassFile;
    use water_parser::ast::Decl;
    use water_parser::Parser;

    #[test]
    fn private_classes_are_nested() {
        let arena = Bump::new();
        let program = Parser::parse("private class Hidden { } class Shown { }", &arena).unwrap();
        let (Decl::Class(hidden), Decl::Class(shown)) = (program.decls[0], program.decls[1]) else {
            panic!("expected classes")
        };
        assert_eq!(class_name("demo/", "demo/mainWtr", "Hidden", &hidden.modifiers), "demo/mainWtr$Hidden");
        assert_eq!(class_name("demo/", "demo/mainWtr", "Shown", &shown.modifiers), "demo/Shown");
        assert_eq!(class_access(&hidden.modifiers), AccessFlags::SUPER);
    }

    #[test]
    fn accessor_names_and_flags() {
        let methods = accessors("demo/mainWtr", "isReady", &WaterType::BOOLEAN, true, false, true);
        let names: Vec<_> = methods.iter().map(|m| (m.name.as_str(), m.descriptor.as_str())).collect();
        assert_eq!(names, [("isReady", "()Z"), ("setReady", "(Z)V")]);
        assert!(methods[0].access.contains(AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL));

        let methods = accessors("demo/Player", "name", &WaterType::string().as_nullable(), false, true, false);
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "getName");
        assert!(methods[0].nullable.is_some());
        assert!(!methods[0].access.is_static());
    }

    #[test]
    fn fields_are_private() {
        let def = field("count", &WaterType::INT, false, true);
        assert_eq!(def.access, AccessFlags::PRIVATE | AccessFlags::FINAL);
        assert!(def.nullable.is_none());
    }

    #[test]
    fn main_bridge_needs_a_public_static_entry() {
        let mut class = ClassBuilder::new(AccessFlags::PUBLIC, "mainWtr", "java/lang/Object");
        let ty = MethodType::new(Vec::new(), WaterType::VOID);
        class.add_method(method(AccessFlags::PRIVATE | AccessFlags::STATIC, "main", &ty, stub_code(&ty.ret, 0), Vec::new()));
        add_main_bridge(&mut class);
        assert!(!class.has_method("main", MAIN_ARGS));

        let mut class = ClassBuilder::new(AccessFlags::PUBLIC, "mainWtr", "java/lang/Object");
        let entry = method(AccessFlags::PUBLIC | AccessFlags::STATIC, "main", &ty, stub_code(&ty.ret, 0), vec!["java/lang/Exception".into()]);
        class.add_method(entry);
        add_main_bridge(&mut class);
        let bridge = class.methods().iter().find(|m| m.descriptor == MAIN_ARGS).unwrap();
        assert_eq!(bridge.exceptions, ["java/lang/Exception"]);
        assert!(bridge.access.contains(AccessFlags::SYNTHETIC));
    }

    #[test]
    fn enum_classes_round_trip() {
        let arena = Bump::new();
        let program = Parser::parse("enum Color { RED, GREEN }", &arena).unwrap();
        let Decl::Enum(decl) = program.decls[0] else { panic!("expected an enum") };
        let class = enum_class("demo/Color", decl, "main.wtr");
        let bytes = class.finish().unwrap();
        let parsed = ClassFile::parse(&bytes).unwrap();
        assert_eq!(parsed.super_name.as_deref(), Some(ENUM));
        assert!(parsed.access.contains(AccessFlags::ENUM | AccessFlags::FINAL));
        let fields: Vec<_> = parsed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, ["RED", "GREEN", "$VALUES"]);
        let methods: Vec<_> = parsed.methods.iter().map(|m| (m.name.as_str(), m.descriptor.as_str())).collect();
        assert!(methods.contains(&("values", "()[Ldemo/Color;")));
        assert!(methods.contains(&("valueOf", "(Ljava/lang/String;)Ldemo/Color;")));
    }
}
