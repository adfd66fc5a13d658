//! Built-in description of the core JDK classes.
//!
//! Programs can call into `java.lang` without a class path. Only the
//! members commonly used from Water are listed. A class path entry that
//! provides the same class (a `java.base.jmod`, say) takes precedence.

use water_classfile::AccessFlags;

use crate::directory::{ClassInfo, FieldInfo, MethodInfo};
use crate::types::{MethodType, WaterType, OBJECT};

/// Which parts of a signature accept or produce `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nulls {
    None,
    Args,
    Ret,
}

struct ClassTable {
    info: ClassInfo,
}

fn class(name: &str, superclass: &str) -> ClassTable {
    ClassTable {
        info: ClassInfo::shell(name, AccessFlags::PUBLIC | AccessFlags::SUPER, Some(superclass.into())),
    }
}

fn interface(name: &str) -> ClassTable {
    ClassTable {
        info: ClassInfo::shell(
            name,
            AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT,
            None,
        ),
    }
}

impl ClassTable {
    fn flags(mut self, flags: AccessFlags) -> Self {
        self.info.access |= flags;
        self
    }

    fn implements(mut self, interfaces: &[&str]) -> Self {
        self.info.interfaces.extend(interfaces.iter().map(|s| s.to_string()));
        self
    }

    fn member(mut self, access: AccessFlags, name: &str, descriptor: &str, nulls: Nulls) -> Self {
        let Some(mut ty) = MethodType::from_descriptor(descriptor, None, &[]) else {
            return self;
        };
        match nulls {
            Nulls::Args => {
                ty.params = ty.params.into_iter().map(|p| p.with_nullable(true)).collect();
            }
            Nulls::Ret => ty.ret = ty.ret.with_nullable(true),
            Nulls::None => {}
        }
        self.info.add_method(MethodInfo {
            name: name.to_string(),
            access,
            ty,
        });
        self
    }

    fn ctor(self, descriptor: &str) -> Self {
        self.member(AccessFlags::PUBLIC, "<init>", descriptor, Nulls::None)
    }

    fn method(self, name: &str, descriptor: &str) -> Self {
        self.member(AccessFlags::PUBLIC, name, descriptor, Nulls::None)
    }

    /// A method whose reference parameters accept `null`.
    fn method_nullable_args(self, name: &str, descriptor: &str) -> Self {
        self.member(AccessFlags::PUBLIC, name, descriptor, Nulls::Args)
    }

    /// A method that may return `null`.
    fn method_nullable_ret(self, name: &str, descriptor: &str) -> Self {
        self.member(AccessFlags::PUBLIC, name, descriptor, Nulls::Ret)
    }

    fn static_method(self, name: &str, descriptor: &str) -> Self {
        self.member(AccessFlags::PUBLIC | AccessFlags::STATIC, name, descriptor, Nulls::None)
    }

    fn static_field(mut self, name: &str, descriptor: &str) -> Self {
        if let Some(ty) = WaterType::from_descriptor(descriptor) {
            self.info.fields.push(FieldInfo {
                name: name.to_string(),
                access: AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL,
                ty,
            });
        }
        self
    }

    fn build(self) -> ClassInfo {
        self.info
    }
}

fn wrapper(name: &str, superclass: &str, prim: &str, value_method: &str) -> ClassTable {
    let boxed = format!("L{};", name);
    class(name, superclass)
        .flags(AccessFlags::FINAL)
        .implements(&["java/lang/Comparable"])
        .ctor(&format!("({})V", prim))
        .static_method("valueOf", &format!("({}){}", prim, boxed))
        .static_method("toString", &format!("({})Ljava/lang/String;", prim))
        .method(value_method, &format!("(){}", prim))
        .method_nullable_args("equals", "(Ljava/lang/Object;)Z")
        .method("hashCode", "()I")
        .method("toString", "()Ljava/lang/String;")
        .method("compareTo", &format!("({})I", boxed))
}

fn number_wrapper(name: &str, prim: &str, value_method: &str, parse: &str) -> ClassTable {
    wrapper(name, "java/lang/Number", prim, value_method)
        .static_method(parse, &format!("(Ljava/lang/String;){}", prim))
        .static_field("MAX_VALUE", prim)
        .static_field("MIN_VALUE", prim)
}

fn exception(name: &str, superclass: &str) -> ClassInfo {
    class(name, superclass)
        .ctor("()V")
        .member(AccessFlags::PUBLIC, "<init>", "(Ljava/lang/String;)V", Nulls::Args)
        .build()
}

/// The built-in class table.
pub fn jdk_classes() -> Vec<ClassInfo> {
    let print_stream = ["Z", "C", "I", "J", "F", "D"]
        .iter()
        .fold(class("java/io/PrintStream", OBJECT), |table, prim| {
            let desc = format!("({})V", prim);
            table.method("println", &desc).method("print", &desc)
        })
        .method("println", "()V")
        .method_nullable_args("println", "(Ljava/lang/String;)V")
        .method_nullable_args("println", "(Ljava/lang/Object;)V")
        .method_nullable_args("print", "(Ljava/lang/String;)V")
        .method_nullable_args("print", "(Ljava/lang/Object;)V")
        .method("flush", "()V");

    let string_builder = ["Z", "C", "I", "J", "F", "D"]
        .iter()
        .fold(
            class("java/lang/StringBuilder", OBJECT)
                .flags(AccessFlags::FINAL)
                .implements(&["java/lang/CharSequence"]),
            |table, prim| table.method("append", &format!("({})Ljava/lang/StringBuilder;", prim)),
        )
        .ctor("()V")
        .ctor("(Ljava/lang/String;)V")
        .method_nullable_args("append", "(Ljava/lang/String;)Ljava/lang/StringBuilder;")
        .method_nullable_args("append", "(Ljava/lang/Object;)Ljava/lang/StringBuilder;")
        .method("reverse", "()Ljava/lang/StringBuilder;")
        .method("length", "()I")
        .method("charAt", "(I)C")
        .method("toString", "()Ljava/lang/String;");

    let string = ["Z", "C", "I", "J", "F", "D"]
        .iter()
        .fold(
            class("java/lang/String", OBJECT)
                .flags(AccessFlags::FINAL)
                .implements(&["java/lang/CharSequence", "java/lang/Comparable"]),
            |table, prim| table.static_method("valueOf", &format!("({})Ljava/lang/String;", prim)),
        )
        .ctor("()V")
        .ctor("(Ljava/lang/String;)V")
        .ctor("([C)V")
        .member(
            AccessFlags::PUBLIC | AccessFlags::STATIC,
            "valueOf",
            "(Ljava/lang/Object;)Ljava/lang/String;",
            Nulls::Args,
        )
        .method("length", "()I")
        .method("isEmpty", "()Z")
        .method("charAt", "(I)C")
        .method("substring", "(I)Ljava/lang/String;")
        .method("substring", "(II)Ljava/lang/String;")
        .method("indexOf", "(Ljava/lang/String;)I")
        .method("indexOf", "(I)I")
        .method("contains", "(Ljava/lang/CharSequence;)Z")
        .method("startsWith", "(Ljava/lang/String;)Z")
        .method("endsWith", "(Ljava/lang/String;)Z")
        .method("toUpperCase", "()Ljava/lang/String;")
        .method("toLowerCase", "()Ljava/lang/String;")
        .method("trim", "()Ljava/lang/String;")
        .method("concat", "(Ljava/lang/String;)Ljava/lang/String;")
        .method("repeat", "(I)Ljava/lang/String;")
        .method("replace", "(Ljava/lang/CharSequence;Ljava/lang/CharSequence;)Ljava/lang/String;")
        .method("split", "(Ljava/lang/String;)[Ljava/lang/String;")
        .method("toCharArray", "()[C")
        .method("compareTo", "(Ljava/lang/String;)I")
        .method_nullable_args("equals", "(Ljava/lang/Object;)Z")
        .method_nullable_args("equalsIgnoreCase", "(Ljava/lang/String;)Z")
        .method("hashCode", "()I")
        .method("toString", "()Ljava/lang/String;");

    let math = ["I", "J", "F", "D"]
        .iter()
        .fold(class("java/lang/Math", OBJECT).flags(AccessFlags::FINAL), |table, prim| {
            table
                .static_method("abs", &format!("({p}){p}", p = prim))
                .static_method("max", &format!("({p}{p}){p}", p = prim))
                .static_method("min", &format!("({p}{p}){p}", p = prim))
        })
        .static_method("sqrt", "(D)D")
        .static_method("cbrt", "(D)D")
        .static_method("pow", "(DD)D")
        .static_method("floor", "(D)D")
        .static_method("ceil", "(D)D")
        .static_method("round", "(D)J")
        .static_method("sin", "(D)D")
        .static_method("cos", "(D)D")
        .static_method("tan", "(D)D")
        .static_method("log", "(D)D")
        .static_method("exp", "(D)D")
        .static_method("random", "()D")
        .static_field("PI", "D")
        .static_field("E", "D");

    vec![
        class(OBJECT, OBJECT)
            .ctor("()V")
            .method_nullable_args("equals", "(Ljava/lang/Object;)Z")
            .method("hashCode", "()I")
            .method("toString", "()Ljava/lang/String;")
            .method("getClass", "()Ljava/lang/Class;")
            .build()
            .without_superclass(),
        string.build(),
        string_builder.build(),
        print_stream.build(),
        math.build(),
        class("java/lang/System", OBJECT)
            .flags(AccessFlags::FINAL)
            .static_field("out", "Ljava/io/PrintStream;")
            .static_field("err", "Ljava/io/PrintStream;")
            .static_method("currentTimeMillis", "()J")
            .static_method("nanoTime", "()J")
            .static_method("exit", "(I)V")
            .member(
                AccessFlags::PUBLIC | AccessFlags::STATIC,
                "getProperty",
                "(Ljava/lang/String;)Ljava/lang/String;",
                Nulls::Ret,
            )
            .build(),
        class("java/lang/Number", OBJECT)
            .flags(AccessFlags::ABSTRACT)
            .ctor("()V")
            .method("intValue", "()I")
            .method("longValue", "()J")
            .method("floatValue", "()F")
            .method("doubleValue", "()D")
            .method("byteValue", "()B")
            .method("shortValue", "()S")
            .build(),
        number_wrapper("java/lang/Integer", "I", "intValue", "parseInt").build(),
        number_wrapper("java/lang/Long", "J", "longValue", "parseLong").build(),
        number_wrapper("java/lang/Float", "F", "floatValue", "parseFloat").build(),
        number_wrapper("java/lang/Double", "D", "doubleValue", "parseDouble").build(),
        number_wrapper("java/lang/Short", "S", "shortValue", "parseShort").build(),
        number_wrapper("java/lang/Byte", "B", "byteValue", "parseByte").build(),
        wrapper("java/lang/Boolean", OBJECT, "Z", "booleanValue")
            .static_method("parseBoolean", "(Ljava/lang/String;)Z")
            .static_field("TRUE", "Ljava/lang/Boolean;")
            .static_field("FALSE", "Ljava/lang/Boolean;")
            .build(),
        wrapper("java/lang/Character", OBJECT, "C", "charValue")
            .static_method("isDigit", "(C)Z")
            .static_method("isLetter", "(C)Z")
            .static_method("isWhitespace", "(C)Z")
            .static_method("toUpperCase", "(C)C")
            .static_method("toLowerCase", "(C)C")
            .build(),
        class("java/lang/Throwable", OBJECT)
            .ctor("()V")
            .member(AccessFlags::PUBLIC, "<init>", "(Ljava/lang/String;)V", Nulls::Args)
            .method_nullable_ret("getMessage", "()Ljava/lang/String;")
            .method("printStackTrace", "()V")
            .method("toString", "()Ljava/lang/String;")
            .build(),
        exception("java/lang/Exception", "java/lang/Throwable"),
        exception("java/lang/RuntimeException", "java/lang/Exception"),
        exception("java/lang/NullPointerException", "java/lang/RuntimeException"),
        exception("java/lang/IllegalArgumentException", "java/lang/RuntimeException"),
        exception("java/lang/IllegalStateException", "java/lang/RuntimeException"),
        exception("java/lang/ArithmeticException", "java/lang/RuntimeException"),
        exception("java/lang/UnsupportedOperationException", "java/lang/RuntimeException"),
        exception("java/lang/IndexOutOfBoundsException", "java/lang/RuntimeException"),
        exception("java/lang/Error", "java/lang/Throwable"),
        class("java/lang/Enum", OBJECT)
            .flags(AccessFlags::ABSTRACT)
            .implements(&["java/lang/Comparable"])
            .member(AccessFlags::PROTECTED, "<init>", "(Ljava/lang/String;I)V", Nulls::None)
            .method("name", "()Ljava/lang/String;")
            .method("ordinal", "()I")
            .method("toString", "()Ljava/lang/String;")
            .static_method("valueOf", "(Ljava/lang/Class;Ljava/lang/String;)Ljava/lang/Enum;")
            .build(),
        class("java/lang/Class", OBJECT)
            .flags(AccessFlags::FINAL)
            .method("getName", "()Ljava/lang/String;")
            .method("getSimpleName", "()Ljava/lang/String;")
            .build(),
        interface("java/lang/Comparable")
            .member(
                AccessFlags::PUBLIC | AccessFlags::ABSTRACT,
                "compareTo",
                "(Ljava/lang/Object;)I",
                Nulls::None,
            )
            .build(),
        interface("java/lang/CharSequence")
            .member(AccessFlags::PUBLIC | AccessFlags::ABSTRACT, "length", "()I", Nulls::None)
            .member(AccessFlags::PUBLIC | AccessFlags::ABSTRACT, "charAt", "(I)C", Nulls::None)
            .build(),
        interface("java/lang/Iterable").build(),
        interface("java/lang/Cloneable").build(),
        interface("java/io/Serializable").build(),
    ]
}

impl ClassInfo {
    fn without_superclass(mut self) -> Self {
        self.superclass = None;
        self
    }
}
