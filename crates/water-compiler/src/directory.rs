//! Type directory: structural queries about classes.
//!
//! The compiler never loads classes. Everything it needs to know about a
//! class, whether it is being compiled right now, sits on the class path
//! or belongs to the core JDK, is answered by a [`TypeDirectory`].
//!
//! [`ClassDirectory`] layers three sources, first match wins:
//! 1. classes declared in the current run, refreshed after every pass
//! 2. the user class path, parsed lazily and cached
//! 3. the built-in JDK table in [`crate::builtins`]

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use water_classfile::{AccessFlags, ClassBuilder, ClassFile, Classpath};

use crate::error::UnresolvedClass;
use crate::types::{MethodType, WaterType, OBJECT};

/// A field as the compiler sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub access: AccessFlags,
    pub ty: WaterType,
}

/// A method or constructor as the compiler sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub name: String,
    pub access: AccessFlags,
    pub ty: MethodType,
}

impl MethodInfo {
    pub fn descriptor(&self) -> String {
        self.ty.descriptor()
    }

    pub fn is_static(&self) -> bool {
        self.access.is_static()
    }
}

/// The shape of one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub name: String,
    pub access: AccessFlags,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub constructors: Vec<MethodInfo>,
}

impl ClassInfo {
    /// A class with no members yet.
    pub fn shell(name: impl Into<String>, access: AccessFlags, superclass: Option<String>) -> Self {
        Self {
            name: name.into(),
            access,
            superclass,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn from_class_file(class: &ClassFile) -> Self {
        let mut info = Self::shell(class.name.clone(), class.access, class.super_name.clone());
        info.interfaces = class.interfaces.clone();
        for field in &class.fields {
            let Some(ty) = WaterType::from_descriptor(&field.descriptor) else { continue };
            info.fields.push(FieldInfo {
                name: field.name.clone(),
                access: field.access,
                ty: ty.with_annotation(field.nullable.as_ref()),
            });
        }
        for method in &class.methods {
            if method.access.intersects(AccessFlags::SYNTHETIC | AccessFlags::BRIDGE) {
                continue;
            }
            let Some(ty) =
                MethodType::from_descriptor(&method.descriptor, method.nullable.as_ref(), &method.parameters)
            else {
                continue;
            };
            info.add_method(MethodInfo {
                name: method.name.clone(),
                access: method.access,
                ty,
            });
        }
        info
    }

    /// Describe a class that is still being built.
    pub fn from_builder(class: &ClassBuilder) -> Self {
        let mut info = Self::shell(class.name(), class.access(), Some(class.super_name().to_string()));
        for field in class.fields() {
            let Some(ty) = WaterType::from_descriptor(&field.descriptor) else { continue };
            info.fields.push(FieldInfo {
                name: field.name.clone(),
                access: field.access,
                ty: ty.with_annotation(field.nullable.as_ref()),
            });
        }
        for method in class.methods() {
            if method.access.contains(AccessFlags::SYNTHETIC) {
                continue;
            }
            let Some(ty) =
                MethodType::from_descriptor(&method.descriptor, method.nullable.as_ref(), &method.parameters)
            else {
                continue;
            };
            info.add_method(MethodInfo {
                name: method.name.clone(),
                access: method.access,
                ty,
            });
        }
        info
    }

    /// File a method under constructors or methods; static initialisers
    /// are dropped.
    pub fn add_method(&mut self, method: MethodInfo) {
        match method.name.as_str() {
            "<init>" => self.constructors.push(method),
            "<clinit>" => {}
            _ => self.methods.push(method),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_interface(&self) -> bool {
        self.access.is_interface()
    }

    pub fn is_abstract(&self) -> bool {
        self.access.contains(AccessFlags::ABSTRACT)
    }
}

/// A field or method together with the class that declares it.
#[derive(Debug, Clone, PartialEq)]
pub struct Member<T> {
    pub owner: String,
    pub info: T,
}

/// Oracle answering structural questions about classes.
pub trait TypeDirectory {
    fn class(&self, name: &str) -> Option<Rc<ClassInfo>>;

    fn require(&self, name: &str) -> Result<Rc<ClassInfo>, UnresolvedClass> {
        self.class(name).ok_or_else(|| UnresolvedClass(name.to_string()))
    }

    /// Whether `sub` is `sup` or inherits from it through superclasses or
    /// interfaces.
    fn is_subclass(&self, sub: &str, sup: &str) -> Result<bool, UnresolvedClass> {
        let mut pending = vec![sub.to_string()];
        let mut seen = FxHashSet::default();
        while let Some(name) = pending.pop() {
            if name == sup {
                return Ok(true);
            }
            if !seen.insert(name.clone()) {
                continue;
            }
            let info = self.require(&name)?;
            if sup == OBJECT {
                return Ok(true);
            }
            pending.extend(info.superclass.iter().cloned());
            pending.extend(info.interfaces.iter().cloned());
        }
        Ok(false)
    }

    /// Find a field by walking up the superclass chain.
    fn find_field(&self, class: &str, name: &str) -> Result<Option<Member<FieldInfo>>, UnresolvedClass> {
        let mut current = Some(class.to_string());
        while let Some(class_name) = current {
            let info = self.require(&class_name)?;
            if let Some(field) = info.field(name) {
                return Ok(Some(Member {
                    owner: info.name.clone(),
                    info: field.clone(),
                }));
            }
            current = info.superclass.clone();
        }
        Ok(None)
    }

    /// Every method called `name` visible on `class`, nearest declaration
    /// first. Overridden methods appear once.
    fn find_methods(&self, class: &str, name: &str) -> Result<Vec<Member<MethodInfo>>, UnresolvedClass> {
        let mut found: Vec<Member<MethodInfo>> = Vec::new();
        let mut descriptors = FxHashSet::default();
        let mut pending = std::collections::VecDeque::from([class.to_string()]);
        let mut seen = FxHashSet::default();
        while let Some(class_name) = pending.pop_front() {
            if !seen.insert(class_name.clone()) {
                continue;
            }
            let info = self.require(&class_name)?;
            for method in info.methods.iter().filter(|m| m.name == name) {
                if descriptors.insert(method.descriptor()) {
                    found.push(Member {
                        owner: info.name.clone(),
                        info: method.clone(),
                    });
                }
            }
            pending.extend(info.superclass.iter().cloned());
            pending.extend(info.interfaces.iter().cloned());
            if info.is_interface() && info.superclass.is_none() {
                pending.push_back(OBJECT.to_string());
            }
        }
        Ok(found)
    }
}

/// The directory used by the compiler pipeline.
#[derive(Debug)]
pub struct ClassDirectory {
    declared: FxHashMap<String, Rc<ClassInfo>>,
    classpath: Classpath,
    loaded: RefCell<FxHashMap<String, Option<Rc<ClassInfo>>>>,
    builtins: FxHashMap<String, Rc<ClassInfo>>,
}

impl Default for ClassDirectory {
    fn default() -> Self {
        Self::new(Classpath::new())
    }
}

impl ClassDirectory {
    pub fn new(classpath: Classpath) -> Self {
        let builtins = crate::builtins::jdk_classes()
            .into_iter()
            .map(|class| (class.name.clone(), Rc::new(class)))
            .collect();
        Self {
            declared: FxHashMap::default(),
            classpath,
            loaded: RefCell::new(FxHashMap::default()),
            builtins,
        }
    }

    /// Register or replace a class compiled in this run.
    pub fn declare(&mut self, class: ClassInfo) {
        tracing::trace!(
            class = %class.name,
            fields = class.fields.len(),
            methods = class.methods.len(),
            "declared class"
        );
        self.declared.insert(class.name.clone(), Rc::new(class));
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains_key(name)
    }

    fn load(&self, name: &str) -> Option<Rc<ClassInfo>> {
        if let Some(cached) = self.loaded.borrow().get(name) {
            return cached.clone();
        }
        let info = match self.classpath.load(name) {
            Ok(class) => class.map(|c| Rc::new(ClassInfo::from_class_file(&c))),
            Err(err) => {
                tracing::warn!(class = name, error = %err, "failed to read class from class path");
                None
            }
        };
        self.loaded.borrow_mut().insert(name.to_string(), info.clone());
        info
    }
}

impl TypeDirectory for ClassDirectory {
    fn class(&self, name: &str) -> Option<Rc<ClassInfo>> {
        if let Some(class) = self.declared.get(name) {
            return Some(class.clone());
        }
        if let Some(class) = self.load(name) {
            return Some(class);
        }
        self.builtins.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use water_classfile::{CodeBuilder, FieldDef, MethodDef, Nullable, Opcode};

    #[test]
    fn builtins_answer_subtyping() {
        let dir = ClassDirectory::default();
        assert!(dir.is_subclass("java/lang/String", OBJECT).unwrap());
        assert!(dir.is_subclass("java/lang/String", "java/lang/CharSequence").unwrap());
        assert!(dir.is_subclass("java/lang/NullPointerException", "java/lang/Throwable").unwrap());
        assert!(!dir.is_subclass("java/lang/Object", "java/lang/String").unwrap());
        assert_eq!(
            dir.is_subclass("nope/Missing", OBJECT),
            Err(UnresolvedClass("nope/Missing".into()))
        );
    }

    #[test]
    fn declared_classes_shadow_and_refresh() {
        let mut dir = ClassDirectory::default();
        dir.declare(ClassInfo::shell("demo/A", AccessFlags::PUBLIC, Some(OBJECT.into())));
        assert!(dir.class("demo/A").unwrap().methods.is_empty());

        let mut class = ClassBuilder::new(AccessFlags::PUBLIC | AccessFlags::SUPER, "demo/A", OBJECT);
        let mut field = FieldDef::new(AccessFlags::PRIVATE, "name", "Ljava/lang/String;");
        field.nullable = Some(Nullable::default());
        class.add_field(field);
        let mut code = CodeBuilder::new(1);
        code.emit(Opcode::Iconst0);
        code.emit(Opcode::Ireturn);
        class.add_method(MethodDef::new(AccessFlags::PUBLIC, "size", "()I", code));
        class.add_method(MethodDef::new(AccessFlags::PUBLIC, "<init>", "()V", CodeBuilder::new(1)));
        dir.declare(ClassInfo::from_builder(&class));

        let info = dir.class("demo/A").unwrap();
        assert_eq!(info.field("name").unwrap().ty, WaterType::string().as_nullable());
        assert_eq!(info.methods.len(), 1);
        assert_eq!(info.constructors.len(), 1);
        assert!(dir.is_subclass("demo/A", OBJECT).unwrap());
    }

    #[test]
    fn methods_are_collected_through_the_hierarchy() {
        let dir = ClassDirectory::default();
        let methods = dir.find_methods("java/lang/String", "equals").unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].owner, "java/lang/String");
        let inherited = dir.find_methods("java/lang/StringBuilder", "hashCode").unwrap();
        assert_eq!(inherited[0].owner, OBJECT);

        let out = dir.find_field("java/lang/System", "out").unwrap().unwrap();
        assert_eq!(out.info.ty, WaterType::object("java/io/PrintStream"));
    }
}
