//! Symbol tables for function compilation.
//!
//! Two kinds of tables are kept:
//! - [`MemberTable`]: declarations at class or file level (fields, static
//!   variables, functions and their overloads)
//! - [`LocalScope`]: local variables of the method being compiled, with
//!   nested block scopes and shadowing
//!
//! Name lookup walks locals first, then the current class, then the
//! file's top-level declarations, then the built-in functions.

use rustc_hash::FxHashMap;

use crate::types::{MethodType, WaterType};

// ============================================================================
// Types
// ============================================================================

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Static field of `owner`.
    Static,
    /// Instance field of `owner`.
    Field,
    /// Local variable slot.
    Local(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    /// Internal name of the declaring class; empty for locals.
    pub owner: String,
    pub ty: WaterType,
    pub is_const: bool,
    /// Declared `private`: no accessor methods are generated.
    pub is_private: bool,
}

impl Variable {
    pub fn is_local(&self) -> bool {
        matches!(self.kind, VariableKind::Local(_))
    }

    /// Name of the generated getter: `isX` names are kept, anything else
    /// becomes `getX`.
    pub fn getter_name(&self) -> String {
        getter_name(&self.name)
    }

    /// Name of the generated setter; an `is` prefix is dropped.
    pub fn setter_name(&self) -> String {
        setter_name(&self.name)
    }
}

fn has_is_prefix(name: &str) -> bool {
    name.strip_prefix("is")
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_uppercase)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Getter generated for a field called `name`.
pub fn getter_name(name: &str) -> String {
    if has_is_prefix(name) {
        name.to_string()
    } else {
        format!("get{}", capitalize(name))
    }
}

/// Setter generated for a field called `name`.
pub fn setter_name(name: &str) -> String {
    match name.strip_prefix("is") {
        Some(rest) if has_is_prefix(name) => format!("set{}", rest),
        _ => format!("set{}", capitalize(name)),
    }
}

/// How a function is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// `invokestatic` on the owner.
    Static,
    /// `invokevirtual` on `this`.
    Instance,
    /// A method of `System.out`.
    Builtin,
}

/// One overload candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub kind: FunctionKind,
    pub name: String,
    pub owner: String,
    pub ty: MethodType,
    /// Private instance methods are reached with `invokespecial`.
    pub is_private: bool,
}

impl Function {
    pub fn descriptor(&self) -> String {
        self.ty.descriptor()
    }
}

/// A name declared twice in the same scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redefinition;

// ============================================================================
// MemberTable
// ============================================================================

/// Class-level or file-level declarations.
#[derive(Debug, Clone, Default)]
pub struct MemberTable {
    variables: FxHashMap<String, Variable>,
    functions: FxHashMap<String, Vec<Function>>,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_variable(&mut self, variable: Variable) -> Result<(), Redefinition> {
        if self.variables.contains_key(&variable.name) {
            return Err(Redefinition);
        }
        self.variables.insert(variable.name.clone(), variable);
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Add an overload; candidates keep declaration order.
    pub fn add_function(&mut self, function: Function) {
        self.functions.entry(function.name.clone()).or_default().push(function);
    }

    pub fn functions(&self, name: &str) -> &[Function] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Overload with exactly these parameter types, used for redefinition
    /// checks.
    pub fn exact_function(&self, name: &str, params: &[WaterType]) -> Option<&Function> {
        self.functions(name)
            .iter()
            .find(|f| erased_eq(&f.ty.params, params))
    }
}

/// Parameter lists that produce the same descriptor.
fn erased_eq(a: &[WaterType], b: &[WaterType]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.descriptor() == y.descriptor())
}

/// Functions callable everywhere without a receiver.
pub fn builtin_functions() -> MemberTable {
    let mut table = MemberTable::new();
    let mut println = |param: Option<WaterType>| {
        table.add_function(Function {
            kind: FunctionKind::Builtin,
            name: "println".into(),
            owner: "java/io/PrintStream".into(),
            ty: MethodType::new(param.into_iter().collect(), WaterType::VOID),
            is_private: false,
        });
    };
    println(None);
    for ty in [
        WaterType::BOOLEAN,
        WaterType::CHAR,
        WaterType::INT,
        WaterType::LONG,
        WaterType::FLOAT,
        WaterType::DOUBLE,
        WaterType::string().as_nullable(),
        WaterType::object(crate::types::OBJECT).as_nullable(),
    ] {
        println(Some(ty));
    }
    table
}

// ============================================================================
// LocalScope
// ============================================================================

#[derive(Debug, Clone)]
struct LocalVar {
    variable: Variable,
    depth: u32,
}

/// Local variables of one method body.
#[derive(Debug, Clone)]
pub struct LocalScope {
    variables: FxHashMap<String, LocalVar>,
    /// `(shadowing depth, name, previous)`.
    shadowed: Vec<(u32, String, LocalVar)>,
    depth: u32,
    next_slot: u16,
}

impl LocalScope {
    /// Create a scope whose first `reserved` slots are taken (`this`).
    pub fn new(reserved: u16) -> Self {
        Self {
            variables: FxHashMap::default(),
            shadowed: Vec::new(),
            depth: 0,
            next_slot: reserved,
        }
    }

    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave a block, forgetting what it declared and restoring what it
    /// shadowed. Slots are not reused.
    pub fn pop_scope(&mut self) {
        let depth = self.depth;
        self.variables.retain(|_, var| var.depth < depth);
        while self.shadowed.last().is_some_and(|(d, _, _)| *d == depth) {
            if let Some((_, name, var)) = self.shadowed.pop() {
                self.variables.insert(name, var);
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Declare a local and allocate its slot.
    pub fn declare(&mut self, name: &str, ty: WaterType, is_const: bool) -> Result<u16, Redefinition> {
        if let Some(existing) = self.variables.get(name) {
            if existing.depth == self.depth {
                return Err(Redefinition);
            }
            self.shadowed.push((self.depth, name.to_string(), existing.clone()));
        }
        let slot = self.allocate(ty.size().max(1));
        self.variables.insert(
            name.to_string(),
            LocalVar {
                variable: Variable {
                    name: name.to_string(),
                    kind: VariableKind::Local(slot),
                    owner: String::new(),
                    ty,
                    is_const,
                    is_private: false,
                },
                depth: self.depth,
            },
        );
        Ok(slot)
    }

    /// Reserve anonymous slots, e.g. for a pending exception.
    pub fn allocate(&mut self, size: u16) -> u16 {
        let slot = self.next_slot;
        self.next_slot += size;
        slot
    }

    pub fn lookup(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name).map(|v| &v.variable)
    }

    /// Change the static type of a local, returning the previous type.
    /// Used to narrow a variable inside an `instanceof` guarded block.
    pub fn retype(&mut self, name: &str, ty: WaterType) -> Option<WaterType> {
        let var = self.variables.get_mut(name)?;
        Some(std::mem::replace(&mut var.variable.ty, ty))
    }

    pub fn next_slot(&self) -> u16 {
        self.next_slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_account_for_wide_values() {
        let mut scope = LocalScope::new(1);
        assert_eq!(scope.declare("a", WaterType::INT, false), Ok(1));
        assert_eq!(scope.declare("b", WaterType::DOUBLE, false), Ok(2));
        assert_eq!(scope.declare("c", WaterType::string(), false), Ok(4));
        assert_eq!(scope.next_slot(), 5);
    }

    #[test]
    fn same_depth_redefinition_is_rejected() {
        let mut scope = LocalScope::new(0);
        scope.declare("x", WaterType::INT, false).unwrap();
        assert_eq!(scope.declare("x", WaterType::LONG, false), Err(Redefinition));
    }

    #[test]
    fn shadowing_is_undone_on_exit() {
        let mut scope = LocalScope::new(0);
        scope.declare("x", WaterType::INT, false).unwrap();
        scope.push_scope();
        scope.declare("x", WaterType::string(), true).unwrap();
        scope.declare("y", WaterType::INT, false).unwrap();
        assert_eq!(scope.lookup("x").unwrap().ty, WaterType::string());
        scope.pop_scope();
        let x = scope.lookup("x").unwrap();
        assert_eq!(x.ty, WaterType::INT);
        assert_eq!(x.kind, VariableKind::Local(0));
        assert!(scope.lookup("y").is_none());
        assert_eq!(scope.next_slot(), 3);
    }

    #[test]
    fn retype_narrows_a_local() {
        let mut scope = LocalScope::new(0);
        scope.declare("o", WaterType::object("java/lang/Object"), false).unwrap();
        let previous = scope.retype("o", WaterType::string()).unwrap();
        assert_eq!(scope.lookup("o").unwrap().ty, WaterType::string());
        scope.retype("o", previous);
        assert!(scope.lookup("o").unwrap().ty.is_class("java/lang/Object"));
    }

    #[test]
    fn member_tables_keep_overload_order() {
        let mut table = MemberTable::new();
        for ty in [WaterType::INT, WaterType::DOUBLE] {
            table.add_function(Function {
                kind: FunctionKind::Static,
                name: "f".into(),
                owner: "MainWtr".into(),
                ty: MethodType::new(vec![ty], WaterType::VOID),
                is_private: false,
            });
        }
        assert_eq!(table.functions("f").len(), 2);
        assert_eq!(table.functions("f")[0].ty.params[0], WaterType::INT);
        assert!(table.exact_function("f", &[WaterType::DOUBLE]).is_some());
        assert!(table.exact_function("f", &[WaterType::LONG]).is_none());
        assert!(table.functions("g").is_empty());
    }

    #[test]
    fn member_variables_reject_duplicates() {
        let mut table = MemberTable::new();
        let var = Variable {
            name: "count".into(),
            kind: VariableKind::Static,
            owner: "MainWtr".into(),
            ty: WaterType::INT,
            is_const: false,
            is_private: false,
        };
        table.declare_variable(var.clone()).unwrap();
        assert_eq!(table.declare_variable(var), Err(Redefinition));
    }

    #[test]
    fn accessor_names() {
        assert_eq!(getter_name("health"), "getHealth");
        assert_eq!(setter_name("health"), "setHealth");
        assert_eq!(getter_name("isAlive"), "isAlive");
        assert_eq!(setter_name("isAlive"), "setAlive");
        assert_eq!(getter_name("island"), "getIsland");
        assert_eq!(setter_name("island"), "setIsland");
    }

    #[test]
    fn println_builtins() {
        let table = builtin_functions();
        assert_eq!(table.functions("println").len(), 9);
        assert!(table.functions("println").iter().all(|f| f.kind == FunctionKind::Builtin));
    }
}
