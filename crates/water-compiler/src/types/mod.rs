//! The compiler's model of value types.
//!
//! [`WaterType`] mirrors the JVM type system plus a nullability bit that
//! only the compiler sees. Nullability is written out as `@Nullable`
//! metadata on the emitted members and read back from class files.
//!
//! # Assignability
//!
//! - Primitives widen along `double > float > long > int > short > char >
//!   byte`. The 32-bit subgroup `int, short, char, byte` also converts
//!   freely at a higher cost. `boolean` only accepts `boolean`.
//! - A non-nullable reference never accepts a nullable one; `null` is
//!   accepted by every nullable reference.
//! - Object subtyping is answered by the [`TypeDirectory`].
//! - Arrays are invariant in their element type.

mod conversion;

pub use conversion::{binary_insn, compare_insn, dummy_constant, TypedCode};

use std::fmt;

use water_classfile::annotation::{ARRAY_DIMENSION, ELEMENT_DIMENSION};
use water_classfile::Nullable;

use crate::directory::TypeDirectory;
use crate::error::UnresolvedClass;

pub const OBJECT: &str = "java/lang/Object";
pub const STRING: &str = "java/lang/String";
pub const THROWABLE: &str = "java/lang/Throwable";

/// Primitive rank from most to least precise.
const RANK: [TypeKind; 7] = [
    TypeKind::Double,
    TypeKind::Float,
    TypeKind::Long,
    TypeKind::Int,
    TypeKind::Short,
    TypeKind::Char,
    TypeKind::Byte,
];

/// The shape of a type, without its nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Type of the `null` literal.
    Null,
    /// A class, by internal name (`java/lang/String`).
    Object(String),
    Array(Box<WaterType>),
    Method(Box<MethodType>),
}

/// Parameter and return types of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodType {
    pub params: Vec<WaterType>,
    pub ret: WaterType,
}

impl MethodType {
    pub fn new(params: Vec<WaterType>, ret: WaterType) -> Self {
        Self { params, ret }
    }

    pub fn descriptor(&self) -> String {
        let mut out = String::from("(");
        for param in &self.params {
            out.push_str(&param.descriptor());
        }
        out.push(')');
        out.push_str(&self.ret.descriptor());
        out
    }

    /// Number of local slots taken by the parameters.
    pub fn param_slots(&self) -> u16 {
        self.params.iter().map(WaterType::size).sum()
    }

    /// Parse a method descriptor, applying return and parameter metadata.
    pub fn from_descriptor(
        descriptor: &str,
        ret: Option<&Nullable>,
        params: &[Option<Nullable>],
    ) -> Option<Self> {
        let (param_descs, ret_desc) = water_classfile::descriptor::split_method(descriptor).ok()?;
        let mut types = Vec::with_capacity(param_descs.len());
        for (i, desc) in param_descs.iter().enumerate() {
            let nullable = params.get(i).and_then(Option::as_ref);
            types.push(WaterType::from_descriptor(desc)?.with_annotation(nullable));
        }
        let ret = WaterType::from_descriptor(ret_desc)?.with_annotation(ret);
        Some(Self::new(types, ret))
    }
}

/// A value type as seen by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WaterType {
    kind: TypeKind,
    nullable: bool,
}

impl WaterType {
    pub const VOID: WaterType = WaterType::primitive(TypeKind::Void);
    pub const BOOLEAN: WaterType = WaterType::primitive(TypeKind::Boolean);
    pub const CHAR: WaterType = WaterType::primitive(TypeKind::Char);
    pub const BYTE: WaterType = WaterType::primitive(TypeKind::Byte);
    pub const SHORT: WaterType = WaterType::primitive(TypeKind::Short);
    pub const INT: WaterType = WaterType::primitive(TypeKind::Int);
    pub const LONG: WaterType = WaterType::primitive(TypeKind::Long);
    pub const FLOAT: WaterType = WaterType::primitive(TypeKind::Float);
    pub const DOUBLE: WaterType = WaterType::primitive(TypeKind::Double);
    pub const NULL: WaterType = WaterType {
        kind: TypeKind::Null,
        nullable: true,
    };

    const fn primitive(kind: TypeKind) -> Self {
        Self { kind, nullable: false }
    }

    pub fn object(internal_name: impl Into<String>) -> Self {
        Self {
            kind: TypeKind::Object(internal_name.into()),
            nullable: false,
        }
    }

    pub fn string() -> Self {
        Self::object(STRING)
    }

    pub fn array_of(element: WaterType) -> Self {
        Self {
            kind: TypeKind::Array(Box::new(element)),
            nullable: false,
        }
    }

    pub fn method(method: MethodType) -> Self {
        Self {
            kind: TypeKind::Method(Box::new(method)),
            nullable: false,
        }
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Same type with the given nullability. Primitives stay non-nullable.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        if self.is_reference() && !self.is_null() {
            self.nullable = nullable;
        }
        self
    }

    pub fn as_nullable(&self) -> Self {
        self.clone().with_nullable(true)
    }

    pub fn as_non_nullable(&self) -> Self {
        self.clone().with_nullable(false)
    }

    // =========================================================================
    // Classification
    // =========================================================================

    pub fn is_void(&self) -> bool {
        self.kind == TypeKind::Void
    }

    pub fn is_null(&self) -> bool {
        self.kind == TypeKind::Null
    }

    pub fn is_boolean(&self) -> bool {
        self.kind == TypeKind::Boolean
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, TypeKind::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array(_))
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, TypeKind::Method(_))
    }

    /// Objects, arrays and `null`.
    pub fn is_reference(&self) -> bool {
        matches!(self.kind, TypeKind::Object(_) | TypeKind::Array(_) | TypeKind::Null)
    }

    /// Value types, `void` included.
    pub fn is_primitive(&self) -> bool {
        !self.is_reference() && !self.is_method()
    }

    /// `int`, `short`, `char`, `byte` and `long`.
    pub fn is_integer(&self) -> bool {
        self.is_int_group() || self.kind == TypeKind::Long
    }

    /// Types held as a 32-bit `int` on the operand stack, `boolean`
    /// included.
    pub fn is_represented_as_int(&self) -> bool {
        self.is_int_group() || self.is_boolean()
    }

    /// `int`, `short`, `char` and `byte`.
    pub fn is_int_group(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Int | TypeKind::Short | TypeKind::Char | TypeKind::Byte
        )
    }

    pub fn is_floating(&self) -> bool {
        matches!(self.kind, TypeKind::Float | TypeKind::Double)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating()
    }

    pub fn is_string(&self) -> bool {
        self.is_class(STRING)
    }

    pub fn is_class(&self, internal_name: &str) -> bool {
        matches!(&self.kind, TypeKind::Object(name) if name == internal_name)
    }

    /// Local variable and operand stack slots taken by a value.
    pub fn size(&self) -> u16 {
        match self.kind {
            TypeKind::Void => 0,
            TypeKind::Long | TypeKind::Double => 2,
            _ => 1,
        }
    }

    fn rank(&self) -> Option<usize> {
        RANK.iter().position(|k| *k == self.kind)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Internal name of a class type.
    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Name usable as the operand of `checkcast`, `anewarray` and friends:
    /// the internal name for classes, the descriptor for arrays.
    pub fn reference_operand(&self) -> Option<String> {
        match &self.kind {
            TypeKind::Object(name) => Some(name.clone()),
            TypeKind::Array(_) => Some(self.descriptor()),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&WaterType> {
        match &self.kind {
            TypeKind::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn method_type(&self) -> Option<&MethodType> {
        match &self.kind {
            TypeKind::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn dimensions(&self) -> u8 {
        let mut ty = self;
        let mut dims = 0;
        while let Some(element) = ty.element_type() {
            ty = element;
            dims += 1;
        }
        dims
    }

    /// Element type once every array dimension is stripped.
    pub fn root_element(&self) -> &WaterType {
        let mut ty = self;
        while let Some(element) = ty.element_type() {
            ty = element;
        }
        ty
    }

    // =========================================================================
    // Descriptors and metadata
    // =========================================================================

    pub fn descriptor(&self) -> String {
        match &self.kind {
            TypeKind::Void => "V".into(),
            TypeKind::Boolean => "Z".into(),
            TypeKind::Char => "C".into(),
            TypeKind::Byte => "B".into(),
            TypeKind::Short => "S".into(),
            TypeKind::Int => "I".into(),
            TypeKind::Long => "J".into(),
            TypeKind::Float => "F".into(),
            TypeKind::Double => "D".into(),
            TypeKind::Null => format!("L{};", OBJECT),
            TypeKind::Object(name) => format!("L{};", name),
            TypeKind::Array(element) => format!("[{}", element.descriptor()),
            TypeKind::Method(method) => method.descriptor(),
        }
    }

    /// Parse a field descriptor. Every component is non-nullable.
    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        let mut chars = descriptor.chars();
        let ty = match chars.next()? {
            'V' => Self::VOID,
            'Z' => Self::BOOLEAN,
            'C' => Self::CHAR,
            'B' => Self::BYTE,
            'S' => Self::SHORT,
            'I' => Self::INT,
            'J' => Self::LONG,
            'F' => Self::FLOAT,
            'D' => Self::DOUBLE,
            'L' => {
                let name = descriptor.get(1..)?.strip_suffix(';')?;
                return (!name.is_empty() && !name.contains(';')).then(|| Self::object(name));
            }
            '[' => return Self::from_descriptor(&descriptor[1..]).map(Self::array_of),
            _ => return None,
        };
        (descriptor.len() == 1).then_some(ty)
    }

    /// Apply `@Nullable` metadata. Absent metadata leaves everything
    /// non-nullable.
    pub fn with_annotation(self, nullable: Option<&Nullable>) -> Self {
        let Some(nullable) = nullable else { return self };
        if !self.is_array() {
            return self.with_nullable(true);
        }
        self.apply_dimensions(&nullable.dimensions, -1)
    }

    fn apply_dimensions(self, dims: &[i32], depth: i32) -> Self {
        match self.kind {
            TypeKind::Array(element) => {
                let marker = if depth < 0 { ARRAY_DIMENSION } else { depth };
                let element = element.apply_dimensions(dims, depth + 1);
                Self::array_of(element).with_nullable(dims.contains(&marker))
            }
            _ => {
                let nullable = dims.contains(&ELEMENT_DIMENSION);
                self.with_nullable(nullable)
            }
        }
    }

    /// `@Nullable` metadata describing this type, when any part of it is
    /// nullable.
    pub fn annotation(&self) -> Option<Nullable> {
        if !self.is_array() {
            return self.nullable.then(Nullable::default);
        }
        let mut dims = Vec::new();
        let mut ty = self;
        let mut depth = -1;
        while let Some(element) = ty.element_type() {
            if ty.nullable {
                dims.push(if depth < 0 { ARRAY_DIMENSION } else { depth });
            }
            ty = element;
            depth += 1;
        }
        if ty.nullable {
            dims.push(ELEMENT_DIMENSION);
        }
        (!dims.is_empty()).then(|| Nullable::new(dims))
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    /// Whether a value of type `from` can be stored where `self` is
    /// expected, with an implicit primitive conversion if needed.
    pub fn is_assignable_from(
        &self,
        from: &WaterType,
        directory: &dyn TypeDirectory,
    ) -> Result<bool, UnresolvedClass> {
        if self.is_void() || from.is_void() || self.is_method() || from.is_method() {
            return Ok(false);
        }
        if self == from {
            return Ok(true);
        }
        if from.is_null() {
            return Ok(self.is_reference() && self.nullable);
        }
        if self.is_primitive() != from.is_primitive() {
            return Ok(false);
        }
        if self.is_primitive() {
            return Ok(self.primitive_accepts(from));
        }
        if !self.nullable && from.nullable {
            return Ok(false);
        }
        match (&self.kind, &from.kind) {
            (TypeKind::Object(to), TypeKind::Object(sub)) => directory.is_subclass(sub, to),
            (TypeKind::Object(to), TypeKind::Array(_)) => Ok(matches!(
                to.as_str(),
                OBJECT | "java/lang/Cloneable" | "java/io/Serializable"
            )),
            (TypeKind::Array(to), TypeKind::Array(sub)) => Ok(if to.nullable {
                **to == sub.as_nullable()
            } else {
                to == sub
            }),
            _ => Ok(false),
        }
    }

    fn primitive_accepts(&self, from: &WaterType) -> bool {
        if self.is_boolean() || from.is_boolean() {
            return self.kind == from.kind;
        }
        match (self.rank(), from.rank()) {
            (Some(to), Some(source)) if to <= source => true,
            _ => self.is_int_group() && from.is_int_group(),
        }
    }

    /// Cost of the conversion from `from`, assuming it is assignable:
    /// 0 for identity, 1 for a widening or an upcast, 2 for a move inside
    /// the 32-bit group that is not a widening.
    pub fn assign_changes_from(&self, from: &WaterType) -> u32 {
        if self == from || from.is_null() {
            return 0;
        }
        if self.is_reference() && from.is_reference() {
            return if self.is_array() { 0 } else { 1 };
        }
        match (self.rank(), from.rank()) {
            (Some(to), Some(source)) if to <= source => 1,
            _ if self.is_int_group() && from.is_int_group() => 2,
            _ => 0,
        }
    }

    /// The more precise of two numeric primitives.
    pub fn larger(&self, other: &WaterType) -> WaterType {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) if b < a => other.clone(),
            _ => self.clone(),
        }
    }

    /// Result type of an arithmetic operator on two numeric primitives:
    /// the larger of both, never narrower than `int`.
    pub fn promote(&self, other: &WaterType) -> WaterType {
        let larger = self.larger(other);
        if larger.is_int_group() {
            WaterType::INT
        } else {
            larger
        }
    }

    /// Wrapper class used when a primitive has to travel as an object.
    /// References are their own wrapper.
    pub fn box_type(&self) -> WaterType {
        let wrapper = match self.kind {
            TypeKind::Boolean => "java/lang/Boolean",
            TypeKind::Char => "java/lang/Character",
            TypeKind::Byte => "java/lang/Byte",
            TypeKind::Short => "java/lang/Short",
            TypeKind::Int => "java/lang/Integer",
            TypeKind::Long => "java/lang/Long",
            TypeKind::Float => "java/lang/Float",
            TypeKind::Double => "java/lang/Double",
            _ => return self.clone(),
        };
        WaterType::object(wrapper)
    }
}

impl fmt::Display for WaterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Void => f.write_str("void")?,
            TypeKind::Boolean => f.write_str("boolean")?,
            TypeKind::Char => f.write_str("char")?,
            TypeKind::Byte => f.write_str("byte")?,
            TypeKind::Short => f.write_str("short")?,
            TypeKind::Int => f.write_str("int")?,
            TypeKind::Long => f.write_str("long")?,
            TypeKind::Float => f.write_str("float")?,
            TypeKind::Double => f.write_str("double")?,
            TypeKind::Null => return f.write_str("null"),
            TypeKind::Object(name) => f.write_str(&name.replace('/', "."))?,
            TypeKind::Array(element) => write!(f, "{}[]", element)?,
            TypeKind::Method(method) => {
                f.write_str("(")?;
                for (i, param) in method.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                return write!(f, ") -> {}", method.ret);
            }
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// Comma separated list of types, or `(none)`.
pub fn describe_types(types: &[WaterType]) -> String {
    if types.is_empty() {
        return "(none)".to_string();
    }
    types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::ClassDirectory;

    const PRIMITIVES: [WaterType; 7] = [
        WaterType::DOUBLE,
        WaterType::FLOAT,
        WaterType::LONG,
        WaterType::INT,
        WaterType::SHORT,
        WaterType::CHAR,
        WaterType::BYTE,
    ];

    fn assignable(to: &WaterType, from: &WaterType) -> bool {
        to.is_assignable_from(from, &ClassDirectory::default()).unwrap()
    }

    #[test]
    fn equality_includes_nullability() {
        let s = WaterType::string();
        assert_ne!(s, s.as_nullable());
        assert_eq!(s, s.as_nullable().as_non_nullable());
        assert!(!WaterType::INT.as_nullable().is_nullable());
    }

    #[test]
    fn widening_covers_every_primitive_pair() {
        for a in &PRIMITIVES {
            for b in &PRIMITIVES {
                let forward = assignable(a, b);
                let backward = assignable(b, a);
                assert!(forward || backward, "{} / {}", a, b);
                if a != b && !(a.is_int_group() && b.is_int_group()) {
                    assert!(forward != backward, "{} / {}", a, b);
                }
            }
        }
    }

    #[test]
    fn boolean_only_accepts_boolean() {
        assert!(assignable(&WaterType::BOOLEAN, &WaterType::BOOLEAN));
        for p in &PRIMITIVES {
            assert!(!assignable(&WaterType::BOOLEAN, p));
            assert!(!assignable(p, &WaterType::BOOLEAN));
        }
    }

    #[test]
    fn conversion_costs() {
        assert_eq!(WaterType::INT.assign_changes_from(&WaterType::INT), 0);
        assert_eq!(WaterType::DOUBLE.assign_changes_from(&WaterType::INT), 1);
        assert_eq!(WaterType::INT.assign_changes_from(&WaterType::CHAR), 1);
        assert_eq!(WaterType::CHAR.assign_changes_from(&WaterType::INT), 2);
        assert_eq!(WaterType::string().as_nullable().assign_changes_from(&WaterType::NULL), 0);
        assert_eq!(WaterType::object(OBJECT).assign_changes_from(&WaterType::string()), 1);
    }

    #[test]
    fn nullable_references() {
        let s = WaterType::string();
        assert!(assignable(&s.as_nullable(), &s));
        assert!(!assignable(&s, &s.as_nullable()));
        assert!(assignable(&s.as_nullable(), &WaterType::NULL));
        assert!(!assignable(&s, &WaterType::NULL));
        assert!(!assignable(&WaterType::INT, &WaterType::NULL));
    }

    #[test]
    fn object_assignability_uses_the_directory() {
        assert!(assignable(&WaterType::object(OBJECT), &WaterType::string()));
        assert!(!assignable(&WaterType::string(), &WaterType::object(OBJECT)));
        let err = WaterType::object(OBJECT)
            .is_assignable_from(&WaterType::object("missing/Type"), &ClassDirectory::default())
            .unwrap_err();
        assert_eq!(err, UnresolvedClass("missing/Type".into()));
    }

    #[test]
    fn arrays_are_invariant() {
        let ints = WaterType::array_of(WaterType::INT);
        let longs = WaterType::array_of(WaterType::LONG);
        assert!(!assignable(&longs, &ints));
        let strings = WaterType::array_of(WaterType::string());
        let maybe_strings = WaterType::array_of(WaterType::string().as_nullable());
        assert!(assignable(&maybe_strings, &strings));
        assert!(!assignable(&strings, &maybe_strings));
        assert!(assignable(&WaterType::object(OBJECT), &ints));
    }

    #[test]
    fn descriptors_round_trip() {
        for desc in ["I", "J", "Z", "[[D", "Ljava/lang/String;", "[Ljava/lang/Object;"] {
            assert_eq!(WaterType::from_descriptor(desc).unwrap().descriptor(), desc);
        }
        assert!(WaterType::from_descriptor("Q").is_none());
        assert!(WaterType::from_descriptor("II").is_none());
        assert!(WaterType::from_descriptor("L;").is_none());
    }

    #[test]
    fn array_annotations() {
        let grid = WaterType::array_of(WaterType::array_of(WaterType::string().as_nullable()))
            .with_nullable(true);
        let nullable = grid.annotation().unwrap();
        assert_eq!(nullable.dimensions, vec![ARRAY_DIMENSION, ELEMENT_DIMENSION]);

        let plain = WaterType::from_descriptor("[[Ljava/lang/String;").unwrap();
        assert_eq!(plain.clone().with_annotation(Some(&nullable)), grid);
        assert!(plain.annotation().is_none());

        let inner = WaterType::array_of(WaterType::array_of(WaterType::INT).with_nullable(true));
        assert_eq!(inner.annotation().unwrap().dimensions, vec![0]);
    }

    #[test]
    fn display_names() {
        assert_eq!(WaterType::string().as_nullable().to_string(), "java.lang.String?");
        assert_eq!(WaterType::array_of(WaterType::INT).to_string(), "int[]");
        assert_eq!(WaterType::NULL.to_string(), "null");
        let m = WaterType::method(MethodType::new(vec![WaterType::INT], WaterType::VOID));
        assert_eq!(m.to_string(), "(int) -> void");
        assert_eq!(describe_types(&[]), "(none)");
    }

    #[test]
    fn promotion() {
        assert_eq!(WaterType::BYTE.promote(&WaterType::SHORT), WaterType::INT);
        assert_eq!(WaterType::INT.promote(&WaterType::LONG), WaterType::LONG);
        assert_eq!(WaterType::FLOAT.promote(&WaterType::LONG), WaterType::FLOAT);
        assert_eq!(WaterType::INT.box_type(), WaterType::object("java/lang/Integer"));
    }
}
