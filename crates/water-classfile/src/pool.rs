//! The constant pool.
//!
//! The writer side deduplicates entries so that every symbolic reference
//! emitted by the code assembler maps to exactly one pool slot. The reader
//! side keeps every entry (including the kinds the writer never produces)
//! so indices line up with the file being parsed.

use num_enum::TryFromPrimitive;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::bytes::{decode_modified_utf8, encode_modified_utf8, ByteReader, PutBytes};
use crate::error::{ClassFileError, Result};

/// Tag byte of a constant pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ConstantTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    FieldRef = 9,
    MethodRef = 10,
    InterfaceMethodRef = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}

/// A single constant pool entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(OrderedFloat<f32>),
    Long(i64),
    Double(OrderedFloat<f64>),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u16, u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
}

impl Constant {
    fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

/// Constant pool with 1-based indices. Slot 0 and the slot after every
/// long/double are unusable and stored as `None`.
#[derive(Debug, Clone)]
pub struct ConstantPool {
    entries: Vec<Option<Constant>>,
    lookup: FxHashMap<Constant, u16>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self {
            entries: vec![None],
            lookup: FxHashMap::default(),
        }
    }

    /// Value of `constant_pool_count` (one past the last index).
    pub fn count(&self) -> u16 {
        self.entries.len() as u16
    }

    fn add(&mut self, constant: Constant) -> Result<u16> {
        if let Some(&index) = self.lookup.get(&constant) {
            return Ok(index);
        }
        let width = if constant.is_wide() { 2 } else { 1 };
        let index = self.entries.len();
        if index + width > u16::MAX as usize {
            return Err(ClassFileError::PoolOverflow);
        }
        let index = index as u16;
        self.lookup.insert(constant.clone(), index);
        let wide = constant.is_wide();
        self.entries.push(Some(constant));
        if wide {
            self.entries.push(None);
        }
        Ok(index)
    }

    pub fn utf8(&mut self, text: &str) -> Result<u16> {
        self.add(Constant::Utf8(text.to_string()))
    }

    pub fn integer(&mut self, value: i32) -> Result<u16> {
        self.add(Constant::Integer(value))
    }

    pub fn float(&mut self, value: f32) -> Result<u16> {
        self.add(Constant::Float(OrderedFloat(value)))
    }

    pub fn long(&mut self, value: i64) -> Result<u16> {
        self.add(Constant::Long(value))
    }

    pub fn double(&mut self, value: f64) -> Result<u16> {
        self.add(Constant::Double(OrderedFloat(value)))
    }

    /// `CONSTANT_Class` for an internal name (or array descriptor).
    pub fn class(&mut self, internal_name: &str) -> Result<u16> {
        let name = self.utf8(internal_name)?;
        self.add(Constant::Class(name))
    }

    pub fn string(&mut self, value: &str) -> Result<u16> {
        let utf8 = self.utf8(value)?;
        self.add(Constant::String(utf8))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name = self.utf8(name)?;
        let descriptor = self.utf8(descriptor)?;
        self.add(Constant::NameAndType(name, descriptor))
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.add(Constant::FieldRef(class, nat))
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str, interface: bool) -> Result<u16> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        if interface {
            self.add(Constant::InterfaceMethodRef(class, nat))
        } else {
            self.add(Constant::MethodRef(class, nat))
        }
    }

    /// Serialize `constant_pool_count` followed by every entry.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.put_u16(self.count());
        for constant in self.entries.iter().flatten() {
            match constant {
                Constant::Utf8(text) => {
                    let bytes = encode_modified_utf8(text);
                    out.put_u8(ConstantTag::Utf8 as u8);
                    out.put_u16(bytes.len() as u16);
                    out.extend_from_slice(&bytes);
                }
                Constant::Integer(v) => {
                    out.put_u8(ConstantTag::Integer as u8);
                    out.put_u32(*v as u32);
                }
                Constant::Float(v) => {
                    out.put_u8(ConstantTag::Float as u8);
                    out.put_u32(v.0.to_bits());
                }
                Constant::Long(v) => {
                    out.put_u8(ConstantTag::Long as u8);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                Constant::Double(v) => {
                    out.put_u8(ConstantTag::Double as u8);
                    out.extend_from_slice(&v.0.to_bits().to_be_bytes());
                }
                Constant::Class(i) => write_ref(out, ConstantTag::Class, *i),
                Constant::String(i) => write_ref(out, ConstantTag::String, *i),
                Constant::MethodType(i) => write_ref(out, ConstantTag::MethodType, *i),
                Constant::Module(i) => write_ref(out, ConstantTag::Module, *i),
                Constant::Package(i) => write_ref(out, ConstantTag::Package, *i),
                Constant::FieldRef(a, b) => write_pair(out, ConstantTag::FieldRef, *a, *b),
                Constant::MethodRef(a, b) => write_pair(out, ConstantTag::MethodRef, *a, *b),
                Constant::InterfaceMethodRef(a, b) => write_pair(out, ConstantTag::InterfaceMethodRef, *a, *b),
                Constant::NameAndType(a, b) => write_pair(out, ConstantTag::NameAndType, *a, *b),
                Constant::Dynamic(a, b) => write_pair(out, ConstantTag::Dynamic, *a, *b),
                Constant::InvokeDynamic(a, b) => write_pair(out, ConstantTag::InvokeDynamic, *a, *b),
                Constant::MethodHandle(kind, i) => {
                    out.put_u8(ConstantTag::MethodHandle as u8);
                    out.put_u8(*kind);
                    out.put_u16(*i);
                }
            }
        }
    }

    // =========================================================================
    // Reading
    // =========================================================================

    pub(crate) fn parse(reader: &mut ByteReader<'_>) -> Result<Self> {
        let count = reader.u16()?;
        let mut pool = Self::new();
        while pool.entries.len() < count as usize {
            let tag = reader.u8()?;
            let tag = ConstantTag::try_from(tag).map_err(|_| ClassFileError::InvalidConstantPoolTag(tag))?;
            let constant = match tag {
                ConstantTag::Utf8 => {
                    let len = reader.u16()? as usize;
                    Constant::Utf8(decode_modified_utf8(reader.bytes(len)?)?)
                }
                ConstantTag::Integer => Constant::Integer(reader.u32()? as i32),
                ConstantTag::Float => Constant::Float(OrderedFloat(f32::from_bits(reader.u32()?))),
                ConstantTag::Long => Constant::Long(reader.u64()? as i64),
                ConstantTag::Double => Constant::Double(OrderedFloat(f64::from_bits(reader.u64()?))),
                ConstantTag::Class => Constant::Class(reader.u16()?),
                ConstantTag::String => Constant::String(reader.u16()?),
                ConstantTag::MethodType => Constant::MethodType(reader.u16()?),
                ConstantTag::Module => Constant::Module(reader.u16()?),
                ConstantTag::Package => Constant::Package(reader.u16()?),
                ConstantTag::FieldRef => Constant::FieldRef(reader.u16()?, reader.u16()?),
                ConstantTag::MethodRef => Constant::MethodRef(reader.u16()?, reader.u16()?),
                ConstantTag::InterfaceMethodRef => Constant::InterfaceMethodRef(reader.u16()?, reader.u16()?),
                ConstantTag::NameAndType => Constant::NameAndType(reader.u16()?, reader.u16()?),
                ConstantTag::Dynamic => Constant::Dynamic(reader.u16()?, reader.u16()?),
                ConstantTag::InvokeDynamic => Constant::InvokeDynamic(reader.u16()?, reader.u16()?),
                ConstantTag::MethodHandle => Constant::MethodHandle(reader.u8()?, reader.u16()?),
            };
            // Parsed pools are never appended to, so only positions matter.
            let wide = constant.is_wide();
            pool.entries.push(Some(constant));
            if wide {
                pool.entries.push(None);
            }
        }
        Ok(pool)
    }

    pub fn get(&self, index: u16) -> Result<&Constant> {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(ClassFileError::InvalidConstantPoolIndex(index))
    }

    pub fn get_utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Utf8(text) => Ok(text),
            _ => Err(ClassFileError::ConstantPoolTypeMismatch { index, expected: "Utf8" }),
        }
    }

    pub fn get_class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Class(name) => self.get_utf8(*name),
            _ => Err(ClassFileError::ConstantPoolTypeMismatch { index, expected: "Class" }),
        }
    }
}

fn write_ref(out: &mut Vec<u8>, tag: ConstantTag, index: u16) {
    out.put_u8(tag as u8);
    out.put_u16(index);
}

fn write_pair(out: &mut Vec<u8>, tag: ConstantTag, a: u16, b: u16) {
    out.put_u8(tag as u8);
    out.put_u16(a);
    out.put_u16(b);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates_entries() {
        let mut pool = ConstantPool::new();
        let a = pool.method_ref("java/lang/Object", "<init>", "()V", false).unwrap();
        let b = pool.method_ref("java/lang/Object", "<init>", "()V", false).unwrap();
        assert_eq!(a, b);
        assert_eq!(pool.class("java/lang/Object").unwrap(), pool.class("java/lang/Object").unwrap());
        // utf8 x3, class, name-and-type, methodref
        assert_eq!(pool.count(), 7);
    }

    #[test]
    fn wide_constants_take_two_slots() {
        let mut pool = ConstantPool::new();
        let long = pool.long(1 << 40).unwrap();
        let next = pool.integer(7).unwrap();
        assert_eq!(long, 1);
        assert_eq!(next, 3);
        assert_eq!(pool.count(), 4);
    }

    #[test]
    fn parse_reads_back_written_pool() {
        let mut pool = ConstantPool::new();
        let s = pool.string("héllo").unwrap();
        let d = pool.double(2.5).unwrap();
        let c = pool.class("a/B").unwrap();
        let mut out = Vec::new();
        pool.write(&mut out);

        let mut reader = ByteReader::new(&out);
        let parsed = ConstantPool::parse(&mut reader).unwrap();
        assert!(reader.is_empty());
        assert_eq!(parsed.count(), pool.count());
        assert_eq!(parsed.get(d).unwrap(), &Constant::Double(OrderedFloat(2.5)));
        assert_eq!(parsed.get_class_name(c).unwrap(), "a/B");
        match parsed.get(s).unwrap() {
            Constant::String(utf8) => assert_eq!(parsed.get_utf8(*utf8).unwrap(), "héllo"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parsed.get_utf8(c).is_err());
    }
}
