//! Class file reader.
//!
//! Only what the type directory needs is decoded: names, access flags,
//! member descriptors, declared exceptions and `@Nullable` metadata. The
//! method body is kept as raw bytes alongside its stack limits.

use crate::access::AccessFlags;
use crate::annotation::{read_annotations, Nullable};
use crate::bytes::ByteReader;
use crate::class::MAGIC;
use crate::error::{ClassFileError, Result};
use crate::pool::ConstantPool;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub access: AccessFlags,
    pub name: String,
    pub descriptor: String,
    pub nullable: Option<Nullable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeInfo {
    pub max_stack: u16,
    pub max_locals: u16,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub access: AccessFlags,
    pub name: String,
    pub descriptor: String,
    pub exceptions: Vec<String>,
    pub nullable: Option<Nullable>,
    pub parameters: Vec<Option<Nullable>>,
    pub code: Option<CodeInfo>,
}

/// A parsed class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub major_version: u16,
    pub access: AccessFlags,
    pub name: String,
    /// `None` only for `java/lang/Object` (and module-info).
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub source_file: Option<String>,
    pub signature: Option<String>,
}

impl ClassFile {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);
        let magic = r.u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::InvalidMagic(magic));
        }
        let _minor = r.u16()?;
        let major_version = r.u16()?;
        let pool = ConstantPool::parse(&mut r)?;

        let access = AccessFlags::from_bits_retain(r.u16()?);
        let name = pool.get_class_name(r.u16()?)?.to_string();
        let super_index = r.u16()?;
        let super_name = if super_index == 0 {
            None
        } else {
            Some(pool.get_class_name(super_index)?.to_string())
        };

        let interface_count = r.u16()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(pool.get_class_name(r.u16()?)?.to_string());
        }

        let field_count = r.u16()?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let access = AccessFlags::from_bits_retain(r.u16()?);
            let name = pool.get_utf8(r.u16()?)?.to_string();
            let descriptor = pool.get_utf8(r.u16()?)?.to_string();
            let mut nullable = None;
            let attribute_count = r.u16()?;
            for _ in 0..attribute_count {
                let (attr_name, data) = read_attribute(&mut r, &pool)?;
                if attr_name == "RuntimeVisibleAnnotations" {
                    nullable = read_annotations(&mut ByteReader::new(data), &pool)?;
                }
            }
            fields.push(FieldInfo {
                access,
                name,
                descriptor,
                nullable,
            });
        }

        let method_count = r.u16()?;
        let mut methods = Vec::with_capacity(method_count as usize);
        for _ in 0..method_count {
            methods.push(read_method(&mut r, &pool)?);
        }

        let mut source_file = None;
        let mut signature = None;
        let attribute_count = r.u16()?;
        for _ in 0..attribute_count {
            let (attr_name, data) = read_attribute(&mut r, &pool)?;
            match attr_name {
                "SourceFile" => source_file = Some(pool.get_utf8(ByteReader::new(data).u16()?)?.to_string()),
                "Signature" => signature = Some(pool.get_utf8(ByteReader::new(data).u16()?)?.to_string()),
                _ => {}
            }
        }

        Ok(ClassFile {
            major_version,
            access,
            name,
            super_name,
            interfaces,
            fields,
            methods,
            source_file,
            signature,
        })
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn read_attribute<'p, 'd>(r: &mut ByteReader<'d>, pool: &'p ConstantPool) -> Result<(&'p str, &'d [u8])> {
    let name = pool.get_utf8(r.u16()?)?;
    let len = r.u32()? as usize;
    Ok((name, r.bytes(len)?))
}

fn read_method(r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<MethodInfo> {
    let access = AccessFlags::from_bits_retain(r.u16()?);
    let name = pool.get_utf8(r.u16()?)?.to_string();
    let descriptor = pool.get_utf8(r.u16()?)?.to_string();
    let mut method = MethodInfo {
        access,
        name,
        descriptor,
        exceptions: Vec::new(),
        nullable: None,
        parameters: Vec::new(),
        code: None,
    };

    let attribute_count = r.u16()?;
    for _ in 0..attribute_count {
        let (attr_name, data) = read_attribute(r, pool)?;
        let mut a = ByteReader::new(data);
        match attr_name {
            "Code" => {
                let max_stack = a.u16()?;
                let max_locals = a.u16()?;
                let len = a.u32()? as usize;
                let bytes = a.bytes(len)?.to_vec();
                method.code = Some(CodeInfo {
                    max_stack,
                    max_locals,
                    bytes,
                });
            }
            "Exceptions" => {
                let count = a.u16()?;
                for _ in 0..count {
                    method.exceptions.push(pool.get_class_name(a.u16()?)?.to_string());
                }
            }
            "RuntimeVisibleAnnotations" => {
                method.nullable = read_annotations(&mut a, pool)?;
            }
            "RuntimeVisibleParameterAnnotations" => {
                let count = a.u8()?;
                for _ in 0..count {
                    method.parameters.push(read_annotations(&mut a, pool)?);
                }
            }
            _ => {}
        }
    }
    Ok(method)
}
