//! Class file writer.

use crate::access::AccessFlags;
use crate::annotation::{write_annotation, Nullable};
use crate::bytes::PutBytes;
use crate::code::CodeBuilder;
use crate::error::{ClassFileError, Result};
use crate::pool::ConstantPool;

pub const MAGIC: u32 = 0xCAFE_BABE;
/// Java 5 class files: verified by type inference, no `StackMapTable`.
pub const MAJOR_VERSION: u16 = 49;

/// A field declaration.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub access: AccessFlags,
    pub name: String,
    pub descriptor: String,
    pub nullable: Option<Nullable>,
}

impl FieldDef {
    pub fn new(access: AccessFlags, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access,
            name: name.into(),
            descriptor: descriptor.into(),
            nullable: None,
        }
    }
}

/// A method declaration with its (optional) body.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub access: AccessFlags,
    pub name: String,
    pub descriptor: String,
    pub code: Option<CodeBuilder>,
    pub exceptions: Vec<String>,
    /// Nullability of the return value.
    pub nullable: Option<Nullable>,
    /// Nullability per parameter; empty when no parameter is annotated.
    pub parameters: Vec<Option<Nullable>>,
}

impl MethodDef {
    pub fn new(access: AccessFlags, name: impl Into<String>, descriptor: impl Into<String>, code: CodeBuilder) -> Self {
        Self {
            access,
            name: name.into(),
            descriptor: descriptor.into(),
            code: Some(code),
            exceptions: Vec::new(),
            nullable: None,
            parameters: Vec::new(),
        }
    }
}

/// Accumulates the members of one class and serializes it.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    access: AccessFlags,
    name: String,
    super_name: String,
    interfaces: Vec<String>,
    fields: Vec<FieldDef>,
    methods: Vec<MethodDef>,
    source_file: Option<String>,
    signature: Option<String>,
}

impl ClassBuilder {
    pub fn new(access: AccessFlags, name: impl Into<String>, super_name: impl Into<String>) -> Self {
        Self {
            access,
            name: name.into(),
            super_name: super_name.into(),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            source_file: None,
            signature: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn super_name(&self) -> &str {
        &self.super_name
    }

    pub fn access(&self) -> AccessFlags {
        self.access
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    pub fn add_interface(&mut self, name: impl Into<String>) {
        self.interfaces.push(name.into());
    }

    pub fn set_source_file(&mut self, file: impl Into<String>) {
        self.source_file = Some(file.into());
    }

    /// Generic signature of the class (used for `Enum<E>` supertypes).
    pub fn set_signature(&mut self, signature: impl Into<String>) {
        self.signature = Some(signature.into());
    }

    pub fn add_field(&mut self, field: FieldDef) {
        self.fields.push(field);
    }

    pub fn add_method(&mut self, method: MethodDef) {
        self.methods.push(method);
    }

    pub fn has_method(&self, name: &str, descriptor: &str) -> bool {
        self.methods.iter().any(|m| m.name == name && m.descriptor == descriptor)
    }

    /// Serialize the class.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn finish(&self) -> Result<Vec<u8>> {
        let mut pool = ConstantPool::new();
        let mut body = Vec::new();

        body.put_u16(self.access.bits());
        body.put_u16(pool.class(&self.name)?);
        body.put_u16(pool.class(&self.super_name)?);
        body.put_u16(self.interfaces.len() as u16);
        for interface in &self.interfaces {
            body.put_u16(pool.class(interface)?);
        }

        body.put_u16(self.fields.len() as u16);
        for field in &self.fields {
            body.put_u16(field.access.bits());
            body.put_u16(pool.utf8(&field.name)?);
            body.put_u16(pool.utf8(&field.descriptor)?);
            match &field.nullable {
                Some(nullable) => {
                    body.put_u16(1);
                    write_annotations_attribute(&mut pool, &mut body, nullable)?;
                }
                None => body.put_u16(0),
            }
        }

        body.put_u16(self.methods.len() as u16);
        for method in &self.methods {
            write_method(&mut pool, &mut body, method)?;
        }

        let mut attributes = Vec::new();
        let mut count = 0u16;
        if let Some(source) = &self.source_file {
            attributes.put_u16(pool.utf8("SourceFile")?);
            attributes.put_u32(2);
            attributes.put_u16(pool.utf8(source)?);
            count += 1;
        }
        if let Some(signature) = &self.signature {
            attributes.put_u16(pool.utf8("Signature")?);
            attributes.put_u32(2);
            attributes.put_u16(pool.utf8(signature)?);
            count += 1;
        }
        body.put_u16(count);
        body.extend_from_slice(&attributes);

        let mut out = Vec::with_capacity(body.len() + 1024);
        out.put_u32(MAGIC);
        out.put_u16(0);
        out.put_u16(MAJOR_VERSION);
        pool.write(&mut out);
        out.extend_from_slice(&body);

        tracing::debug!(class = %self.name, bytes = out.len(), "finished class");
        Ok(out)
    }
}

fn write_method(pool: &mut ConstantPool, out: &mut Vec<u8>, method: &MethodDef) -> Result<()> {
    out.put_u16(method.access.bits());
    out.put_u16(pool.utf8(&method.name)?);
    out.put_u16(pool.utf8(&method.descriptor)?);

    let mut attributes = Vec::new();
    let mut count = 0u16;

    if let Some(code) = &method.code {
        let assembled = code.assemble(pool).map_err(|e| {
            tracing::error!(method = %method.name, descriptor = %method.descriptor, error = %e, "failed to assemble");
            e
        })?;
        let mut attr = Vec::new();
        attr.put_u16(assembled.max_stack);
        attr.put_u16(assembled.max_locals);
        attr.put_u32(assembled.code.len() as u32);
        attr.extend_from_slice(&assembled.code);
        attr.put_u16(assembled.exception_table.len() as u16);
        for entry in &assembled.exception_table {
            attr.put_u16(entry.start_pc);
            attr.put_u16(entry.end_pc);
            attr.put_u16(entry.handler_pc);
            attr.put_u16(entry.catch_type);
        }
        if assembled.line_numbers.is_empty() {
            attr.put_u16(0);
        } else {
            attr.put_u16(1);
            attr.put_u16(pool.utf8("LineNumberTable")?);
            attr.put_u32(2 + 4 * assembled.line_numbers.len() as u32);
            attr.put_u16(assembled.line_numbers.len() as u16);
            for &(pc, line) in &assembled.line_numbers {
                attr.put_u16(pc);
                attr.put_u16(line);
            }
        }
        write_attribute(pool, &mut attributes, "Code", &attr)?;
        count += 1;
    }

    if !method.exceptions.is_empty() {
        let mut attr = Vec::new();
        attr.put_u16(method.exceptions.len() as u16);
        for exception in &method.exceptions {
            attr.put_u16(pool.class(exception)?);
        }
        write_attribute(pool, &mut attributes, "Exceptions", &attr)?;
        count += 1;
    }

    if let Some(nullable) = &method.nullable {
        write_annotations_attribute(pool, &mut attributes, nullable)?;
        count += 1;
    }

    if method.parameters.iter().any(Option::is_some) {
        let mut attr = Vec::new();
        attr.put_u8(method.parameters.len() as u8);
        for parameter in &method.parameters {
            match parameter {
                Some(nullable) => {
                    attr.put_u16(1);
                    write_annotation(pool, &mut attr, nullable)?;
                }
                None => attr.put_u16(0),
            }
        }
        write_attribute(pool, &mut attributes, "RuntimeVisibleParameterAnnotations", &attr)?;
        count += 1;
    }

    out.put_u16(count);
    out.extend_from_slice(&attributes);
    Ok(())
}

fn write_annotations_attribute(pool: &mut ConstantPool, out: &mut Vec<u8>, nullable: &Nullable) -> Result<()> {
    let mut attr = Vec::new();
    attr.put_u16(1);
    write_annotation(pool, &mut attr, nullable)?;
    write_attribute(pool, out, "RuntimeVisibleAnnotations", &attr)
}

fn write_attribute(pool: &mut ConstantPool, out: &mut Vec<u8>, name: &str, data: &[u8]) -> Result<()> {
    if data.len() > u32::MAX as usize {
        return Err(ClassFileError::CodeTooLarge);
    }
    out.put_u16(pool.utf8(name)?);
    out.put_u32(data.len() as u32);
    out.extend_from_slice(data);
    Ok(())
}
