//! The `water/runtime/annotation/Nullable` annotation.
//!
//! Nullability is not part of JVM descriptors, so it is carried as a
//! runtime-visible annotation on fields, methods (return value) and
//! parameters. For arrays the `d` element lists the nullable dimensions:
//! `-1` for the array itself, `-2` for the root element type and `n >= 0`
//! for nested dimension `n`.

use crate::bytes::{ByteReader, PutBytes};
use crate::error::{ClassFileError, Result};
use crate::pool::{Constant, ConstantPool};

pub const NULLABLE_DESCRIPTOR: &str = "Lwater/runtime/annotation/Nullable;";

/// Marker for the array itself in [`Nullable::dimensions`].
pub const ARRAY_DIMENSION: i32 = -1;
/// Marker for the root element type in [`Nullable::dimensions`].
pub const ELEMENT_DIMENSION: i32 = -2;

/// A decoded `@Nullable` annotation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Nullable {
    pub dimensions: Vec<i32>,
}

impl Nullable {
    pub fn new(dimensions: Vec<i32>) -> Self {
        Self { dimensions }
    }

    pub fn array_nullable(&self) -> bool {
        self.dimensions.contains(&ARRAY_DIMENSION)
    }

    pub fn element_nullable(&self) -> bool {
        self.dimensions.contains(&ELEMENT_DIMENSION)
    }
}

/// Append one annotation structure to `out`.
pub(crate) fn write_annotation(pool: &mut ConstantPool, out: &mut Vec<u8>, nullable: &Nullable) -> Result<()> {
    out.put_u16(pool.utf8(NULLABLE_DESCRIPTOR)?);
    if nullable.dimensions.is_empty() {
        out.put_u16(0);
        return Ok(());
    }
    out.put_u16(1);
    out.put_u16(pool.utf8("d")?);
    out.put_u8(b'[');
    out.put_u16(nullable.dimensions.len() as u16);
    for &dim in &nullable.dimensions {
        out.put_u8(b'I');
        out.put_u16(pool.integer(dim)?);
    }
    Ok(())
}

/// Read a `num_annotations` table and return the `@Nullable` entry if
/// present.
pub(crate) fn read_annotations(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Option<Nullable>> {
    let count = reader.u16()?;
    let mut found = None;
    for _ in 0..count {
        if let Some(nullable) = read_annotation(reader, pool)? {
            found = Some(nullable);
        }
    }
    Ok(found)
}

fn read_annotation(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Option<Nullable>> {
    let type_name = pool.get_utf8(reader.u16()?)?;
    let is_nullable = type_name == NULLABLE_DESCRIPTOR;
    let mut dimensions = Vec::new();
    let pairs = reader.u16()?;
    for _ in 0..pairs {
        let name = pool.get_utf8(reader.u16()?)?;
        if is_nullable && name == "d" {
            if reader.u8()? != b'[' {
                return Err(ClassFileError::MalformedAttribute("Nullable"));
            }
            let len = reader.u16()?;
            for _ in 0..len {
                if reader.u8()? != b'I' {
                    return Err(ClassFileError::MalformedAttribute("Nullable"));
                }
                let index = reader.u16()?;
                match pool.get(index)? {
                    Constant::Integer(v) => dimensions.push(*v),
                    _ => {
                        return Err(ClassFileError::ConstantPoolTypeMismatch {
                            index,
                            expected: "Integer",
                        });
                    }
                }
            }
        } else {
            skip_element_value(reader)?;
        }
    }
    Ok(is_nullable.then(|| Nullable::new(dimensions)))
}

fn skip_element_value(reader: &mut ByteReader<'_>) -> Result<()> {
    match reader.u8()? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => {
            reader.u16()?;
        }
        b'e' => {
            reader.u16()?;
            reader.u16()?;
        }
        b'@' => {
            reader.u16()?;
            let pairs = reader.u16()?;
            for _ in 0..pairs {
                reader.u16()?;
                skip_element_value(reader)?;
            }
        }
        b'[' => {
            let len = reader.u16()?;
            for _ in 0..len {
                skip_element_value(reader)?;
            }
        }
        _ => return Err(ClassFileError::MalformedAttribute("RuntimeVisibleAnnotations")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(nullable: &Nullable) -> Option<Nullable> {
        let mut pool = ConstantPool::new();
        let mut out = vec![0, 1];
        write_annotation(&mut pool, &mut out, nullable).unwrap();
        let mut reader = ByteReader::new(&out);
        read_annotations(&mut reader, &pool).unwrap()
    }

    #[test]
    fn plain_nullable_has_no_dimensions() {
        let decoded = round_trip(&Nullable::default()).unwrap();
        assert!(decoded.dimensions.is_empty());
    }

    #[test]
    fn array_dimensions_survive() {
        let decoded = round_trip(&Nullable::new(vec![ARRAY_DIMENSION, ELEMENT_DIMENSION])).unwrap();
        assert!(decoded.array_nullable());
        assert!(decoded.element_nullable());
    }

    #[test]
    fn foreign_annotations_are_skipped() {
        let mut pool = ConstantPool::new();
        let mut out = vec![0, 2];
        // @Deprecated(since = "1", forRemoval = true, tags = {"a"})
        out.put_u16(pool.utf8("Ljava/lang/Deprecated;").unwrap());
        out.put_u16(3);
        out.put_u16(pool.utf8("since").unwrap());
        out.put_u8(b's');
        out.put_u16(pool.utf8("1").unwrap());
        out.put_u16(pool.utf8("forRemoval").unwrap());
        out.put_u8(b'Z');
        out.put_u16(pool.integer(1).unwrap());
        out.put_u16(pool.utf8("tags").unwrap());
        out.put_u8(b'[');
        out.put_u16(1);
        out.put_u8(b's');
        out.put_u16(pool.utf8("a").unwrap());
        write_annotation(&mut pool, &mut out, &Nullable::new(vec![0])).unwrap();

        let mut reader = ByteReader::new(&out);
        let decoded = read_annotations(&mut reader, &pool).unwrap().unwrap();
        assert_eq!(decoded.dimensions, vec![0]);
        assert!(reader.is_empty());
    }
}
