//! Field and method descriptor helpers.

use crate::error::{ClassFileError, Result};

/// Split a method descriptor into its parameter descriptors and return
/// descriptor.
///
/// ```
/// use water_classfile::descriptor::split_method;
/// let (params, ret) = split_method("(I[Ljava/lang/String;J)V").unwrap();
/// assert_eq!(params, vec!["I", "[Ljava/lang/String;", "J"]);
/// assert_eq!(ret, "V");
/// ```
pub fn split_method(desc: &str) -> Result<(Vec<&str>, &str)> {
    let invalid = || ClassFileError::InvalidDescriptor(desc.to_string());
    let rest = desc.strip_prefix('(').ok_or_else(invalid)?;
    let close = rest.find(')').ok_or_else(invalid)?;
    let mut params = Vec::new();
    let mut args = &rest[..close];
    while !args.is_empty() {
        let len = field_len(args).ok_or_else(invalid)?;
        params.push(&args[..len]);
        args = &args[len..];
    }
    let ret = &rest[close + 1..];
    if ret != "V" && field_len(ret) != Some(ret.len()) {
        return Err(invalid());
    }
    Ok((params, ret))
}

/// Length of the first field descriptor in `s`.
fn field_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while bytes.get(i) == Some(&b'[') {
        i += 1;
    }
    match bytes.get(i)? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => Some(i + 1),
        b'L' => s[i..].find(';').map(|end| i + end + 1),
        _ => None,
    }
}

/// Operand-stack slots taken by a value of the given field descriptor.
pub fn slot_size(desc: &str) -> u16 {
    match desc {
        "V" => 0,
        "J" | "D" => 2,
        _ => 1,
    }
}

/// Total slots taken by the arguments of a method descriptor.
pub fn arg_slots(desc: &str) -> Result<u16> {
    let (params, _) = split_method(desc)?;
    Ok(params.iter().map(|p| slot_size(p)).sum())
}

/// Slots pushed by the return value of a method descriptor.
pub fn return_slots(desc: &str) -> Result<u16> {
    let (_, ret) = split_method(desc)?;
    Ok(slot_size(ret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_wide_arguments_twice() {
        assert_eq!(arg_slots("(IJD)V").unwrap(), 5);
        assert_eq!(arg_slots("()V").unwrap(), 0);
        assert_eq!(return_slots("()J").unwrap(), 2);
        assert_eq!(return_slots("(I)V").unwrap(), 0);
    }

    #[test]
    fn rejects_malformed_descriptors() {
        assert!(split_method("I)V").is_err());
        assert!(split_method("(Ljava/lang/String)V").is_err());
        assert!(split_method("(I)Q").is_err());
    }

    #[test]
    fn splits_nested_arrays() {
        let (params, ret) = split_method("([[IZ)[Ljava/lang/Object;").unwrap();
        assert_eq!(params, vec!["[[I", "Z"]);
        assert_eq!(ret, "[Ljava/lang/Object;");
    }
}
