//! Errors raised while assembling, writing or reading class files.

use thiserror::Error;

/// Errors produced by the class file writer and reader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassFileError {
    // =========================================================================
    // Writing
    // =========================================================================
    #[error("constant pool overflow: more than 65535 entries")]
    PoolOverflow,

    #[error("label L{0} is referenced but never bound")]
    UnboundLabel(u32),

    #[error("label L{0} is bound twice")]
    LabelRebound(u32),

    #[error("branch offset {0} does not fit in 16 bits")]
    BranchOutOfRange(i64),

    #[error("method code exceeds 65535 bytes")]
    CodeTooLarge,

    #[error("operand stack underflow at instruction {index}")]
    StackUnderflow { index: usize },

    #[error("inconsistent stack depth at instruction {index}: {first} vs {second}")]
    StackMismatch { index: usize, first: u16, second: u16 },

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    // =========================================================================
    // Reading
    // =========================================================================
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("invalid classfile magic: 0x{0:08x}")]
    InvalidMagic(u32),

    #[error("invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),

    #[error("invalid constant pool tag: {0}")]
    InvalidConstantPoolTag(u8),

    #[error("constant pool type mismatch at index {index}: expected {expected}")]
    ConstantPoolTypeMismatch { index: u16, expected: &'static str },

    #[error("invalid modified UTF-8 constant")]
    InvalidModifiedUtf8,

    #[error("malformed {0} attribute")]
    MalformedAttribute(&'static str),
}

pub type Result<T> = std::result::Result<T, ClassFileError>;

/// Errors raised while indexing or loading from the class path.
#[derive(Debug, Error)]
pub enum ClasspathError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("classfile error in {class}: {source}")]
    ClassFile {
        class: String,
        #[source]
        source: ClassFileError,
    },
}
