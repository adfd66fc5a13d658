//! Access and property flags for classes, fields and methods.

use bitflags::bitflags;

bitflags! {
    /// `access_flags` as stored in a class file.
    ///
    /// Some bits are shared between contexts (`SYNCHRONIZED` / `SUPER`,
    /// `VOLATILE` / `BRIDGE`, `TRANSIENT` / `VARARGS`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const BRIDGE = 0x0040;
        const TRANSIENT = 0x0080;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

impl AccessFlags {
    #[inline]
    pub fn is_public(self) -> bool {
        self.contains(AccessFlags::PUBLIC)
    }

    #[inline]
    pub fn is_private(self) -> bool {
        self.contains(AccessFlags::PRIVATE)
    }

    #[inline]
    pub fn is_static(self) -> bool {
        self.contains(AccessFlags::STATIC)
    }

    #[inline]
    pub fn is_final(self) -> bool {
        self.contains(AccessFlags::FINAL)
    }

    #[inline]
    pub fn is_interface(self) -> bool {
        self.contains(AccessFlags::INTERFACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_raw_bits() {
        let flags = AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL;
        assert_eq!(flags.bits(), 0x0019);
        assert_eq!(AccessFlags::from_bits_retain(0x0019), flags);
        assert!(flags.is_static() && flags.is_public() && !flags.is_private());
    }
}
