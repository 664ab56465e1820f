use bitflags::bitflags;
use tracing::warn;

/// Wraps a [`bitflags`] set with a lenient constructor. Compilers do emit
/// bits the format does not define, so unknown bits are logged and dropped
/// rather than treated as a fault.
macro_rules! impl_flags {
    ($name: ident, $flagname: ident) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub struct $name {
            pub flags: $flagname,
        }

        impl $name {
            pub fn from_bits(bits: u16) -> Self {
                let flags = $flagname::from_bits(bits).unwrap_or_else(|| {
                    warn!(
                        "unknown bits in {} ({:#06x}), truncating",
                        stringify!($flagname),
                        bits
                    );
                    $flagname::from_bits_truncate(bits)
                });

                Self { flags }
            }

            pub fn has(&self, flag: $flagname) -> bool {
                self.flags.contains(flag)
            }
        }
    };
}

bitflags! {
    pub struct ClassFileAccessFlag: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

bitflags! {
    pub struct FieldAccessFlag: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

bitflags! {
    pub struct MethodAccessFlag: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    pub struct InnerClassAccessFlag: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

bitflags! {
    pub struct MethodParameterAccessFlag: u16 {
        const FINAL = 0x0010;
        const SYNTHETIC = 0x1000;
        const MANDATED = 0x8000;
    }
}

impl_flags!(ClassFileAccessFlags, ClassFileAccessFlag);
impl_flags!(FieldAccessFlags, FieldAccessFlag);
impl_flags!(MethodAccessFlags, MethodAccessFlag);
impl_flags!(InnerClassAccessFlags, InnerClassAccessFlag);
impl_flags!(MethodParameterAccessFlags, MethodParameterAccessFlag);
