use thiserror::Error;

use crate::bytecode::Opcode;

/// Structural faults in a class file. Anything that parses but fails a
/// format rule lands here; plain out-of-bytes conditions come back as
/// the buffer's own errors.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("expected magic 0xCAFEBABE, got {found:#010x}")]
    NotAClassFile { found: u32 },

    #[error("unknown constant pool tag {0}")]
    UnknownConstantTag(u8),

    #[error("constant pool index 0 is reserved")]
    NullPoolIndex,

    #[error("constant pool has no entry at index {index}")]
    MissingPoolEntry { index: u16 },

    #[error("expected a {expected} constant at index {index}, found {found}")]
    UnexpectedPoolTag {
        index: u16,
        expected: &'static str,
        found: String,
    },

    #[error("constant at index {index} ({found}) is not loadable")]
    NotLoadable { index: u16, found: String },

    #[error("unsupported attribute \"{0}\"")]
    UnsupportedAttribute(String),

    #[error("attribute \"{name}\" left {remaining} bytes of its payload unread")]
    TrailingAttributeBytes { name: String, remaining: usize },

    #[error("attribute \"{name}\" must be empty, but carries {length} bytes")]
    UnexpectedAttributeData { name: String, length: usize },

    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error("opcode {0:?} cannot follow a wide prefix")]
    InvalidWideTarget(Opcode),

    #[error("unknown primitive array type {0}")]
    UnknownArrayType(u8),

    #[error("malformed switch bounds (low {low}, high {high})")]
    InvalidSwitchBounds { low: i32, high: i32 },

    #[error("switch table declares {entries} entries, but only {remaining} bytes remain")]
    OversizedSwitchTable { entries: i64, remaining: usize },

    #[error("{opcode:?} operand padding must be zero, found {found:#06x}")]
    NonZeroOperandPadding { opcode: Opcode, found: u16 },

    #[error("stack map frame type {0} is reserved")]
    ReservedFrameType(u8),

    #[error("unknown verification type tag {0}")]
    UnknownVerificationTag(u8),

    #[error("unknown annotation element tag {0:#04x}")]
    UnknownElementTag(u8),

    #[error("instruction at offset {offset} exceeds the signed 16-bit addressing range")]
    CodeTooLarge { offset: usize },

    #[error("{0} bytes left over after the class body")]
    TrailingBytes(usize),
}
