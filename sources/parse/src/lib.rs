pub mod annotation;
pub mod attributes;
pub mod bytecode;
pub mod classfile;
pub mod error;
pub mod flags;
pub mod parser;
pub mod pool;
pub mod stackmap;

/// The fixed magic constant every class file must start with.
pub const MAGIC: u32 = 0xCAFE_BABE;
