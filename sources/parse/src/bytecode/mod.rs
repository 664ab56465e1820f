use std::collections::BTreeMap;

use anyhow::Result;
use bytes::{Buf, Bytes};
use support::bytes_ext::SafeBuf;

use crate::error::ParseError;
use crate::pool::{ClassChildReference, ConstantPool, DynamicReference, LoadableConstant};

mod opcode;
pub use opcode::Opcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveArrayType {
    Boolean,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
}

impl PrimitiveArrayType {
    pub fn from_byte(byte: u8) -> Result<Self, ParseError> {
        Ok(match byte {
            4 => PrimitiveArrayType::Boolean,
            5 => PrimitiveArrayType::Char,
            6 => PrimitiveArrayType::Float,
            7 => PrimitiveArrayType::Double,
            8 => PrimitiveArrayType::Byte,
            9 => PrimitiveArrayType::Short,
            10 => PrimitiveArrayType::Int,
            11 => PrimitiveArrayType::Long,
            other => Err(ParseError::UnknownArrayType(other))?,
        })
    }
}

/// A decoded instruction. Grouped by operand shape rather than one
/// variant per opcode, so the interpreter matches on shape and then on
/// the opcode inside it. Pool operands arrive already resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// No operands.
    Simple { opcode: Opcode },
    /// `bipush`.
    PushByte { opcode: Opcode, value: i8 },
    /// `sipush`.
    PushShort { opcode: Opcode, value: i16 },
    /// `ldc`, `ldc_w`, `ldc2_w`.
    LoadConstant {
        opcode: Opcode,
        constant: LoadableConstant,
    },
    /// Loads, stores and `ret`. The index is widened so the `wide` form
    /// shares the variant.
    LocalVar { opcode: Opcode, index: u16 },
    /// `iinc`, in both narrow and wide forms.
    LocalVarConst {
        opcode: Opcode,
        index: u16,
        constant: i16,
    },
    /// All conditional and unconditional jumps. The offset is relative
    /// to the opcode byte of this instruction.
    Branch { opcode: Opcode, offset: i32 },
    /// Field access and the plain invokes.
    ChildRef {
        opcode: Opcode,
        reference: ClassChildReference,
    },
    /// `invokeinterface`.
    ChildRefCount {
        opcode: Opcode,
        reference: ClassChildReference,
        count: u8,
    },
    /// `invokedynamic`.
    DynamicRef {
        opcode: Opcode,
        reference: DynamicReference,
    },
    /// `new`, `anewarray`, `checkcast`, `instanceof`.
    ClassRef { opcode: Opcode, class_name: String },
    /// `multianewarray`.
    ClassRefDimensions {
        opcode: Opcode,
        class_name: String,
        dimensions: u8,
    },
    /// `newarray`.
    PrimitiveArray {
        opcode: Opcode,
        array_type: PrimitiveArrayType,
    },
    TableSwitch {
        opcode: Opcode,
        default_offset: i32,
        low: i32,
        high: i32,
        offsets: Vec<i32>,
    },
    LookupSwitch {
        opcode: Opcode,
        default_offset: i32,
        pairs: Vec<(i32, i32)>,
    },
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Simple { opcode }
            | Instruction::PushByte { opcode, .. }
            | Instruction::PushShort { opcode, .. }
            | Instruction::LoadConstant { opcode, .. }
            | Instruction::LocalVar { opcode, .. }
            | Instruction::LocalVarConst { opcode, .. }
            | Instruction::Branch { opcode, .. }
            | Instruction::ChildRef { opcode, .. }
            | Instruction::ChildRefCount { opcode, .. }
            | Instruction::DynamicRef { opcode, .. }
            | Instruction::ClassRef { opcode, .. }
            | Instruction::ClassRefDimensions { opcode, .. }
            | Instruction::PrimitiveArray { opcode, .. }
            | Instruction::TableSwitch { opcode, .. }
            | Instruction::LookupSwitch { opcode, .. } => *opcode,
        }
    }
}

/// Decodes a whole code array into a map keyed by the byte offset of
/// each opcode. Branch targets are offsets into this map, so keeping the
/// keys in file terms lets jumps resolve with a plain lookup.
pub fn decode_instructions(
    pool: &ConstantPool,
    code: &[u8],
) -> Result<BTreeMap<i32, Instruction>> {
    let length = code.len();
    let mut bytes = Bytes::copy_from_slice(code);
    let mut instructions = BTreeMap::new();

    while !bytes.is_empty() {
        let offset = length - bytes.remaining();
        if offset > i16::MAX as usize {
            // pc math elsewhere is signed 16-bit, so anything past that
            // could never be addressed.
            return Err(ParseError::CodeTooLarge { offset }.into());
        }

        let opcode = Opcode::from_byte(bytes.try_get_u8()?)?;
        let instruction = read_operands(pool, opcode, &mut bytes, length)?;
        instructions.insert(offset as i32, instruction);
    }

    Ok(instructions)
}

/// Maps each instruction offset to its ordinal position. Useful when
/// printing code, where "the 3rd instruction" reads better than a raw
/// byte offset.
pub fn index_table(instructions: &BTreeMap<i32, Instruction>) -> BTreeMap<i32, usize> {
    instructions
        .keys()
        .enumerate()
        .map(|(position, offset)| (*offset, position))
        .collect()
}

fn read_operands(
    pool: &ConstantPool,
    opcode: Opcode,
    bytes: &mut Bytes,
    code_length: usize,
) -> Result<Instruction> {
    use Opcode::*;

    Ok(match opcode {
        Bipush => Instruction::PushByte {
            opcode,
            value: bytes.try_get_i8()?,
        },
        Sipush => Instruction::PushShort {
            opcode,
            value: bytes.try_get_i16()?,
        },
        Ldc => Instruction::LoadConstant {
            opcode,
            constant: pool.loadable(bytes.try_get_u8()? as u16)?,
        },
        LdcW | Ldc2W => Instruction::LoadConstant {
            opcode,
            constant: pool.loadable(bytes.try_get_u16()?)?,
        },
        Iload | Lload | Fload | Dload | Aload | Istore | Lstore | Fstore | Dstore | Astore
        | Ret => Instruction::LocalVar {
            opcode,
            index: bytes.try_get_u8()? as u16,
        },
        Iinc => Instruction::LocalVarConst {
            opcode,
            index: bytes.try_get_u8()? as u16,
            constant: bytes.try_get_i8()? as i16,
        },
        Ifeq | Ifne | Iflt | Ifge | Ifgt | Ifle | IfIcmpeq | IfIcmpne | IfIcmplt | IfIcmpge
        | IfIcmpgt | IfIcmple | IfAcmpeq | IfAcmpne | Goto | Jsr | Ifnull | Ifnonnull => {
            Instruction::Branch {
                opcode,
                offset: bytes.try_get_i16()? as i32,
            }
        }
        GotoW | JsrW => Instruction::Branch {
            opcode,
            offset: bytes.try_get_i32()?,
        },
        Getstatic | Putstatic | Getfield | Putfield | Invokevirtual | Invokespecial
        | Invokestatic => Instruction::ChildRef {
            opcode,
            reference: pool.child_ref(bytes.try_get_u16()?)?,
        },
        Invokeinterface => {
            let reference = pool.child_ref(bytes.try_get_u16()?)?;
            let count = bytes.try_get_u8()?;

            // The fourth operand byte must be zero.
            let padding = bytes.try_get_u8()?;
            if padding != 0 {
                return Err(ParseError::NonZeroOperandPadding {
                    opcode,
                    found: padding as u16,
                }
                .into());
            }

            Instruction::ChildRefCount {
                opcode,
                reference,
                count,
            }
        }
        Invokedynamic => {
            let reference = pool.dynamic_ref(bytes.try_get_u16()?)?;

            // The trailing two operand bytes must be zero.
            let padding = bytes.try_get_u16()?;
            if padding != 0 {
                return Err(ParseError::NonZeroOperandPadding {
                    opcode,
                    found: padding,
                }
                .into());
            }

            Instruction::DynamicRef { opcode, reference }
        }
        New | Anewarray | Checkcast | Instanceof => Instruction::ClassRef {
            opcode,
            class_name: pool.class_name(bytes.try_get_u16()?)?,
        },
        Multianewarray => Instruction::ClassRefDimensions {
            opcode,
            class_name: pool.class_name(bytes.try_get_u16()?)?,
            dimensions: bytes.try_get_u8()?,
        },
        Newarray => Instruction::PrimitiveArray {
            opcode,
            array_type: PrimitiveArrayType::from_byte(bytes.try_get_u8()?)?,
        },
        Tableswitch => {
            skip_switch_padding(bytes, code_length)?;

            let default_offset = bytes.try_get_i32()?;
            let low = bytes.try_get_i32()?;
            let high = bytes.try_get_i32()?;
            if high < low {
                return Err(ParseError::InvalidSwitchBounds { low, high }.into());
            }

            // Widened so hostile bounds cannot overflow, and checked
            // against the bytes left before anything is allocated.
            let count = (high as i64) - (low as i64) + 1;
            let count = checked_table_size(bytes, count, 4)?;

            let mut offsets = Vec::with_capacity(count);
            for _ in 0..count {
                offsets.push(bytes.try_get_i32()?);
            }

            Instruction::TableSwitch {
                opcode,
                default_offset,
                low,
                high,
                offsets,
            }
        }
        Lookupswitch => {
            skip_switch_padding(bytes, code_length)?;

            let default_offset = bytes.try_get_i32()?;
            let count = bytes.try_get_i32()?;
            if count < 0 {
                return Err(ParseError::InvalidSwitchBounds {
                    low: 0,
                    high: count,
                }
                .into());
            }

            let count = checked_table_size(bytes, count as i64, 8)?;

            let mut pairs = Vec::with_capacity(count);
            for _ in 0..count {
                let key = bytes.try_get_i32()?;
                pairs.push((key, bytes.try_get_i32()?));
            }

            Instruction::LookupSwitch {
                opcode,
                default_offset,
                pairs,
            }
        }
        Wide => {
            let target = Opcode::from_byte(bytes.try_get_u8()?)?;
            match target {
                Iload | Lload | Fload | Dload | Aload | Istore | Lstore | Fstore | Dstore
                | Astore | Ret => Instruction::LocalVar {
                    opcode: target,
                    index: bytes.try_get_u16()?,
                },
                Iinc => Instruction::LocalVarConst {
                    opcode: target,
                    index: bytes.try_get_u16()?,
                    constant: bytes.try_get_i16()?,
                },
                other => return Err(ParseError::InvalidWideTarget(other).into()),
            }
        }
        _ => Instruction::Simple { opcode },
    })
}

/// Refuses a declared switch table that could not fit in the bytes that
/// are actually left. The count is attacker controlled, so this has to
/// happen before any allocation sized by it.
fn checked_table_size(bytes: &Bytes, entries: i64, entry_width: usize) -> Result<usize> {
    if entries > (bytes.remaining() / entry_width) as i64 {
        return Err(ParseError::OversizedSwitchTable {
            entries,
            remaining: bytes.remaining(),
        }
        .into());
    }

    Ok(entries as usize)
}

/// Switch operands start at the next 4-byte boundary, measured from the
/// start of the code array.
fn skip_switch_padding(bytes: &mut Bytes, code_length: usize) -> Result<()> {
    while (code_length - bytes.remaining()) % 4 != 0 {
        bytes.try_get_u8()?;
    }

    Ok(())
}
