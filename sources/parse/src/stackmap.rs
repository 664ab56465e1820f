use anyhow::Result;
use bytes::Bytes;
use support::bytes_ext::SafeBuf;

use crate::error::ParseError;
use crate::pool::ConstantPool;

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,
    UninitializedThis,
    Object { class_name: String },
    Uninitialized { offset: u16 },
}

impl VerificationType {
    pub fn read(bytes: &mut Bytes, pool: &ConstantPool) -> Result<Self> {
        Ok(match bytes.try_get_u8()? {
            0 => VerificationType::Top,
            1 => VerificationType::Integer,
            2 => VerificationType::Float,
            3 => VerificationType::Double,
            4 => VerificationType::Long,
            5 => VerificationType::Null,
            6 => VerificationType::UninitializedThis,
            7 => VerificationType::Object {
                class_name: pool.class_name(bytes.try_get_u16()?)?,
            },
            8 => VerificationType::Uninitialized {
                offset: bytes.try_get_u16()?,
            },
            other => return Err(ParseError::UnknownVerificationTag(other).into()),
        })
    }

    fn read_many(bytes: &mut Bytes, pool: &ConstantPool, count: u16) -> Result<Vec<Self>> {
        let mut types = Vec::with_capacity(count as usize);
        for _ in 0..count {
            types.push(VerificationType::read(bytes, pool)?);
        }

        Ok(types)
    }
}

/// One StackMapTable frame. The frame type byte encodes both the shape
/// and, for the compact forms, the offset delta.
#[derive(Debug, Clone, PartialEq)]
pub enum StackMapFrame {
    Same {
        offset_delta: u16,
    },
    SameLocalsOneStackItem {
        offset_delta: u16,
        stack: VerificationType,
    },
    SameLocalsOneStackItemExtended {
        offset_delta: u16,
        stack: VerificationType,
    },
    Chop {
        offset_delta: u16,
        absent_locals: u8,
    },
    SameExtended {
        offset_delta: u16,
    },
    Append {
        offset_delta: u16,
        locals: Vec<VerificationType>,
    },
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType>,
        stack: Vec<VerificationType>,
    },
}

impl StackMapFrame {
    pub fn read(bytes: &mut Bytes, pool: &ConstantPool) -> Result<Self> {
        let frame_type = bytes.try_get_u8()?;

        Ok(match frame_type {
            0..=63 => StackMapFrame::Same {
                offset_delta: frame_type as u16,
            },
            64..=127 => StackMapFrame::SameLocalsOneStackItem {
                offset_delta: (frame_type - 64) as u16,
                stack: VerificationType::read(bytes, pool)?,
            },
            128..=246 => return Err(ParseError::ReservedFrameType(frame_type).into()),
            247 => StackMapFrame::SameLocalsOneStackItemExtended {
                offset_delta: bytes.try_get_u16()?,
                stack: VerificationType::read(bytes, pool)?,
            },
            248..=250 => StackMapFrame::Chop {
                offset_delta: bytes.try_get_u16()?,
                absent_locals: 251 - frame_type,
            },
            251 => StackMapFrame::SameExtended {
                offset_delta: bytes.try_get_u16()?,
            },
            252..=254 => {
                let offset_delta = bytes.try_get_u16()?;
                let locals =
                    VerificationType::read_many(bytes, pool, (frame_type - 251) as u16)?;

                StackMapFrame::Append {
                    offset_delta,
                    locals,
                }
            }
            255 => {
                let offset_delta = bytes.try_get_u16()?;
                let local_count = bytes.try_get_u16()?;
                let locals = VerificationType::read_many(bytes, pool, local_count)?;
                let stack_count = bytes.try_get_u16()?;
                let stack = VerificationType::read_many(bytes, pool, stack_count)?;

                StackMapFrame::Full {
                    offset_delta,
                    locals,
                    stack,
                }
            }
        })
    }

    pub fn read_many(bytes: &mut Bytes, pool: &ConstantPool) -> Result<Vec<Self>> {
        let count = bytes.try_get_u16()?;
        let mut frames = Vec::with_capacity(count as usize);
        for _ in 0..count {
            frames.push(StackMapFrame::read(bytes, pool)?);
        }

        Ok(frames)
    }
}
