use anyhow::Result;
use bytes::Bytes;
use support::bytes_ext::SafeBuf;

use crate::error::ParseError;
use crate::pool::ConstantPool;

/// A constant referenced from an annotation element. The tag decides
/// which pool entry type the index must resolve through, so `'s'` points
/// at a bare Utf8 rather than a String constant.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationConstant {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Utf8(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Constant {
        tag: u8,
        value: AnnotationConstant,
    },
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    Class {
        descriptor: String,
    },
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    pub fn read(bytes: &mut Bytes, pool: &ConstantPool) -> Result<Self> {
        let tag = bytes.try_get_u8()?;

        Ok(match tag {
            b'B' | b'C' | b'I' | b'S' | b'Z' => ElementValue::Constant {
                tag,
                value: AnnotationConstant::Integer(pool.integer(bytes.try_get_u16()?)?),
            },
            b'F' => ElementValue::Constant {
                tag,
                value: AnnotationConstant::Float(pool.float(bytes.try_get_u16()?)?),
            },
            b'J' => ElementValue::Constant {
                tag,
                value: AnnotationConstant::Long(pool.long(bytes.try_get_u16()?)?),
            },
            b'D' => ElementValue::Constant {
                tag,
                value: AnnotationConstant::Double(pool.double(bytes.try_get_u16()?)?),
            },
            b's' => ElementValue::Constant {
                tag,
                value: AnnotationConstant::Utf8(pool.utf8(bytes.try_get_u16()?)?),
            },
            b'e' => ElementValue::Enum {
                type_descriptor: pool.utf8(bytes.try_get_u16()?)?,
                const_name: pool.utf8(bytes.try_get_u16()?)?,
            },
            b'c' => ElementValue::Class {
                descriptor: pool.utf8(bytes.try_get_u16()?)?,
            },
            b'@' => ElementValue::Annotation(Box::new(Annotation::read(bytes, pool)?)),
            b'[' => {
                let count = bytes.try_get_u16()?;
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    values.push(ElementValue::read(bytes, pool)?);
                }

                ElementValue::Array(values)
            }
            other => return Err(ParseError::UnknownElementTag(other).into()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub type_descriptor: String,
    pub pairs: Vec<(String, ElementValue)>,
}

impl Annotation {
    pub fn read(bytes: &mut Bytes, pool: &ConstantPool) -> Result<Self> {
        let type_descriptor = pool.utf8(bytes.try_get_u16()?)?;

        let count = bytes.try_get_u16()?;
        let mut pairs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name = pool.utf8(bytes.try_get_u16()?)?;
            pairs.push((name, ElementValue::read(bytes, pool)?));
        }

        Ok(Self {
            type_descriptor,
            pairs,
        })
    }

    pub fn read_many(bytes: &mut Bytes, pool: &ConstantPool) -> Result<Vec<Self>> {
        let count = bytes.try_get_u16()?;
        let mut annotations = Vec::with_capacity(count as usize);
        for _ in 0..count {
            annotations.push(Annotation::read(bytes, pool)?);
        }

        Ok(annotations)
    }
}
