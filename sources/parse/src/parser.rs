use anyhow::Result;
use bytes::Bytes;
use support::bytes_ext::SafeBuf;
use tracing::trace;

use crate::attributes::Attributes;
use crate::classfile::{ClassFile, Field, Fields, MetaData, Method, Methods};
use crate::error::ParseError;
use crate::flags::{ClassFileAccessFlags, FieldAccessFlags, MethodAccessFlags};
use crate::pool::{
    ChildRefData, ClassData, ConstantPool, Data, DoubleData, DynamicData, FloatData, IntegerData,
    LongData, MethodHandleData, MethodTypeData, ModuleData, NameAndTypeData, PackageData,
    PoolEntry, StringData, Tag, Utf8Data,
};
use crate::MAGIC;

pub struct Parser {
    bytes: Bytes,
}

impl Parser {
    pub fn new(data: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(data),
        }
    }

    pub fn parse(&mut self) -> Result<ClassFile> {
        let magic = self.bytes.try_get_u32()?;
        if magic != MAGIC {
            return Err(ParseError::NotAClassFile { found: magic }.into());
        }

        let minor_version = self.bytes.try_get_u16()?;
        let major_version = self.bytes.try_get_u16()?;
        trace!("class file version {}.{}", major_version, minor_version);

        let constant_pool = self.parse_constant_pool()?;
        trace!("constant pool has {} slots", constant_pool.size());

        let access_flags = ClassFileAccessFlags::from_bits(self.bytes.try_get_u16()?);
        let this_class = constant_pool.class_name(self.bytes.try_get_u16()?)?;
        let super_class = constant_pool.optional_class_name(self.bytes.try_get_u16()?)?;

        let interfaces = self.parse_interfaces(&constant_pool)?;
        let fields = self.parse_fields(&constant_pool)?;
        let methods = self.parse_methods(&constant_pool)?;
        let attributes = Attributes::parse(&mut self.bytes, &constant_pool)?;

        if !self.bytes.is_empty() {
            return Err(ParseError::TrailingBytes(self.bytes.len()).into());
        }

        Ok(ClassFile {
            constant_pool,
            meta_data: MetaData {
                minor_version,
                major_version,
            },
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn parse_constant_pool(&mut self) -> Result<ConstantPool> {
        let count = self.bytes.try_get_u16()?;

        // Slot 0 never exists in the file.
        let mut entries: Vec<Option<PoolEntry>> = vec![None];
        while entries.len() < count as usize {
            let tag = Tag::from_tag_byte(self.bytes.try_get_u8()?)?;
            let data = self.parse_pool_data(tag)?;
            let wide = matches!(tag, Tag::Long | Tag::Double);

            entries.push(Some(PoolEntry { tag, data }));
            if wide {
                // Longs and doubles consume the following slot too.
                entries.push(None);
            }
        }

        Ok(ConstantPool::from_entries(entries))
    }

    fn parse_pool_data(&mut self, tag: Tag) -> Result<Data> {
        let bytes = &mut self.bytes;

        Ok(match tag {
            Tag::Utf8 => {
                let length = bytes.try_get_u16()?;
                Data::Utf8(Utf8Data {
                    bytes: bytes.try_take_bytes(length as usize)?,
                })
            }
            Tag::Integer => Data::Integer(IntegerData {
                value: bytes.try_get_i32()?,
            }),
            Tag::Float => Data::Float(FloatData {
                value: bytes.try_get_f32()?,
            }),
            Tag::Long => Data::Long(LongData {
                value: bytes.try_get_i64()?,
            }),
            Tag::Double => Data::Double(DoubleData {
                value: bytes.try_get_f64()?,
            }),
            Tag::Class => Data::Class(ClassData {
                name_index: bytes.try_get_u16()?,
            }),
            Tag::String => Data::String(StringData {
                utf8_index: bytes.try_get_u16()?,
            }),
            Tag::FieldRef | Tag::MethodRef | Tag::InterfaceMethodRef => {
                Data::ChildRef(ChildRefData {
                    class_index: bytes.try_get_u16()?,
                    name_and_type_index: bytes.try_get_u16()?,
                })
            }
            Tag::NameAndType => Data::NameAndType(NameAndTypeData {
                name_index: bytes.try_get_u16()?,
                descriptor_index: bytes.try_get_u16()?,
            }),
            Tag::MethodHandle => Data::MethodHandle(MethodHandleData {
                reference_kind: bytes.try_get_u8()?,
                reference_index: bytes.try_get_u16()?,
            }),
            Tag::MethodType => Data::MethodType(MethodTypeData {
                descriptor_index: bytes.try_get_u16()?,
            }),
            Tag::Dynamic | Tag::InvokeDynamic => Data::Dynamic(DynamicData {
                bootstrap_method_attr_index: bytes.try_get_u16()?,
                name_and_type_index: bytes.try_get_u16()?,
            }),
            Tag::Module => Data::Module(ModuleData {
                name_index: bytes.try_get_u16()?,
            }),
            Tag::Package => Data::Package(PackageData {
                name_index: bytes.try_get_u16()?,
            }),
        })
    }

    fn parse_interfaces(&mut self, pool: &ConstantPool) -> Result<Vec<String>> {
        let count = self.bytes.try_get_u16()?;

        let mut interfaces = Vec::with_capacity(count as usize);
        for _ in 0..count {
            interfaces.push(pool.class_name(self.bytes.try_get_u16()?)?);
        }

        Ok(interfaces)
    }

    fn parse_fields(&mut self, pool: &ConstantPool) -> Result<Fields> {
        let count = self.bytes.try_get_u16()?;

        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let flags = FieldAccessFlags::from_bits(self.bytes.try_get_u16()?);
            let name = pool.utf8(self.bytes.try_get_u16()?)?;
            let descriptor = pool.utf8(self.bytes.try_get_u16()?)?;
            let attributes = Attributes::parse(&mut self.bytes, pool)?;

            trace!("field {} {}", descriptor, name);
            values.push(Field {
                flags,
                name,
                descriptor,
                attributes,
            });
        }

        Ok(Fields { values })
    }

    fn parse_methods(&mut self, pool: &ConstantPool) -> Result<Methods> {
        let count = self.bytes.try_get_u16()?;

        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let flags = MethodAccessFlags::from_bits(self.bytes.try_get_u16()?);
            let name = pool.utf8(self.bytes.try_get_u16()?)?;
            let descriptor = pool.utf8(self.bytes.try_get_u16()?)?;
            let attributes = Attributes::parse(&mut self.bytes, pool)?;

            trace!("method {} {}", name, descriptor);
            values.push(Method {
                flags,
                name,
                descriptor,
                attributes,
            });
        }

        Ok(Methods { values })
    }
}
