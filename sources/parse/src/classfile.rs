use anyhow::Result;

use crate::attributes::Attributes;
use crate::flags::{ClassFileAccessFlags, FieldAccessFlags, MethodAccessFlags};
use crate::parser::Parser;
use crate::pool::ConstantPool;

#[derive(Debug, Clone, Copy)]
pub struct MetaData {
    pub minor_version: u16,
    pub major_version: u16,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub flags: FieldAccessFlags,
    pub name: String,
    pub descriptor: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone)]
pub struct Fields {
    pub values: Vec<Field>,
}

impl Fields {
    pub fn locate(&self, name: &str) -> Option<&Field> {
        self.values.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct Method {
    pub flags: MethodAccessFlags,
    pub name: String,
    pub descriptor: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone)]
pub struct Methods {
    pub values: Vec<Method>,
}

impl Methods {
    pub fn locate(&self, name: &str, descriptor: &str) -> Option<&Method> {
        self.values
            .iter()
            .find(|method| method.name == name && method.descriptor == descriptor)
    }
}

/// A fully parsed class file. Names that the format stores as pool
/// indices arrive here already resolved to strings.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub constant_pool: ConstantPool,
    pub meta_data: MetaData,
    pub access_flags: ClassFileAccessFlags,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Fields,
    pub methods: Methods,
    pub attributes: Attributes,
}

impl ClassFile {
    pub fn read(data: &[u8]) -> Result<Self> {
        Parser::new(data).parse()
    }
}
