use std::collections::BTreeMap;

use anyhow::Result;
use bytes::Bytes;
use support::bytes_ext::SafeBuf;

use crate::annotation::{Annotation, ElementValue};
use crate::bytecode::{decode_instructions, Instruction};
use crate::error::ParseError;
use crate::flags::{InnerClassAccessFlags, MethodParameterAccessFlags};
use crate::pool::{ConstantPool, LoadableConstant, MethodHandle, NameAndType};
use crate::stackmap::StackMapFrame;

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// `None` is the catch-all entry that `finally` compiles to.
    pub catch_type: Option<String>,
}

/// The body of a Code attribute. The raw code array is kept alongside
/// the decoded form because stack maps and line numbers speak in byte
/// offsets.
#[derive(Debug, Clone)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub instructions: BTreeMap<i32, Instruction>,
    pub exception_table: Vec<ExceptionEntry>,
    pub attributes: Attributes,
}

impl CodeAttribute {
    fn read(bytes: &mut Bytes, pool: &ConstantPool) -> Result<Self> {
        let max_stack = bytes.try_get_u16()?;
        let max_locals = bytes.try_get_u16()?;

        let code_length = bytes.try_get_u32()?;
        let code = bytes.try_take_bytes(code_length as usize)?;
        let instructions = decode_instructions(pool, &code)?;

        let exception_count = bytes.try_get_u16()?;
        let mut exception_table = Vec::with_capacity(exception_count as usize);
        for _ in 0..exception_count {
            exception_table.push(ExceptionEntry {
                start_pc: bytes.try_get_u16()?,
                end_pc: bytes.try_get_u16()?,
                handler_pc: bytes.try_get_u16()?,
                catch_type: pool.optional_class_name(bytes.try_get_u16()?)?,
            });
        }

        let attributes = Attributes::parse(bytes, pool)?;

        Ok(Self {
            max_stack,
            max_locals,
            code,
            instructions,
            exception_table,
            attributes,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InnerClassEntry {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub flags: InnerClassAccessFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub descriptor: String,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariableTypeEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub signature: String,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodParameterEntry {
    pub name: Option<String>,
    pub flags: MethodParameterAccessFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapMethodEntry {
    pub method: MethodHandle,
    pub arguments: Vec<LoadableConstant>,
}

#[derive(Debug, Clone)]
pub struct RecordComponent {
    pub name: String,
    pub descriptor: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone)]
pub enum Attribute {
    ConstantValue {
        value: LoadableConstant,
    },
    Code(CodeAttribute),
    StackMapTable {
        frames: Vec<StackMapFrame>,
    },
    Exceptions {
        classes: Vec<String>,
    },
    InnerClasses {
        entries: Vec<InnerClassEntry>,
    },
    EnclosingMethod {
        class: String,
        method: Option<NameAndType>,
    },
    Synthetic,
    Signature {
        signature: String,
    },
    SourceFile {
        source_file: String,
    },
    LineNumberTable {
        entries: Vec<LineNumberEntry>,
    },
    LocalVariableTable {
        entries: Vec<LocalVariableEntry>,
    },
    LocalVariableTypeTable {
        entries: Vec<LocalVariableTypeEntry>,
    },
    Deprecated,
    RuntimeVisibleAnnotations {
        annotations: Vec<Annotation>,
    },
    RuntimeInvisibleAnnotations {
        annotations: Vec<Annotation>,
    },
    RuntimeVisibleParameterAnnotations {
        parameters: Vec<Vec<Annotation>>,
    },
    RuntimeInvisibleParameterAnnotations {
        parameters: Vec<Vec<Annotation>>,
    },
    /// Type annotations are recognised and length-checked, but the
    /// target/path structure inside is kept as raw bytes.
    TypeAnnotations {
        visible: bool,
        data: Vec<u8>,
    },
    AnnotationDefault {
        value: ElementValue,
    },
    BootstrapMethods {
        methods: Vec<BootstrapMethodEntry>,
    },
    MethodParameters {
        entries: Vec<MethodParameterEntry>,
    },
    NestHost {
        host_class: String,
    },
    NestMembers {
        classes: Vec<String>,
    },
    Record {
        components: Vec<RecordComponent>,
    },
    PermittedSubclasses {
        classes: Vec<String>,
    },
}

impl Attribute {
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::ConstantValue { .. } => "ConstantValue",
            Attribute::Code(_) => "Code",
            Attribute::StackMapTable { .. } => "StackMapTable",
            Attribute::Exceptions { .. } => "Exceptions",
            Attribute::InnerClasses { .. } => "InnerClasses",
            Attribute::EnclosingMethod { .. } => "EnclosingMethod",
            Attribute::Synthetic => "Synthetic",
            Attribute::Signature { .. } => "Signature",
            Attribute::SourceFile { .. } => "SourceFile",
            Attribute::LineNumberTable { .. } => "LineNumberTable",
            Attribute::LocalVariableTable { .. } => "LocalVariableTable",
            Attribute::LocalVariableTypeTable { .. } => "LocalVariableTypeTable",
            Attribute::Deprecated => "Deprecated",
            Attribute::RuntimeVisibleAnnotations { .. } => "RuntimeVisibleAnnotations",
            Attribute::RuntimeInvisibleAnnotations { .. } => "RuntimeInvisibleAnnotations",
            Attribute::RuntimeVisibleParameterAnnotations { .. } => {
                "RuntimeVisibleParameterAnnotations"
            }
            Attribute::RuntimeInvisibleParameterAnnotations { .. } => {
                "RuntimeInvisibleParameterAnnotations"
            }
            Attribute::TypeAnnotations { visible: true, .. } => "RuntimeVisibleTypeAnnotations",
            Attribute::TypeAnnotations { visible: false, .. } => "RuntimeInvisibleTypeAnnotations",
            Attribute::AnnotationDefault { .. } => "AnnotationDefault",
            Attribute::BootstrapMethods { .. } => "BootstrapMethods",
            Attribute::MethodParameters { .. } => "MethodParameters",
            Attribute::NestHost { .. } => "NestHost",
            Attribute::NestMembers { .. } => "NestMembers",
            Attribute::Record { .. } => "Record",
            Attribute::PermittedSubclasses { .. } => "PermittedSubclasses",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Attributes {
    pub values: Vec<Attribute>,
}

impl Attributes {
    /// Reads an attribute table. Each body is sliced out by its declared
    /// length and decoded in isolation, so one attribute can never read
    /// into its neighbour.
    pub fn parse(bytes: &mut Bytes, pool: &ConstantPool) -> Result<Self> {
        let count = bytes.try_get_u16()?;

        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name = pool.utf8(bytes.try_get_u16()?)?;
            let length = bytes.try_get_u32()?;
            let payload = Bytes::from(bytes.try_take_bytes(length as usize)?);

            values.push(decode_attribute(&name, payload, pool)?);
        }

        Ok(Self { values })
    }

    pub fn find(&self, name: &str) -> Option<&Attribute> {
        self.values.iter().find(|attribute| attribute.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.values.iter()
    }
}

fn decode_attribute(name: &str, mut data: Bytes, pool: &ConstantPool) -> Result<Attribute> {
    let attribute = match name {
        "ConstantValue" => Attribute::ConstantValue {
            value: pool.loadable(data.try_get_u16()?)?,
        },
        "Code" => Attribute::Code(CodeAttribute::read(&mut data, pool)?),
        "StackMapTable" => Attribute::StackMapTable {
            frames: StackMapFrame::read_many(&mut data, pool)?,
        },
        "Exceptions" => Attribute::Exceptions {
            classes: read_class_list(&mut data, pool)?,
        },
        "InnerClasses" => {
            let count = data.try_get_u16()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                entries.push(InnerClassEntry {
                    inner_class: pool.class_name(data.try_get_u16()?)?,
                    outer_class: pool.optional_class_name(data.try_get_u16()?)?,
                    inner_name: pool.optional_utf8(data.try_get_u16()?)?,
                    flags: InnerClassAccessFlags::from_bits(data.try_get_u16()?),
                });
            }

            Attribute::InnerClasses { entries }
        }
        "EnclosingMethod" => Attribute::EnclosingMethod {
            class: pool.class_name(data.try_get_u16()?)?,
            method: pool.optional_name_and_type(data.try_get_u16()?)?,
        },
        "Synthetic" => {
            ensure_empty(name, &data)?;
            Attribute::Synthetic
        }
        "Signature" => Attribute::Signature {
            signature: pool.utf8(data.try_get_u16()?)?,
        },
        "SourceFile" => Attribute::SourceFile {
            source_file: pool.utf8(data.try_get_u16()?)?,
        },
        "LineNumberTable" => {
            let count = data.try_get_u16()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                entries.push(LineNumberEntry {
                    start_pc: data.try_get_u16()?,
                    line_number: data.try_get_u16()?,
                });
            }

            Attribute::LineNumberTable { entries }
        }
        "LocalVariableTable" => {
            let count = data.try_get_u16()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                entries.push(LocalVariableEntry {
                    start_pc: data.try_get_u16()?,
                    length: data.try_get_u16()?,
                    name: pool.utf8(data.try_get_u16()?)?,
                    descriptor: pool.utf8(data.try_get_u16()?)?,
                    index: data.try_get_u16()?,
                });
            }

            Attribute::LocalVariableTable { entries }
        }
        "LocalVariableTypeTable" => {
            let count = data.try_get_u16()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                entries.push(LocalVariableTypeEntry {
                    start_pc: data.try_get_u16()?,
                    length: data.try_get_u16()?,
                    name: pool.utf8(data.try_get_u16()?)?,
                    signature: pool.utf8(data.try_get_u16()?)?,
                    index: data.try_get_u16()?,
                });
            }

            Attribute::LocalVariableTypeTable { entries }
        }
        "Deprecated" => {
            ensure_empty(name, &data)?;
            Attribute::Deprecated
        }
        "RuntimeVisibleAnnotations" => Attribute::RuntimeVisibleAnnotations {
            annotations: Annotation::read_many(&mut data, pool)?,
        },
        "RuntimeInvisibleAnnotations" => Attribute::RuntimeInvisibleAnnotations {
            annotations: Annotation::read_many(&mut data, pool)?,
        },
        "RuntimeVisibleParameterAnnotations" => Attribute::RuntimeVisibleParameterAnnotations {
            parameters: read_parameter_annotations(&mut data, pool)?,
        },
        "RuntimeInvisibleParameterAnnotations" => {
            Attribute::RuntimeInvisibleParameterAnnotations {
                parameters: read_parameter_annotations(&mut data, pool)?,
            }
        }
        "RuntimeVisibleTypeAnnotations" => Attribute::TypeAnnotations {
            visible: true,
            data: data.split_to(data.len()).to_vec(),
        },
        "RuntimeInvisibleTypeAnnotations" => Attribute::TypeAnnotations {
            visible: false,
            data: data.split_to(data.len()).to_vec(),
        },
        "AnnotationDefault" => Attribute::AnnotationDefault {
            value: ElementValue::read(&mut data, pool)?,
        },
        "BootstrapMethods" => {
            let count = data.try_get_u16()?;
            let mut methods = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let method = pool.method_handle(data.try_get_u16()?)?;

                let argument_count = data.try_get_u16()?;
                let mut arguments = Vec::with_capacity(argument_count as usize);
                for _ in 0..argument_count {
                    arguments.push(pool.loadable(data.try_get_u16()?)?);
                }

                methods.push(BootstrapMethodEntry { method, arguments });
            }

            Attribute::BootstrapMethods { methods }
        }
        "MethodParameters" => {
            let count = data.try_get_u8()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                entries.push(MethodParameterEntry {
                    name: pool.optional_utf8(data.try_get_u16()?)?,
                    flags: MethodParameterAccessFlags::from_bits(data.try_get_u16()?),
                });
            }

            Attribute::MethodParameters { entries }
        }
        "NestHost" => Attribute::NestHost {
            host_class: pool.class_name(data.try_get_u16()?)?,
        },
        "NestMembers" => Attribute::NestMembers {
            classes: read_class_list(&mut data, pool)?,
        },
        "Record" => {
            let count = data.try_get_u16()?;
            let mut components = Vec::with_capacity(count as usize);
            for _ in 0..count {
                components.push(RecordComponent {
                    name: pool.utf8(data.try_get_u16()?)?,
                    descriptor: pool.utf8(data.try_get_u16()?)?,
                    attributes: Attributes::parse(&mut data, pool)?,
                });
            }

            Attribute::Record { components }
        }
        "PermittedSubclasses" => Attribute::PermittedSubclasses {
            classes: read_class_list(&mut data, pool)?,
        },
        other => return Err(ParseError::UnsupportedAttribute(other.to_string()).into()),
    };

    if !data.is_empty() {
        return Err(ParseError::TrailingAttributeBytes {
            name: name.to_string(),
            remaining: data.len(),
        }
        .into());
    }

    Ok(attribute)
}

fn ensure_empty(name: &str, data: &Bytes) -> Result<()> {
    if !data.is_empty() {
        return Err(ParseError::UnexpectedAttributeData {
            name: name.to_string(),
            length: data.len(),
        }
        .into());
    }

    Ok(())
}

fn read_class_list(data: &mut Bytes, pool: &ConstantPool) -> Result<Vec<String>> {
    let count = data.try_get_u16()?;
    let mut classes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        classes.push(pool.class_name(data.try_get_u16()?)?);
    }

    Ok(classes)
}

fn read_parameter_annotations(
    data: &mut Bytes,
    pool: &ConstantPool,
) -> Result<Vec<Vec<Annotation>>> {
    let count = data.try_get_u8()?;
    let mut parameters = Vec::with_capacity(count as usize);
    for _ in 0..count {
        parameters.push(Annotation::read_many(data, pool)?);
    }

    Ok(parameters)
}
