use anyhow::Result;
use enum_as_inner::EnumAsInner;

use crate::error::ParseError;

/// Constant pool tag bytes, as written in the file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    Utf8,
    Integer,
    Float,
    Long,
    Double,
    Class,
    String,
    FieldRef,
    MethodRef,
    InterfaceMethodRef,
    NameAndType,
    MethodHandle,
    MethodType,
    Dynamic,
    InvokeDynamic,
    Module,
    Package,
}

impl Tag {
    pub fn from_tag_byte(byte: u8) -> Result<Self, ParseError> {
        Ok(match byte {
            1 => Tag::Utf8,
            3 => Tag::Integer,
            4 => Tag::Float,
            5 => Tag::Long,
            6 => Tag::Double,
            7 => Tag::Class,
            8 => Tag::String,
            9 => Tag::FieldRef,
            10 => Tag::MethodRef,
            11 => Tag::InterfaceMethodRef,
            12 => Tag::NameAndType,
            15 => Tag::MethodHandle,
            16 => Tag::MethodType,
            17 => Tag::Dynamic,
            18 => Tag::InvokeDynamic,
            19 => Tag::Module,
            20 => Tag::Package,
            other => return Err(ParseError::UnknownConstantTag(other)),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utf8Data {
    pub bytes: Vec<u8>,
}

impl Utf8Data {
    pub fn try_string(&self) -> Result<String> {
        Ok(String::from_utf8(self.bytes.clone())?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegerData {
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatData {
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LongData {
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoubleData {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassData {
    pub name_index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringData {
    pub utf8_index: u16,
}

/// Field, method and interface-method refs share one raw layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRefData {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameAndTypeData {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodHandleData {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodTypeData {
    pub descriptor_index: u16,
}

/// Dynamic and InvokeDynamic share one raw layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicData {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleData {
    pub name_index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageData {
    pub name_index: u16,
}

/// Raw entry payloads. Cross references stay as indices here; the typed
/// accessors on [`ConstantPool`] chase them on demand.
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Data {
    Utf8(Utf8Data),
    Integer(IntegerData),
    Float(FloatData),
    Long(LongData),
    Double(DoubleData),
    Class(ClassData),
    String(StringData),
    ChildRef(ChildRefData),
    NameAndType(NameAndTypeData),
    MethodHandle(MethodHandleData),
    MethodType(MethodTypeData),
    Dynamic(DynamicData),
    Module(ModuleData),
    Package(PackageData),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    pub tag: Tag,
    pub data: Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Field,
    Method,
    InterfaceMethod,
}

/// A resolved NameAndType constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAndType {
    pub name: String,
    pub descriptor: String,
}

/// A resolved field / method / interface-method reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassChildReference {
    pub kind: ChildKind,
    pub class_name: String,
    pub name_and_type: NameAndType,
}

/// A MethodHandle constant. The reference index is left raw because what
/// it points at depends on the kind, and nothing downstream chases it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodHandle {
    pub kind: u8,
    pub reference_index: u16,
}

/// A resolved Dynamic or InvokeDynamic constant.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicReference {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type: NameAndType,
}

/// The constants `ldc` and friends may push, and that attribute bodies
/// such as ConstantValue and BootstrapMethods refer to.
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum LoadableConstant {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    Class(String),
    MethodType(String),
    MethodHandle(MethodHandle),
    Dynamic(DynamicReference),
}

/// The parsed constant pool. Slot 0 and the slot after every long or
/// double hold `None`, which keeps file indices usable directly.
#[derive(Debug, Clone)]
pub struct ConstantPool {
    entries: Vec<Option<PoolEntry>>,
}

impl ConstantPool {
    pub(crate) fn from_entries(entries: Vec<Option<PoolEntry>>) -> Self {
        Self { entries }
    }

    /// Slot count including the reserved ones, matching the file's
    /// `constant_pool_count`.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, index: u16) -> Result<&PoolEntry> {
        if index == 0 {
            return Err(ParseError::NullPoolIndex.into());
        }

        match self.entries.get(index as usize) {
            Some(Some(entry)) => Ok(entry),
            _ => Err(ParseError::MissingPoolEntry { index }.into()),
        }
    }

    fn mismatch(&self, index: u16, expected: &'static str, entry: &PoolEntry) -> anyhow::Error {
        ParseError::UnexpectedPoolTag {
            index,
            expected,
            found: format!("{:?}", entry.tag),
        }
        .into()
    }

    pub fn utf8(&self, index: u16) -> Result<String> {
        let entry = self.entry(index)?;
        match &entry.data {
            Data::Utf8(data) => data.try_string(),
            _ => Err(self.mismatch(index, "Utf8", entry)),
        }
    }

    /// Like [`Self::utf8`], but treats index 0 as absence.
    pub fn optional_utf8(&self, index: u16) -> Result<Option<String>> {
        if index == 0 {
            return Ok(None);
        }

        self.utf8(index).map(Some)
    }

    pub fn integer(&self, index: u16) -> Result<i32> {
        let entry = self.entry(index)?;
        match &entry.data {
            Data::Integer(data) => Ok(data.value),
            _ => Err(self.mismatch(index, "Integer", entry)),
        }
    }

    pub fn float(&self, index: u16) -> Result<f32> {
        let entry = self.entry(index)?;
        match &entry.data {
            Data::Float(data) => Ok(data.value),
            _ => Err(self.mismatch(index, "Float", entry)),
        }
    }

    pub fn long(&self, index: u16) -> Result<i64> {
        let entry = self.entry(index)?;
        match &entry.data {
            Data::Long(data) => Ok(data.value),
            _ => Err(self.mismatch(index, "Long", entry)),
        }
    }

    pub fn double(&self, index: u16) -> Result<f64> {
        let entry = self.entry(index)?;
        match &entry.data {
            Data::Double(data) => Ok(data.value),
            _ => Err(self.mismatch(index, "Double", entry)),
        }
    }

    pub fn class_name(&self, index: u16) -> Result<String> {
        let entry = self.entry(index)?;
        match &entry.data {
            Data::Class(data) => self.utf8(data.name_index),
            _ => Err(self.mismatch(index, "Class", entry)),
        }
    }

    /// Like [`Self::class_name`], but treats index 0 as absence. Used for
    /// `super_class` and catch-all exception handlers.
    pub fn optional_class_name(&self, index: u16) -> Result<Option<String>> {
        if index == 0 {
            return Ok(None);
        }

        self.class_name(index).map(Some)
    }

    pub fn string(&self, index: u16) -> Result<String> {
        let entry = self.entry(index)?;
        match &entry.data {
            Data::String(data) => self.utf8(data.utf8_index),
            _ => Err(self.mismatch(index, "String", entry)),
        }
    }

    pub fn name_and_type(&self, index: u16) -> Result<NameAndType> {
        let entry = self.entry(index)?;
        match &entry.data {
            Data::NameAndType(data) => Ok(NameAndType {
                name: self.utf8(data.name_index)?,
                descriptor: self.utf8(data.descriptor_index)?,
            }),
            _ => Err(self.mismatch(index, "NameAndType", entry)),
        }
    }

    pub fn optional_name_and_type(&self, index: u16) -> Result<Option<NameAndType>> {
        if index == 0 {
            return Ok(None);
        }

        self.name_and_type(index).map(Some)
    }

    pub fn child_ref(&self, index: u16) -> Result<ClassChildReference> {
        let entry = self.entry(index)?;
        let kind = match entry.tag {
            Tag::FieldRef => ChildKind::Field,
            Tag::MethodRef => ChildKind::Method,
            Tag::InterfaceMethodRef => ChildKind::InterfaceMethod,
            _ => return Err(self.mismatch(index, "FieldRef/MethodRef/InterfaceMethodRef", entry)),
        };

        let data = entry.data.as_child_ref().unwrap();
        Ok(ClassChildReference {
            kind,
            class_name: self.class_name(data.class_index)?,
            name_and_type: self.name_and_type(data.name_and_type_index)?,
        })
    }

    pub fn method_handle(&self, index: u16) -> Result<MethodHandle> {
        let entry = self.entry(index)?;
        match &entry.data {
            Data::MethodHandle(data) => Ok(MethodHandle {
                kind: data.reference_kind,
                reference_index: data.reference_index,
            }),
            _ => Err(self.mismatch(index, "MethodHandle", entry)),
        }
    }

    pub fn dynamic_ref(&self, index: u16) -> Result<DynamicReference> {
        let entry = self.entry(index)?;
        match &entry.data {
            Data::Dynamic(data) => Ok(DynamicReference {
                bootstrap_method_attr_index: data.bootstrap_method_attr_index,
                name_and_type: self.name_and_type(data.name_and_type_index)?,
            }),
            _ => Err(self.mismatch(index, "Dynamic/InvokeDynamic", entry)),
        }
    }

    pub fn loadable(&self, index: u16) -> Result<LoadableConstant> {
        let entry = self.entry(index)?;
        Ok(match &entry.data {
            Data::Integer(data) => LoadableConstant::Integer(data.value),
            Data::Float(data) => LoadableConstant::Float(data.value),
            Data::Long(data) => LoadableConstant::Long(data.value),
            Data::Double(data) => LoadableConstant::Double(data.value),
            Data::String(data) => LoadableConstant::String(self.utf8(data.utf8_index)?),
            Data::Class(data) => LoadableConstant::Class(self.utf8(data.name_index)?),
            Data::MethodType(data) => {
                LoadableConstant::MethodType(self.utf8(data.descriptor_index)?)
            }
            Data::MethodHandle(_) => LoadableConstant::MethodHandle(self.method_handle(index)?),
            Data::Dynamic(_) if entry.tag == Tag::Dynamic => {
                LoadableConstant::Dynamic(self.dynamic_ref(index)?)
            }
            _ => {
                return Err(ParseError::NotLoadable {
                    index,
                    found: format!("{:?}", entry.tag),
                }
                .into())
            }
        })
    }
}
