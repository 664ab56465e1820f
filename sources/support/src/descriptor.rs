use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use anyhow::{anyhow, Result};
use enum_as_inner::EnumAsInner;

/// <BaseType> ::= 'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 'V'
#[derive(EnumAsInner, Debug, PartialEq, Eq, Clone, Hash)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Void,
}

impl BaseType {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'B' => BaseType::Byte,
            'C' => BaseType::Char,
            'D' => BaseType::Double,
            'F' => BaseType::Float,
            'I' => BaseType::Int,
            'J' => BaseType::Long,
            'S' => BaseType::Short,
            'Z' => BaseType::Boolean,
            'V' => BaseType::Void,
            _ => return None,
        })
    }

    fn as_char(&self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
            BaseType::Void => 'V',
        }
    }
}

/// <ObjectType> ::= 'L' <ClassName> ';'
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct ObjectType {
    pub class_name: String,
}

/// <ArrayType> ::= '[' <FieldType>
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct ArrayType {
    pub field_type: Box<FieldType>,
}

#[derive(EnumAsInner, Debug, PartialEq, Eq, Clone, Hash)]
pub enum FieldType {
    Base(BaseType),
    Object(ObjectType),
    Array(ArrayType),
}

impl FieldType {
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut chars = descriptor.chars().peekable();
        let ty = take_field_type(&mut chars)?;

        if chars.next().is_some() {
            return Err(anyhow!(
                "trailing characters in field descriptor '{}'",
                descriptor
            ));
        }

        Ok(ty)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(base) => write!(f, "{}", base.as_char()),
            FieldType::Object(object) => write!(f, "L{};", object.class_name),
            FieldType::Array(array) => write!(f, "[{}", array.field_type),
        }
    }
}

/// <MethodType> ::= '(' { <FieldType> } ')' <FieldType>
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct MethodType {
    pub parameters: Vec<FieldType>,
    pub return_type: FieldType,
}

impl MethodType {
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut chars = descriptor.chars().peekable();

        if chars.next() != Some('(') {
            return Err(anyhow!("method descriptor '{}' must start with '('", descriptor));
        }

        let mut parameters = Vec::new();
        while chars.peek().ok_or_else(|| anyhow!("unterminated parameter list"))? != &')' {
            parameters.push(take_field_type(&mut chars)?);
        }

        // Consume the ')'
        chars.next();

        let return_type = take_field_type(&mut chars)?;
        if chars.next().is_some() {
            return Err(anyhow!(
                "trailing characters in method descriptor '{}'",
                descriptor
            ));
        }

        Ok(Self {
            parameters,
            return_type,
        })
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for param in &self.parameters {
            write!(f, "{}", param)?;
        }
        write!(f, "){}", self.return_type)
    }
}

fn take_field_type(chars: &mut Peekable<Chars>) -> Result<FieldType> {
    let first = chars
        .next()
        .ok_or_else(|| anyhow!("descriptor ended before a field type"))?;

    if let Some(base) = BaseType::from_char(first) {
        return Ok(FieldType::Base(base));
    }

    match first {
        'L' => {
            let mut class_name = String::new();
            loop {
                match chars.next() {
                    Some(';') => break,
                    Some(c) => class_name.push(c),
                    None => return Err(anyhow!("class reference was not terminated")),
                }
            }

            Ok(FieldType::Object(ObjectType { class_name }))
        }
        '[' => Ok(FieldType::Array(ArrayType {
            field_type: Box::new(take_field_type(chars)?),
        })),
        c => Err(anyhow!("'{}' does not start a field descriptor", c)),
    }
}
