use std::any::Any;
use std::fmt;
use std::sync::Arc;

use enum_as_inner::EnumAsInner;

/// An opaque object handle. The sandbox never allocates real Java
/// objects, so anything a native hands out is carried around untouched
/// until another native downcasts it.
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn Any + Send + Sync>);

impl ObjectRef {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:p})", Arc::as_ptr(&self.0))
    }
}

/// A value on the operand stack.
#[derive(Debug, Clone, EnumAsInner)]
pub enum Value {
    Null,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Arc<String>),
    /// A class constant pushed by `ldc`.
    Class(String),
    Reference(ObjectRef),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Class(_) => "class",
            Value::Reference(_) => "reference",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_downcasts_references() {
        let value = Value::Reference(ObjectRef::new(42u64));
        let reference = value.as_reference().unwrap();

        assert_eq!(reference.downcast_ref::<u64>(), Some(&42));
        assert_eq!(reference.downcast_ref::<i32>(), None);
    }

    #[test]
    fn it_names_types() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Int(1).type_name(), "int");
    }
}
