pub mod bytes_ext;
pub mod descriptor;

#[cfg(test)]
mod tests {
    use crate::descriptor::{BaseType, FieldType, MethodType, ObjectType};
    use anyhow::Result;

    #[test]
    fn it_parses_simple_descriptors() -> Result<()> {
        let descriptor = FieldType::parse("Z")?;
        let descriptor = descriptor.into_base().unwrap();

        assert!(descriptor.is_boolean());

        Ok(())
    }

    #[test]
    fn it_parses_array_descriptors() -> Result<()> {
        let descriptor = FieldType::parse("[D")?;
        let descriptor = descriptor.into_array().unwrap();

        let field = descriptor.field_type;
        let field = field.into_base().unwrap();

        assert!(field.is_double());

        Ok(())
    }

    #[test]
    fn it_parses_class_descriptors() -> Result<()> {
        let descriptor = FieldType::parse("Ljava/lang/Object;")?;
        let descriptor = descriptor.into_object().unwrap();

        assert_eq!(descriptor.class_name, "java/lang/Object");

        Ok(())
    }

    #[test]
    fn it_parses_method_descriptors() -> Result<()> {
        let descriptor = MethodType::parse("(IDLjava/lang/Thread;)Ljava/lang/Object;")?;
        assert_eq!(
            descriptor.parameters,
            vec![
                FieldType::Base(BaseType::Int),
                FieldType::Base(BaseType::Double),
                FieldType::Object(ObjectType {
                    class_name: "java/lang/Thread".to_string()
                })
            ]
        );

        assert_eq!(
            descriptor.return_type,
            FieldType::Object(ObjectType {
                class_name: "java/lang/Object".to_string()
            })
        );

        Ok(())
    }

    #[test]
    fn it_rejects_malformed_descriptors() {
        assert!(FieldType::parse("Q").is_err());
        assert!(FieldType::parse("Ljava/lang/Object").is_err());
        assert!(MethodType::parse("IV").is_err());
        assert!(MethodType::parse("(I").is_err());
    }

    #[test]
    fn it_unparses_descriptors() -> Result<()> {
        for descriptor in ["Z", "[D", "Ljava/lang/Object;", "[[Ljava/lang/String;"] {
            assert_eq!(FieldType::parse(descriptor)?.to_string(), descriptor);
        }

        for descriptor in [
            "(IDLjava/lang/Thread;)Ljava/lang/Object;",
            "(Ljava/lang/Object;ILjava/lang/Object;II)V",
            "()V",
        ] {
            assert_eq!(MethodType::parse(descriptor)?.to_string(), descriptor);
        }

        Ok(())
    }
}
