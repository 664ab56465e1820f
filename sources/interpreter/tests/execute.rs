use std::sync::Arc;

use anyhow::Result;
use interpreter::error::ExecutionError;
use interpreter::native::{
    ClassImplementation, ClassResolver, NativeClass, NativeMethod, SandboxResolver,
};
use interpreter::value::{ObjectRef, Value};
use interpreter::SandboxedVm;
use parking_lot::Mutex;
use parse::classfile::{ClassFile, Method};

mod util;
use util::Assembler;

static PRINTED: Mutex<Vec<String>> = Mutex::new(Vec::new());
static SUMS: Mutex<Vec<i32>> = Mutex::new(Vec::new());
static PICKS: Mutex<Vec<i32>> = Mutex::new(Vec::new());

fn resolver() -> SandboxResolver {
    let mut resolver = SandboxResolver::new();

    resolver.register(
        NativeClass::new("java/lang/System")
            .static_field("out", Value::Reference(ObjectRef::new("stdout"))),
    );

    resolver.register(NativeClass::new("java/io/PrintStream").method(
        "println",
        "(Ljava/lang/String;)V",
        |_vm, _receiver, arguments| {
            PRINTED.lock().push(arguments[0].as_string().unwrap().to_string());
            Ok(None)
        },
    ));

    resolver.register(NativeClass::new("sandbox/Sum").method(
        "record",
        "(I)V",
        |_vm, _receiver, arguments| {
            SUMS.lock().push(*arguments[0].as_int().unwrap());
            Ok(None)
        },
    ));

    resolver.register(NativeClass::new("sandbox/Pick").method(
        "record",
        "(I)V",
        |_vm, _receiver, arguments| {
            PICKS.lock().push(*arguments[0].as_int().unwrap());
            Ok(None)
        },
    ));

    resolver
}

fn run(method: &Method) -> Result<Option<Value>> {
    SandboxedVm::new(Box::new(resolver())).execute(method)
}

fn main_method(class: &ClassFile) -> &Method {
    class
        .methods
        .locate("main", "([Ljava/lang/String;)V")
        .expect("no main method")
}

#[test]
fn it_runs_hello_world() -> Result<()> {
    let mut assembler = Assembler::new();
    let out = assembler.field_ref("java/lang/System", "out", "Ljava/io/PrintStream;");
    let text = assembler.string("hello world");
    let println = assembler.method_ref("java/io/PrintStream", "println", "(Ljava/lang/String;)V");

    // getstatic, ldc, invokevirtual, return
    let mut code = vec![0xb2];
    code.extend_from_slice(&out.to_be_bytes());
    code.extend_from_slice(&[0x12, text as u8, 0xb6]);
    code.extend_from_slice(&println.to_be_bytes());
    code.push(0xb1);

    let attribute = assembler.code_attribute(2, 1, &code);
    assembler.method(0x0009, "main", "([Ljava/lang/String;)V", &[attribute]);

    let class = ClassFile::read(&assembler.finish())?;
    let method = main_method(&class);

    let instructions = match method.attributes.find("Code") {
        Some(parse::attributes::Attribute::Code(code)) => &code.instructions,
        other => panic!("wrong attribute: {:?}", other),
    };
    assert_eq!(instructions.len(), 4);

    run(method)?;

    let printed = PRINTED.lock();
    assert_eq!(*printed, vec!["hello world".to_string()]);

    Ok(())
}

#[test]
fn it_computes_arithmetic() -> Result<()> {
    let mut assembler = Assembler::new();
    let record = assembler.method_ref("sandbox/Sum", "record", "(I)V");

    // bipush 40, iconst_2, iadd, invokestatic, return
    let mut code = vec![0x10, 40, 0x05, 0x60, 0xb8];
    code.extend_from_slice(&record.to_be_bytes());
    code.push(0xb1);

    let attribute = assembler.code_attribute(2, 1, &code);
    assembler.method(0x0009, "main", "([Ljava/lang/String;)V", &[attribute]);

    let class = ClassFile::read(&assembler.finish())?;
    run(main_method(&class))?;

    assert_eq!(*SUMS.lock(), vec![42]);

    Ok(())
}

#[test]
fn it_takes_branches() -> Result<()> {
    let mut assembler = Assembler::new();
    let record = assembler.method_ref("sandbox/Pick", "record", "(I)V");

    // 2 < 3, so the iconst_1 arm feeds the recorder.
    let mut code = vec![
        0x05, // 0: iconst_2
        0x06, // 1: iconst_3
        0xa1, 0x00, 0x07, // 2: if_icmplt -> 9
        0x03, // 5: iconst_0
        0xa7, 0x00, 0x04, // 6: goto -> 10
        0x04, // 9: iconst_1
        0xb8, // 10: invokestatic
    ];
    code.extend_from_slice(&record.to_be_bytes());
    code.push(0xb1); // 13: return

    let attribute = assembler.code_attribute(2, 1, &code);
    assembler.method(0x0009, "main", "([Ljava/lang/String;)V", &[attribute]);

    let class = ClassFile::read(&assembler.finish())?;
    run(main_method(&class))?;

    assert_eq!(*PICKS.lock(), vec![1]);

    Ok(())
}

#[test]
fn it_yields_returned_values() -> Result<()> {
    let mut assembler = Assembler::new();

    // bipush 40, iconst_2, iadd, ireturn
    let attribute = assembler.code_attribute(2, 1, &[0x10, 40, 0x05, 0x60, 0xac]);
    assembler.method(0x0009, "answer", "()I", &[attribute]);

    let class = ClassFile::read(&assembler.finish())?;
    let method = class.methods.locate("answer", "()I").expect("no method");

    let value = run(method)?.expect("no return value");
    assert_eq!(value.as_int(), Some(&42));

    Ok(())
}

#[test]
fn it_halts_when_running_off_the_map() -> Result<()> {
    let mut assembler = Assembler::new();

    // No return; execution just runs out of instructions.
    let attribute = assembler.code_attribute(1, 1, &[0x03, 0x57]);
    assembler.method(0x0009, "main", "([Ljava/lang/String;)V", &[attribute]);

    let class = ClassFile::read(&assembler.finish())?;
    assert!(run(main_method(&class))?.is_none());

    Ok(())
}

/// Resolves `System.out` only when the requested descriptor matches.
struct DescriptorStrictSystem;

impl ClassImplementation for DescriptorStrictSystem {
    fn name(&self) -> &str {
        "java/lang/System"
    }

    fn static_field(&self, name: &str, descriptor: &str) -> Option<Value> {
        (name == "out" && descriptor == "Ljava/io/PrintStream;").then_some(Value::Null)
    }

    fn method(&self, _name: &str, _descriptor: &str) -> Option<NativeMethod> {
        None
    }
}

struct DescriptorStrictResolver;

impl ClassResolver for DescriptorStrictResolver {
    fn resolve(&self, class_name: &str) -> Option<Arc<dyn ClassImplementation>> {
        (class_name == "java/lang/System")
            .then(|| Arc::new(DescriptorStrictSystem) as Arc<dyn ClassImplementation>)
    }
}

#[test]
fn it_hands_field_descriptors_to_natives() -> Result<()> {
    let mut assembler = Assembler::new();
    let out = assembler.field_ref("java/lang/System", "out", "Ljava/io/PrintStream;");

    // getstatic, pop, return
    let mut code = vec![0xb2];
    code.extend_from_slice(&out.to_be_bytes());
    code.extend_from_slice(&[0x57, 0xb1]);

    let attribute = assembler.code_attribute(1, 1, &code);
    assembler.method(0x0009, "main", "([Ljava/lang/String;)V", &[attribute]);

    let class = ClassFile::read(&assembler.finish())?;
    let method = main_method(&class);

    // The strict native only answers for the exact descriptor, so a
    // successful run proves the descriptor crossed the boundary.
    SandboxedVm::new(Box::new(DescriptorStrictResolver)).execute(method)?;

    Ok(())
}

#[test]
fn it_faults_on_unresolved_classes() -> Result<()> {
    let mut assembler = Assembler::new();
    let field = assembler.field_ref("no/Such", "thing", "I");

    let mut code = vec![0xb2];
    code.extend_from_slice(&field.to_be_bytes());
    code.push(0xb1);

    let attribute = assembler.code_attribute(1, 1, &code);
    assembler.method(0x0009, "main", "([Ljava/lang/String;)V", &[attribute]);

    let class = ClassFile::read(&assembler.finish())?;
    let error = run(main_method(&class)).unwrap_err();

    match error.downcast_ref::<ExecutionError>() {
        Some(ExecutionError::UnresolvedClass(name)) => assert_eq!(name, "no/Such"),
        other => panic!("wrong error: {:?}", other),
    }

    Ok(())
}

#[test]
fn it_faults_on_unsupported_instructions() -> Result<()> {
    let mut assembler = Assembler::new();

    // aconst_null, athrow
    let attribute = assembler.code_attribute(1, 1, &[0x01, 0xbf]);
    assembler.method(0x0009, "main", "([Ljava/lang/String;)V", &[attribute]);

    let class = ClassFile::read(&assembler.finish())?;
    let error = run(main_method(&class)).unwrap_err();

    assert!(matches!(
        error.downcast_ref::<ExecutionError>(),
        Some(ExecutionError::UnsupportedInstruction(_))
    ));

    Ok(())
}

#[test]
fn it_requires_exactly_one_code_attribute() -> Result<()> {
    let mut assembler = Assembler::new();
    let first = assembler.code_attribute(1, 1, &[0xb1]);
    let second = assembler.code_attribute(1, 1, &[0xb1]);
    assembler.method(0x0009, "main", "([Ljava/lang/String;)V", &[first, second]);
    assembler.method(0x0401, "stub", "()V", &[]);

    let class = ClassFile::read(&assembler.finish())?;

    let error = run(main_method(&class)).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ExecutionError>(),
        Some(ExecutionError::DuplicateCode { count: 2, .. })
    ));

    let stub = class.methods.locate("stub", "()V").expect("no stub");
    let error = run(stub).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ExecutionError>(),
        Some(ExecutionError::NoCode { .. })
    ));

    Ok(())
}
