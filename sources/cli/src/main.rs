use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Parser;
use interpreter::native::{NativeClass, SandboxResolver};
use interpreter::value::{ObjectRef, Value};
use interpreter::SandboxedVm;
use parse::attributes::Attribute;
use parse::classfile::ClassFile;
use parse::flags::MethodAccessFlag;
use support::descriptor::{FieldType, MethodType};
use tracing::{info, Level};
use tracing_subscriber::fmt;

use crate::args::{Cli, Command};

mod args;

fn main() -> Result<()> {
    let args = Cli::parse();

    let format = fmt::format()
        .with_ansi(true)
        .without_time()
        .with_level(true)
        .with_target(false)
        .with_thread_names(false)
        .with_source_location(false)
        .compact();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::TRACE } else { Level::INFO })
        .event_format(format)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Inspect { path } => inspect(&path),
        Command::Run {
            path,
            method,
            descriptor,
        } => run(&path, &method, &descriptor),
    }
}

fn read_class(path: &Path) -> Result<ClassFile> {
    let data = fs::read(path)?;
    ClassFile::read(&data)
}

fn inspect(path: &Path) -> Result<()> {
    let class = read_class(path)?;

    println!(
        "class {} (version {}.{})",
        class.this_class, class.meta_data.major_version, class.meta_data.minor_version
    );
    if let Some(super_class) = &class.super_class {
        println!("  extends {}", super_class);
    }
    for interface in &class.interfaces {
        println!("  implements {}", interface);
    }
    println!("  constant pool: {} slots", class.constant_pool.size());

    for field in &class.fields.values {
        println!("  field {} {}", FieldType::parse(&field.descriptor)?, field.name);
    }

    for method in &class.methods.values {
        let descriptor = MethodType::parse(&method.descriptor)?;
        match method.attributes.find("Code") {
            Some(Attribute::Code(code)) => println!(
                "  method {}{} ({} instructions)",
                method.name,
                descriptor,
                code.instructions.len()
            ),
            _ => println!("  method {}{}", method.name, descriptor),
        }
    }

    Ok(())
}

fn run(path: &Path, name: &str, descriptor: &str) -> Result<()> {
    let class = read_class(path)?;
    let method = class.methods.locate(name, descriptor).ok_or_else(|| {
        anyhow!(
            "{} has no method {}{}",
            class.this_class,
            name,
            descriptor
        )
    })?;

    // The sandbox has no way to conjure a receiver.
    if !method.flags.has(MethodAccessFlag::STATIC) {
        return Err(anyhow!(
            "{}.{}{} is not static",
            class.this_class,
            name,
            descriptor
        ));
    }

    info!("running {}.{}{}", class.this_class, name, descriptor);
    let result = SandboxedVm::new(Box::new(system_resolver())).execute(method)?;
    if let Some(value) = result {
        info!("method returned {:?}", value);
    }

    Ok(())
}

/// The few pieces of `java.lang` a freestanding class can print through.
fn system_resolver() -> SandboxResolver {
    let mut resolver = SandboxResolver::new();

    resolver.register(
        NativeClass::new("java/lang/System")
            .static_field("out", Value::Reference(ObjectRef::new(Stdout))),
    );

    resolver.register(
        NativeClass::new("java/io/PrintStream")
            .method("println", "(Ljava/lang/String;)V", println_string)
            .method("println", "(I)V", println_int)
            .method("println", "(J)V", println_long)
            .method("println", "(Z)V", println_bool)
            .method("println", "(C)V", println_char)
            .method("println", "(F)V", println_float)
            .method("println", "(D)V", println_double)
            .method("println", "()V", println_empty),
    );

    resolver
}

struct Stdout;

fn println_string(
    _vm: &mut SandboxedVm,
    _receiver: Value,
    arguments: Vec<Value>,
) -> Result<Option<Value>> {
    match &arguments[0] {
        Value::String(text) => println!("{}", text),
        Value::Null => println!("null"),
        other => println!("{:?}", other),
    }

    Ok(None)
}

fn println_int(
    _vm: &mut SandboxedVm,
    _receiver: Value,
    arguments: Vec<Value>,
) -> Result<Option<Value>> {
    println!("{}", expect_int(&arguments[0])?);
    Ok(None)
}

fn println_long(
    _vm: &mut SandboxedVm,
    _receiver: Value,
    arguments: Vec<Value>,
) -> Result<Option<Value>> {
    match &arguments[0] {
        Value::Long(value) => println!("{}", value),
        other => return Err(anyhow!("println(J)V got a {}", other.type_name())),
    }

    Ok(None)
}

fn println_bool(
    _vm: &mut SandboxedVm,
    _receiver: Value,
    arguments: Vec<Value>,
) -> Result<Option<Value>> {
    println!("{}", expect_int(&arguments[0])? != 0);
    Ok(None)
}

fn println_char(
    _vm: &mut SandboxedVm,
    _receiver: Value,
    arguments: Vec<Value>,
) -> Result<Option<Value>> {
    let value = expect_int(&arguments[0])?;
    let value = char::from_u32(value as u32)
        .ok_or_else(|| anyhow!("{} is not a printable char", value))?;

    println!("{}", value);
    Ok(None)
}

fn println_float(
    _vm: &mut SandboxedVm,
    _receiver: Value,
    arguments: Vec<Value>,
) -> Result<Option<Value>> {
    match &arguments[0] {
        Value::Float(value) => println!("{}", value),
        other => return Err(anyhow!("println(F)V got a {}", other.type_name())),
    }

    Ok(None)
}

fn println_double(
    _vm: &mut SandboxedVm,
    _receiver: Value,
    arguments: Vec<Value>,
) -> Result<Option<Value>> {
    match &arguments[0] {
        Value::Double(value) => println!("{}", value),
        other => return Err(anyhow!("println(D)V got a {}", other.type_name())),
    }

    Ok(None)
}

fn println_empty(
    _vm: &mut SandboxedVm,
    _receiver: Value,
    _arguments: Vec<Value>,
) -> Result<Option<Value>> {
    println!();
    Ok(None)
}

fn expect_int(value: &Value) -> Result<i32> {
    value
        .as_int()
        .copied()
        .ok_or_else(|| anyhow!("expected an int, found a {}", value.type_name()))
}
