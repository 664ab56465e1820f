//! A deliberately small bytecode interpreter. It runs straight-line
//! code against native classes registered by the host and faults on
//! everything else, so untrusted class files can be poked at without a
//! class library or a heap.

use std::ops::Bound;
use std::sync::Arc;

use anyhow::Result;
use parse::attributes::{Attribute, CodeAttribute};
use parse::bytecode::{Instruction, Opcode};
use parse::classfile::Method;
use parse::pool::{ClassChildReference, LoadableConstant};
use support::descriptor::MethodType;
use tracing::trace;

use crate::error::ExecutionError;
use crate::native::{ClassImplementation, ClassResolver};
use crate::value::Value;

pub mod error;
pub mod native;
pub mod value;

/// What an instruction asks the driving loop to do next.
enum Progression {
    Next,
    JumpRel(i32),
    Return(Option<Value>),
}

pub struct SandboxedVm {
    resolver: Box<dyn ClassResolver>,
    stack: Vec<Value>,
    pc: i32,
}

impl SandboxedVm {
    pub fn new(resolver: Box<dyn ClassResolver>) -> Self {
        Self {
            resolver,
            stack: Vec::new(),
            pc: 0,
        }
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or_else(|| ExecutionError::EmptyStack.into())
    }

    fn pop_int(&mut self) -> Result<i32> {
        let value = self.pop()?;
        value.as_int().copied().ok_or_else(|| {
            ExecutionError::UnexpectedValue {
                expected: "int",
                found: value.type_name(),
            }
            .into()
        })
    }

    /// Runs a method to completion, yielding whatever a return opcode
    /// popped. Falling off the end of the instruction map halts with
    /// `None`, the same as a bare `return`.
    pub fn execute(&mut self, method: &Method) -> Result<Option<Value>> {
        let code = locate_code(method)?;

        self.pc = 0;
        self.stack.clear();

        while let Some(instruction) = code.instructions.get(&self.pc) {
            trace!("pc {}: {:?}", self.pc, instruction.opcode());

            match self.interpret(instruction)? {
                Progression::Next => {
                    let next = code
                        .instructions
                        .range((Bound::Excluded(self.pc), Bound::Unbounded))
                        .next();

                    match next {
                        Some((offset, _)) => self.pc = *offset,
                        None => break,
                    }
                }
                Progression::JumpRel(offset) => self.pc += offset,
                Progression::Return(value) => return Ok(value),
            }
        }

        Ok(None)
    }

    fn interpret(&mut self, instruction: &Instruction) -> Result<Progression> {
        use Opcode::*;

        Ok(match instruction {
            Instruction::Simple { opcode } => match opcode {
                Nop => Progression::Next,
                AconstNull => self.push_and_continue(Value::Null),
                IconstM1 => self.push_and_continue(Value::Int(-1)),
                Iconst0 => self.push_and_continue(Value::Int(0)),
                Iconst1 => self.push_and_continue(Value::Int(1)),
                Iconst2 => self.push_and_continue(Value::Int(2)),
                Iconst3 => self.push_and_continue(Value::Int(3)),
                Iconst4 => self.push_and_continue(Value::Int(4)),
                Iconst5 => self.push_and_continue(Value::Int(5)),
                Lconst0 => self.push_and_continue(Value::Long(0)),
                Lconst1 => self.push_and_continue(Value::Long(1)),
                Fconst0 => self.push_and_continue(Value::Float(0.0)),
                Fconst1 => self.push_and_continue(Value::Float(1.0)),
                Fconst2 => self.push_and_continue(Value::Float(2.0)),
                Dconst0 => self.push_and_continue(Value::Double(0.0)),
                Dconst1 => self.push_and_continue(Value::Double(1.0)),
                Pop => {
                    self.pop()?;
                    Progression::Next
                }
                Dup => {
                    let value = self.pop()?;
                    self.push(value.clone());
                    self.push(value);
                    Progression::Next
                }
                Swap => {
                    let top = self.pop()?;
                    let below = self.pop()?;
                    self.push(top);
                    self.push(below);
                    Progression::Next
                }
                Iadd => self.binary_int(i32::wrapping_add)?,
                Isub => self.binary_int(i32::wrapping_sub)?,
                Imul => self.binary_int(i32::wrapping_mul)?,
                Ireturn | Lreturn | Freturn | Dreturn | Areturn => {
                    Progression::Return(Some(self.pop()?))
                }
                Return => Progression::Return(None),
                other => return Err(ExecutionError::UnsupportedInstruction(*other).into()),
            },
            Instruction::PushByte { value, .. } => self.push_and_continue(Value::Int(*value as i32)),
            Instruction::PushShort { value, .. } => {
                self.push_and_continue(Value::Int(*value as i32))
            }
            Instruction::LoadConstant { constant, .. } => {
                let value = match constant {
                    LoadableConstant::Integer(value) => Value::Int(*value),
                    LoadableConstant::Float(value) => Value::Float(*value),
                    LoadableConstant::Long(value) => Value::Long(*value),
                    LoadableConstant::Double(value) => Value::Double(*value),
                    LoadableConstant::String(value) => Value::String(Arc::new(value.clone())),
                    LoadableConstant::Class(name) => Value::Class(name.clone()),
                    LoadableConstant::MethodType(_) => {
                        return Err(ExecutionError::UnsupportedConstant("method type").into())
                    }
                    LoadableConstant::MethodHandle(_) => {
                        return Err(ExecutionError::UnsupportedConstant("method handle").into())
                    }
                    LoadableConstant::Dynamic(_) => {
                        return Err(ExecutionError::UnsupportedConstant("dynamic").into())
                    }
                };

                self.push_and_continue(value)
            }
            Instruction::Branch { opcode, offset } => match opcode {
                Goto | GotoW => Progression::JumpRel(*offset),
                Ifeq => self.branch_if(*offset, |value| value == 0)?,
                Ifne => self.branch_if(*offset, |value| value != 0)?,
                Iflt => self.branch_if(*offset, |value| value < 0)?,
                Ifge => self.branch_if(*offset, |value| value >= 0)?,
                Ifgt => self.branch_if(*offset, |value| value > 0)?,
                Ifle => self.branch_if(*offset, |value| value <= 0)?,
                IfIcmpeq => self.branch_if_compare(*offset, |lhs, rhs| lhs == rhs)?,
                IfIcmpne => self.branch_if_compare(*offset, |lhs, rhs| lhs != rhs)?,
                IfIcmplt => self.branch_if_compare(*offset, |lhs, rhs| lhs < rhs)?,
                IfIcmpge => self.branch_if_compare(*offset, |lhs, rhs| lhs >= rhs)?,
                IfIcmpgt => self.branch_if_compare(*offset, |lhs, rhs| lhs > rhs)?,
                IfIcmple => self.branch_if_compare(*offset, |lhs, rhs| lhs <= rhs)?,
                Ifnull => {
                    let value = self.pop()?;
                    Self::progress(value.is_null(), *offset)
                }
                Ifnonnull => {
                    let value = self.pop()?;
                    Self::progress(!value.is_null(), *offset)
                }
                other => return Err(ExecutionError::UnsupportedInstruction(*other).into()),
            },
            Instruction::ChildRef { opcode, reference } => match opcode {
                Getstatic => {
                    let class = self.resolve(&reference.class_name)?;
                    let value = class
                        .static_field(
                            &reference.name_and_type.name,
                            &reference.name_and_type.descriptor,
                        )
                        .ok_or_else(|| ExecutionError::UnresolvedField {
                            class: reference.class_name.clone(),
                            field: reference.name_and_type.name.clone(),
                        })?;

                    self.push_and_continue(value)
                }
                Invokevirtual | Invokespecial => self.invoke(reference, true)?,
                Invokestatic => self.invoke(reference, false)?,
                other => return Err(ExecutionError::UnsupportedInstruction(*other).into()),
            },
            other => {
                return Err(ExecutionError::UnsupportedInstruction(other.opcode()).into())
            }
        })
    }

    fn push_and_continue(&mut self, value: Value) -> Progression {
        self.push(value);
        Progression::Next
    }

    fn binary_int(&mut self, apply: fn(i32, i32) -> i32) -> Result<Progression> {
        let rhs = self.pop_int()?;
        let lhs = self.pop_int()?;
        self.push(Value::Int(apply(lhs, rhs)));

        Ok(Progression::Next)
    }

    fn branch_if(&mut self, offset: i32, condition: fn(i32) -> bool) -> Result<Progression> {
        let value = self.pop_int()?;
        Ok(Self::progress(condition(value), offset))
    }

    fn branch_if_compare(
        &mut self,
        offset: i32,
        condition: fn(i32, i32) -> bool,
    ) -> Result<Progression> {
        let rhs = self.pop_int()?;
        let lhs = self.pop_int()?;
        Ok(Self::progress(condition(lhs, rhs), offset))
    }

    fn progress(taken: bool, offset: i32) -> Progression {
        if taken {
            Progression::JumpRel(offset)
        } else {
            Progression::Next
        }
    }

    fn invoke(
        &mut self,
        reference: &ClassChildReference,
        has_receiver: bool,
    ) -> Result<Progression> {
        let name = &reference.name_and_type.name;
        let descriptor = &reference.name_and_type.descriptor;
        let method_type = MethodType::parse(descriptor)?;

        // Arguments were pushed left to right, so they pop off reversed.
        let mut arguments = Vec::with_capacity(method_type.parameters.len());
        for _ in 0..method_type.parameters.len() {
            arguments.push(self.pop()?);
        }
        arguments.reverse();

        let receiver = if has_receiver { self.pop()? } else { Value::Null };

        let class = self.resolve(&reference.class_name)?;
        let method = class.method(name, descriptor).ok_or_else(|| {
            ExecutionError::UnresolvedMethod {
                class: reference.class_name.clone(),
                name: name.clone(),
                descriptor: descriptor.clone(),
            }
        })?;

        trace!("invoking {}.{}{}", reference.class_name, name, descriptor);
        if let Some(value) = method(self, receiver, arguments)? {
            self.push(value);
        }

        Ok(Progression::Next)
    }

    fn resolve(&self, class_name: &str) -> Result<Arc<dyn ClassImplementation>> {
        self.resolver
            .resolve(class_name)
            .ok_or_else(|| ExecutionError::UnresolvedClass(class_name.to_string()).into())
    }
}

fn locate_code(method: &Method) -> Result<&CodeAttribute> {
    let codes: Vec<_> = method
        .attributes
        .iter()
        .filter_map(|attribute| match attribute {
            Attribute::Code(code) => Some(code),
            _ => None,
        })
        .collect();

    match codes.len() {
        1 => Ok(codes[0]),
        0 => Err(ExecutionError::NoCode {
            name: method.name.clone(),
            descriptor: method.descriptor.clone(),
        }
        .into()),
        count => Err(ExecutionError::DuplicateCode {
            name: method.name.clone(),
            descriptor: method.descriptor.clone(),
            count,
        }
        .into()),
    }
}
