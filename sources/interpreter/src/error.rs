use parse::bytecode::Opcode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("method {name}{descriptor} has no Code attribute")]
    NoCode { name: String, descriptor: String },

    #[error("method {name}{descriptor} has {count} Code attributes")]
    DuplicateCode {
        name: String,
        descriptor: String,
        count: usize,
    },

    #[error("class {0} could not be resolved")]
    UnresolvedClass(String),

    #[error("{class} has no method {name}{descriptor}")]
    UnresolvedMethod {
        class: String,
        name: String,
        descriptor: String,
    },

    #[error("{class} has no static field {field}")]
    UnresolvedField { class: String, field: String },

    #[error("{0:?} is not supported in the sandbox")]
    UnsupportedInstruction(Opcode),

    #[error("a {0} constant cannot be pushed in the sandbox")]
    UnsupportedConstant(&'static str),

    #[error("popped an empty operand stack")]
    EmptyStack,

    #[error("expected {expected} on the stack, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },
}
