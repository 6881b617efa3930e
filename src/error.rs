//! Error kinds per spec.md §7.
//!
//! [`ParseError`] never aborts parsing on its own — the parser catches it,
//! wraps it in [`crate::ast::Node::Error`], and resumes (spec.md §4.3). The
//! other three kinds are fatal to VM startup or execution and are surfaced
//! to the host immediately.

use thiserror::Error;

use crate::token::Token;

/// A malformed token, unknown modifier, unknown operator, or unmatched
/// bracket encountered while parsing source tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected {found} at token {position}")]
    UnexpectedToken { found: Token, position: usize },

    #[error("expected {expected} but found {found} at token {position}")]
    ExpectedKind {
        expected: String,
        found: Token,
        position: usize,
    },

    #[error("unknown modifier '{word}' for this declaration at token {position}")]
    UnknownModifier { word: String, position: usize },

    #[error("unknown operator '{operator}' at token {position}")]
    UnknownOperator { operator: String, position: usize },

    #[error("unmatched bracket starting at token {position}")]
    UnmatchedBracket { position: usize },
}

/// A duplicate class/method signature, malformed bytecode line, unknown
/// instruction word, or missing BEGIN/END pairing. Fatal to VM startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("class '{0}' is already defined")]
    DuplicateClass(String),

    #[error("method {name}({params}) is already defined for class {class}")]
    DuplicateMethod {
        class: String,
        name: String,
        params: String,
    },

    #[error("malformed bytecode line {line}: '{text}'")]
    MalformedLine { line: usize, text: String },

    #[error("unknown instruction word '{word}' at line {line}")]
    UnknownInstruction { line: usize, word: String },

    #[error("unbalanced BEGIN/END pairing: '{kind}' offset is {offset} at end of input")]
    UnbalancedNesting { kind: &'static str, offset: u32 },

    #[error("'{instruction}' at line {line} appeared outside of any open element")]
    DanglingInstruction { line: usize, instruction: String },
}

/// An unresolved class, method, or field reference discovered while
/// initializing instructions after the whole program has loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("unresolved class '{0}'")]
    UnresolvedClass(String),

    #[error("unresolved method {class}.{name}({params})")]
    UnresolvedMethod {
        class: String,
        name: String,
        params: String,
    },

    #[error("unresolved field {class}.{name}")]
    UnresolvedField { class: String, name: String },

    #[error("constant pool index {0} out of bounds")]
    UnresolvedConstant(usize),
}

/// A fault raised while executing instructions against a [`crate::vm::Context`].
/// Aborts the current execution and is surfaced to the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeFault {
    #[error("null dereference")]
    NullDereference,

    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("type mismatch on primitive operation: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("use of an instance after it was deleted")]
    UseAfterDelete,

    #[error("no method {name}({params}) found via virtual dispatch on {class}")]
    MethodNotFound {
        class: String,
        name: String,
        params: String,
    },

    #[error("call stack exceeded maximum depth of {0}")]
    StackOverflow(usize),
}
