//! # langkit
//! This crate contains a recursive-descent parser for a small C-family
//! language, a loader for its textual bytecode format, and a stack-based
//! virtual machine that runs the loaded class graph.
//!
//! ## Overview of the pipeline
//!
//! Source text becomes a token stream via an external lexer (out of
//! scope for this crate); [`parser::parse`] turns that stream into a
//! forest of top-level [`ast::Node`]s terminated by a single
//! [`ast::Node::Finish`]. Parsing never aborts: a malformed construct is
//! captured as a [`ast::Node::Error`] and parsing resumes at the next
//! statement boundary.
//!
//! Separately, [`bytecode::load`] reads the textual `CLASS_DEFINE`/
//! `METHOD_DEFINE`/`FIELD_DEFINE` bytecode format into a flat
//! [`bytecode::Class`] graph. A [`vm::VirtualMachine`] registers that
//! graph, resolves every instruction's symbolic references via
//! [`vm::VirtualMachine::initialize`], and then runs methods against a
//! frame-stack [`vm::Context`] with an arena-backed [`vm::Heap`].
//!
//! ## Running a loaded program
//!
//! ```ignore
//! use langkit::bytecode;
//! use langkit::vm::{VirtualMachine, VmConfig};
//!
//! let classes = bytecode::load(source_text)?;
//! let mut vm = VirtualMachine::new(VmConfig::default());
//! for class in classes {
//!     vm.register_class(class)?;
//! }
//! vm.initialize()?;
//! let result = vm.execute_method("Main", "main", &[], vec![])?;
//! ```

pub mod ast;
pub mod bytecode;
pub mod error;
pub mod parser;
pub mod token;
pub mod vm;

pub use ast::Node;
pub use error::{LinkError, LoadError, ParseError, RuntimeFault};
pub use parser::parse;
pub use token::Token;
