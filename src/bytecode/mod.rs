//! The bytecode class graph: signatures, modifiers, classes, instructions,
//! and the textual loader that builds them (spec.md §3, §4.5, §4.6).

pub mod class;
pub mod instruction;
pub mod loader;
pub mod modifier;
pub mod signature;

pub use class::{Class, Field, Method};
pub use instruction::Instruction;
pub use loader::load;
pub use modifier::Modifiers;
pub use signature::TypeSignature;
