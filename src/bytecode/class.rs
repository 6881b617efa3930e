//! The loaded class graph (spec.md §3 "Bytecode Class Graph").

use super::instruction::Instruction;
use super::modifier::Modifiers;
use super::signature::{join_signatures, TypeSignature};

#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub super_name: String,
    pub modifiers: Modifiers,
    pub interfaces: Vec<String>,
    pub methods: Vec<Method>,
    pub fields: Vec<Field>,
    /// Names of classes nested directly inside this one. The VM registry
    /// holds the actual `Class` values flat; this is purely for lookup by
    /// a consumer walking the declared nesting (spec.md §3).
    pub inner_classes: Vec<String>,
}

impl Class {
    pub fn find_method(&self, name: &str, params: &[TypeSignature]) -> Option<(usize, &Method)> {
        self.methods
            .iter()
            .enumerate()
            .find(|(_, method)| method.name == name && method.parameters == params)
    }
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub return_type: TypeSignature,
    pub modifiers: Modifiers,
    pub parameters: Vec<TypeSignature>,
    pub instructions: Vec<Instruction>,
}

impl Method {
    /// `(name, parameter signatures)` identity used for duplicate detection
    /// (spec.md §3, §8 S5).
    pub fn signature_key(&self) -> (String, String) {
        (self.name.clone(), join_signatures(&self.parameters))
    }

    pub fn params_display(&self) -> String {
        join_signatures(&self.parameters)
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: TypeSignature,
    pub modifiers: Modifiers,
}
