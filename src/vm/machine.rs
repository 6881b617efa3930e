//! The virtual machine: class registry, heap, and the frame-stack
//! execution loop (spec.md §4.7).

use std::collections::HashMap;

use crate::bytecode::class::{Class, Method};
use crate::bytecode::instruction::{ExecutionOutcome, Instruction};
use crate::bytecode::signature::TypeSignature;
use crate::error::{LinkError, LoadError, RuntimeFault};

use super::config::VmConfig;
use super::context::{Context, Frame};
use super::heap::Heap;
use super::value::Value;

/// The registry of loaded classes plus the heap they allocate instances
/// into. Owns one `VmConfig` for the lifetime of the program.
#[derive(Debug)]
pub struct VirtualMachine {
    classes: Vec<Class>,
    class_index: HashMap<String, usize>,
    heap: Heap,
    config: VmConfig,
}

impl VirtualMachine {
    pub fn new(config: VmConfig) -> VirtualMachine {
        VirtualMachine {
            classes: Vec::new(),
            class_index: HashMap::new(),
            heap: Heap::new(),
            config,
        }
    }

    /// Adds a class to the registry. A name collision, including an inner
    /// class promoted to the same qualified name as an existing entry, is
    /// fatal (spec.md §3, §8 S5).
    pub fn register_class(&mut self, class: Class) -> Result<(), LoadError> {
        if self.class_index.contains_key(&class.name) {
            return Err(LoadError::DuplicateClass(class.name));
        }
        let index = self.classes.len();
        self.class_index.insert(class.name.clone(), index);
        self.classes.push(class);
        Ok(())
    }

    pub fn resolve_class_index(&self, name: &str) -> Option<usize> {
        self.class_index.get(name).copied()
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// Resolves every instruction's symbolic class/method references
    /// against the full registry, once every class has been registered
    /// (spec.md §4.6 `initialize`). Run against a frozen snapshot so the
    /// resolver can read `self.classes` while `self.classes` is itself
    /// being mutated in place.
    pub fn initialize(&mut self) -> Result<(), LinkError> {
        let snapshot = VirtualMachine {
            classes: self.classes.clone(),
            class_index: self.class_index.clone(),
            heap: Heap::new(),
            config: self.config.clone(),
        };
        for class in self.classes.iter_mut() {
            for method in class.methods.iter_mut() {
                for instruction in method.instructions.iter_mut() {
                    instruction.initialize(&snapshot)?;
                }
            }
        }
        Ok(())
    }

    /// Starting at `start`, walks the `super_name` chain looking for the
    /// first class that declares a matching method — virtual dispatch
    /// against the receiver's runtime class rather than the statically
    /// named one (spec.md §4.6 `InvokeVirtual`/`InvokeInterface`).
    pub fn resolve_virtual(&self, start: usize, name: &str, params: &[TypeSignature]) -> Option<(usize, usize)> {
        let mut current = start;
        loop {
            let class = self.classes.get(current)?;
            if let Some((method_index, _)) = class.find_method(name, params) {
                return Some((current, method_index));
            }
            let next = self.class_index.get(&class.super_name).copied()?;
            if next == current {
                return None;
            }
            current = next;
        }
    }

    /// Looks up and runs a method by name, as a host embedding this VM
    /// would invoke an entry point.
    pub fn execute_method(
        &mut self,
        class_name: &str,
        method_name: &str,
        params: &[TypeSignature],
        args: Vec<Value>,
    ) -> Result<Option<Value>, RuntimeFault> {
        let class_index = self.resolve_class_index(class_name).ok_or_else(|| RuntimeFault::MethodNotFound {
            class: class_name.to_string(),
            name: method_name.to_string(),
            params: crate::bytecode::signature::join_signatures(params),
        })?;
        let method_index = self.classes[class_index]
            .find_method(method_name, params)
            .map(|(index, _)| index)
            .ok_or_else(|| RuntimeFault::MethodNotFound {
                class: class_name.to_string(),
                name: method_name.to_string(),
                params: crate::bytecode::signature::join_signatures(params),
            })?;
        self.run(class_index, method_index, args)
    }

    /// The frame-stack interpreter loop. `Invoke` pushes a callee frame
    /// and the loop keeps running against whichever frame is now on top;
    /// `Return` pops back to the caller and carries its value, if any,
    /// onto the caller's operand stack.
    pub fn run(&mut self, class_index: usize, method_index: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeFault> {
        let mut context = Context::new();
        self.push_call(&mut context, class_index, method_index, args)?;

        loop {
            let (class_index, method_index, pc) = {
                let frame = context.current_mut()?;
                (frame.class_index, frame.method_index, frame.pc)
            };

            let instruction = self.classes[class_index].methods[method_index].instructions.get(pc).cloned();

            let instruction = match instruction {
                Some(instruction) => instruction,
                None => {
                    // Ran off the end of the method body without an
                    // explicit RETURN.
                    context.pop_frame();
                    if context.depth() == 0 {
                        return Ok(None);
                    }
                    context.current_mut()?.pc += 1;
                    continue;
                }
            };

            log::trace!("vm: {}", instruction.debug());
            let outcome = {
                let frame = context.current_mut()?;
                instruction.execute(frame, self)?
            };

            match outcome {
                ExecutionOutcome::Continue => {
                    context.current_mut()?.pc += 1;
                }
                ExecutionOutcome::Jump(target) => {
                    context.current_mut()?.pc = target;
                }
                ExecutionOutcome::Invoke {
                    class_index,
                    method_index,
                    args,
                } => {
                    self.push_call(&mut context, class_index, method_index, args)?;
                }
                ExecutionOutcome::Return(value) => {
                    context.pop_frame();
                    if context.depth() == 0 {
                        return Ok(value);
                    }
                    let caller = context.current_mut()?;
                    if let Some(value) = value {
                        caller.push(value);
                    }
                    caller.pc += 1;
                }
            }
        }
    }

    fn push_call(&mut self, context: &mut Context, class_index: usize, method_index: usize, args: Vec<Value>) -> Result<(), RuntimeFault> {
        let method = &self.classes[class_index].methods[method_index];
        log::trace!("vm: entering {}.{}, depth {}", self.classes[class_index].name, method.name, context.depth() + 1);
        let mut locals = args;
        let required = required_locals(method);
        while locals.len() < required {
            locals.push(Value::Null);
        }
        context.push_frame(Frame::new(class_index, method_index, locals), self.config.max_call_depth)
    }
}

/// The textual grammar carries no declared local-slot count, so the VM
/// derives it from the highest local index any instruction in the method
/// actually references.
fn required_locals(method: &Method) -> usize {
    let mut max = 0usize;
    for instruction in &method.instructions {
        match instruction {
            Instruction::LocalLoad(index) | Instruction::LocalStore(index) => {
                max = max.max(*index as usize + 1);
            }
            _ => {}
        }
    }
    max
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bytecode::loader;

    fn vm_with(source: &str) -> VirtualMachine {
        let classes = loader::load(source).unwrap();
        let mut vm = VirtualMachine::new(VmConfig::default());
        for class in classes {
            vm.register_class(class).unwrap();
        }
        vm.initialize().unwrap();
        vm
    }

    #[test]
    fn runs_a_static_add_and_returns_its_value() {
        let source = r#"
CLASS_DEFINE Main
CLASS_BEGIN
METHOD_DEFINE add
METHOD_MODIFIER public
METHOD_MODIFIER static
METHOD_RETURN_TYPE I
METHOD_PARAMETERS I I
METHOD_BEGIN
ILOAD 0
ILOAD 1
IADD
IRETURN
METHOD_END
CLASS_END
"#;
        let mut vm = vm_with(source);
        let result = vm
            .execute_method("Main", "add", &[TypeSignature::Int, TypeSignature::Int], vec![Value::Int(2), Value::Int(3)])
            .unwrap();
        assert_eq!(result, Some(Value::Int(5)));
    }

    #[test]
    fn new_allocates_a_live_instance_and_delete_invalidates_it() {
        let source = r#"
CLASS_DEFINE Box
CLASS_BEGIN
METHOD_DEFINE make
METHOD_MODIFIER public
METHOD_MODIFIER static
METHOD_RETURN_TYPE LBox;
METHOD_BEGIN
NEW Box STACK
INSTANCE_DELETE STACK
NULLPUSH
ARETURN
METHOD_END
CLASS_END
"#;
        let mut vm = vm_with(source);
        let result = vm.execute_method("Box", "make", &[], vec![]).unwrap();
        assert_eq!(result, Some(Value::Null));
    }

    #[test]
    fn calling_an_unresolved_method_is_a_link_error() {
        let source = r#"
CLASS_DEFINE Main
CLASS_BEGIN
METHOD_DEFINE run
METHOD_RETURN_TYPE V
METHOD_BEGIN
INVOKESTATIC Main missing
RETURN
METHOD_END
CLASS_END
"#;
        let classes = loader::load(source).unwrap();
        let mut vm = VirtualMachine::new(VmConfig::default());
        for class in classes {
            vm.register_class(class).unwrap();
        }
        assert!(matches!(vm.initialize(), Err(LinkError::UnresolvedMethod { .. })));
    }
}
