//! The instruction set (spec.md §4.6).
//!
//! Every variant supports the same four operations the original virtual
//! hierarchy gave each instruction class — `parse`, `initialize`,
//! `execute`, `debug` — implemented here as one function per operation
//! over a closed enum rather than a dispatch through a vtable (spec.md §9
//! "Redesign Notes"). Grounded in
//! `examples/original_source/src/vm/parser/instructions/{Integers,Instances}.hpp`'s
//! field layout for `New`/`InstanceDelete`/`InstanceGetAddress`.

use crate::error::{LinkError, LoadError, RuntimeFault};
use crate::vm::context::Frame;
use crate::vm::heap::InstanceId;
use crate::vm::machine::VirtualMachine;
use crate::vm::value::Value;

use super::signature::{join_signatures, TypeSignature};

/// Addressing mode for an instruction's operand or result (spec.md §4.6,
/// GLOSSARY "Target").
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Stack,
    Local(u16),
    Field(String),
    Return,
    Discard,
}

impl Target {
    fn debug(&self) -> String {
        match self {
            Target::Stack => "STACK".to_string(),
            Target::Local(index) => format!("LOCAL {}", index),
            Target::Field(name) => format!("FIELD {}", name),
            Target::Return => "RETURN".to_string(),
            Target::Discard => "DISCARD".to_string(),
        }
    }
}

fn parse_target(args: &[&str], idx: &mut usize, line: usize) -> Result<Target, LoadError> {
    let word = *args
        .get(*idx)
        .ok_or_else(|| LoadError::MalformedLine { line, text: args.join(" ") })?;
    *idx += 1;
    match word {
        "STACK" => Ok(Target::Stack),
        "RETURN" => Ok(Target::Return),
        "DISCARD" => Ok(Target::Discard),
        "LOCAL" => {
            let raw = args
                .get(*idx)
                .ok_or_else(|| LoadError::MalformedLine { line, text: args.join(" ") })?;
            *idx += 1;
            let index: u16 = raw
                .parse()
                .map_err(|_| LoadError::MalformedLine { line, text: args.join(" ") })?;
            Ok(Target::Local(index))
        }
        "FIELD" => {
            let name = args
                .get(*idx)
                .ok_or_else(|| LoadError::MalformedLine { line, text: args.join(" ") })?;
            *idx += 1;
            Ok(Target::Field(name.to_string()))
        }
        _ => Err(LoadError::MalformedLine { line, text: args.join(" ") }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Mod,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Gt,
}

/// A `static`/`virtual`/`interface` invocation's parsed operands. The
/// called method is always resolved to a concrete `(class_index,
/// method_index)` at `initialize` time; `InvokeVirtual`/`InvokeInterface`
/// additionally re-dispatch against the receiver's runtime class at
/// `execute` time, since the statically named class is only the
/// declared starting point for virtual lookup.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub class: String,
    pub name: String,
    pub params: Vec<TypeSignature>,
    pub resolved: Option<(usize, usize)>,
}

impl Invocation {
    pub fn params_display(&self) -> String {
        join_signatures(&self.params)
    }

    fn debug(&self, word: &str) -> String {
        let mut parts = vec![word.to_string(), self.class.clone(), self.name.clone()];
        parts.extend(self.params.iter().map(|p| p.to_string()));
        parts.join(" ")
    }
}

#[derive(Debug, Clone)]
pub enum Instruction {
    Push(Value),
    Pop,
    Arithmetic(ArithOp),
    Compare(CompareOp),
    Goto(i32),
    IfTrue(i32),
    IfFalse(i32),
    LocalLoad(u16),
    LocalStore(u16),
    FieldGet(String),
    FieldSet(String),
    InvokeStatic(Invocation),
    InvokeVirtual(Invocation),
    InvokeInterface(Invocation),
    New {
        class_name: String,
        result: Target,
        resolved_class: Option<usize>,
    },
    NullPush,
    InstanceDelete {
        source: Target,
    },
    InstanceGetAddress {
        source: Target,
        result: Target,
    },
    /// `true` iff a value is popped off the stack and carried out as the
    /// method's result (spec.md §4.6 "return (with or without value)").
    Return(bool),
}

/// What an `execute` call asks the owning frame-stack loop to do next
/// (`vm::machine::VirtualMachine::run`).
pub enum ExecutionOutcome {
    Continue,
    Jump(usize),
    Invoke {
        class_index: usize,
        method_index: usize,
        args: Vec<Value>,
    },
    Return(Option<Value>),
}

impl Instruction {
    /// Decodes one whitespace-split bytecode line into an instruction
    /// (spec.md §4.6 `parse`).
    pub fn parse(word: &str, args: &[&str], line: usize) -> Result<Instruction, LoadError> {
        let malformed = || LoadError::MalformedLine {
            line,
            text: args.join(" "),
        };

        match word {
            "IPUSH" => Ok(Instruction::Push(Value::Int(args.first().and_then(|v| v.parse().ok()).ok_or_else(malformed)?))),
            "LPUSH" => Ok(Instruction::Push(Value::Long(args.first().and_then(|v| v.parse().ok()).ok_or_else(malformed)?))),
            "FPUSH" => Ok(Instruction::Push(Value::Float(args.first().and_then(|v| v.parse().ok()).ok_or_else(malformed)?))),
            "DPUSH" => Ok(Instruction::Push(Value::Double(args.first().and_then(|v| v.parse().ok()).ok_or_else(malformed)?))),
            "SPUSH" => Ok(Instruction::Push(Value::Str(args.join(" ")))),
            "POP" => Ok(Instruction::Pop),

            "IADD" | "LADD" | "FADD" | "DADD" => Ok(Instruction::Arithmetic(ArithOp::Add)),
            "ISUB" | "LSUB" | "FSUB" | "DSUB" => Ok(Instruction::Arithmetic(ArithOp::Sub)),
            "IMUL" | "LMUL" | "FMUL" | "DMUL" => Ok(Instruction::Arithmetic(ArithOp::Mul)),
            "IDIV" | "LDIV" | "FDIV" | "DDIV" => Ok(Instruction::Arithmetic(ArithOp::Div)),
            "IMOD" | "LMOD" | "FMOD" | "DMOD" => Ok(Instruction::Arithmetic(ArithOp::Mod)),

            "CMPEQ" => Ok(Instruction::Compare(CompareOp::Eq)),
            "CMPLT" => Ok(Instruction::Compare(CompareOp::Lt)),
            "CMPGT" => Ok(Instruction::Compare(CompareOp::Gt)),

            "GOTO" => Ok(Instruction::Goto(args.first().and_then(|v| v.parse().ok()).ok_or_else(malformed)?)),
            "IFTRUE" => Ok(Instruction::IfTrue(args.first().and_then(|v| v.parse().ok()).ok_or_else(malformed)?)),
            "IFFALSE" => Ok(Instruction::IfFalse(args.first().and_then(|v| v.parse().ok()).ok_or_else(malformed)?)),

            "ILOAD" | "LLOAD" | "FLOAD" | "DLOAD" | "ALOAD" => {
                Ok(Instruction::LocalLoad(args.first().and_then(|v| v.parse().ok()).ok_or_else(malformed)?))
            }
            "ISTORE" | "LSTORE" | "FSTORE" | "DSTORE" | "ASTORE" => {
                Ok(Instruction::LocalStore(args.first().and_then(|v| v.parse().ok()).ok_or_else(malformed)?))
            }

            "GETFIELD" => Ok(Instruction::FieldGet(args.first().ok_or_else(malformed)?.to_string())),
            "PUTFIELD" => Ok(Instruction::FieldSet(args.first().ok_or_else(malformed)?.to_string())),

            "INVOKESTATIC" | "INVOKEVIRTUAL" | "INVOKEINTERFACE" => {
                let class = args.first().ok_or_else(malformed)?.to_string();
                let name = args.get(1).ok_or_else(malformed)?.to_string();
                let params = args[2.min(args.len())..]
                    .iter()
                    .map(|s| TypeSignature::parse(s).map_err(|_| malformed()))
                    .collect::<Result<Vec<_>, _>>()?;
                let invocation = Invocation {
                    class,
                    name,
                    params,
                    resolved: None,
                };
                Ok(match word {
                    "INVOKESTATIC" => Instruction::InvokeStatic(invocation),
                    "INVOKEVIRTUAL" => Instruction::InvokeVirtual(invocation),
                    _ => Instruction::InvokeInterface(invocation),
                })
            }

            "NEW" => {
                let class_name = args.first().ok_or_else(malformed)?.to_string();
                let mut idx = 1;
                let result = parse_target(args, &mut idx, line)?;
                Ok(Instruction::New {
                    class_name,
                    result,
                    resolved_class: None,
                })
            }
            "NULLPUSH" => Ok(Instruction::NullPush),
            "INSTANCE_DELETE" => {
                let mut idx = 0;
                let source = parse_target(args, &mut idx, line)?;
                Ok(Instruction::InstanceDelete { source })
            }
            "INSTANCE_GET_ADDRESS" => {
                let mut idx = 0;
                let source = parse_target(args, &mut idx, line)?;
                let result = parse_target(args, &mut idx, line)?;
                Ok(Instruction::InstanceGetAddress { source, result })
            }

            "IRETURN" | "LRETURN" | "FRETURN" | "DRETURN" | "ARETURN" | "SRETURN" => Ok(Instruction::Return(true)),
            "RETURN" => Ok(Instruction::Return(false)),

            other => Err(LoadError::UnknownInstruction {
                line,
                word: other.to_string(),
            }),
        }
    }

    /// Resolves symbolic class/method references after the whole program
    /// has loaded (spec.md §4.6 `initialize`). Unresolved references are
    /// fatal (`LinkError`).
    pub fn initialize(&mut self, vm: &VirtualMachine) -> Result<(), LinkError> {
        match self {
            Instruction::InvokeStatic(invocation)
            | Instruction::InvokeVirtual(invocation)
            | Instruction::InvokeInterface(invocation) => {
                let class_index = vm
                    .resolve_class_index(&invocation.class)
                    .ok_or_else(|| LinkError::UnresolvedClass(invocation.class.clone()))?;
                let method_index = vm.classes()[class_index]
                    .find_method(&invocation.name, &invocation.params)
                    .map(|(index, _)| index)
                    .ok_or_else(|| LinkError::UnresolvedMethod {
                        class: invocation.class.clone(),
                        name: invocation.name.clone(),
                        params: invocation.params_display(),
                    })?;
                invocation.resolved = Some((class_index, method_index));
                Ok(())
            }
            Instruction::New {
                class_name,
                resolved_class,
                ..
            } => {
                *resolved_class = Some(
                    vm.resolve_class_index(class_name)
                        .ok_or_else(|| LinkError::UnresolvedClass(class_name.clone()))?,
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Mutates the current frame and/or heap, or asks the owning loop to
    /// jump, invoke, or return (spec.md §4.6 `execute`).
    pub fn execute(&self, frame: &mut Frame, vm: &mut VirtualMachine) -> Result<ExecutionOutcome, RuntimeFault> {
        match self {
            Instruction::Push(value) => {
                frame.push(value.clone());
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::Pop => {
                frame.pop()?;
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::Arithmetic(op) => {
                let b = frame.pop()?;
                let a = frame.pop()?;
                frame.push(apply_arithmetic(*op, a, b)?);
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::Compare(op) => {
                let b = frame.pop()?;
                let a = frame.pop()?;
                frame.push(Value::Bool(apply_compare(*op, a, b)?));
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::Goto(offset) => Ok(ExecutionOutcome::Jump(jump_target(frame.pc, *offset))),
            Instruction::IfTrue(offset) => {
                let condition = truthy(frame.pop()?)?;
                if condition {
                    Ok(ExecutionOutcome::Jump(jump_target(frame.pc, *offset)))
                } else {
                    Ok(ExecutionOutcome::Continue)
                }
            }
            Instruction::IfFalse(offset) => {
                let condition = truthy(frame.pop()?)?;
                if !condition {
                    Ok(ExecutionOutcome::Jump(jump_target(frame.pc, *offset)))
                } else {
                    Ok(ExecutionOutcome::Continue)
                }
            }
            Instruction::LocalLoad(index) => {
                frame.push(frame.local(*index)?);
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::LocalStore(index) => {
                let value = frame.pop()?;
                frame.set_local(*index, value)?;
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::FieldGet(name) => {
                let id = as_reference(frame.pop()?)?;
                let instance = vm.heap().get(id)?;
                frame.push(instance.fields.get(name).cloned().unwrap_or(Value::Null));
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::FieldSet(name) => {
                let value = frame.pop()?;
                let id = as_reference(frame.pop()?)?;
                vm.heap_mut().get_mut(id)?.fields.insert(name.clone(), value);
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::InvokeStatic(invocation) => {
                let (class_index, method_index) = invocation.resolved.ok_or_else(|| unresolved_call(invocation))?;
                let args = pop_arguments(frame, invocation.params.len())?;
                Ok(ExecutionOutcome::Invoke {
                    class_index,
                    method_index,
                    args,
                })
            }
            Instruction::InvokeVirtual(invocation) | Instruction::InvokeInterface(invocation) => {
                let mut args = pop_arguments(frame, invocation.params.len())?;
                let receiver = frame.pop()?;
                let id = as_reference(receiver.clone())?;
                let runtime_class = vm.heap().get(id)?.class_index;
                let (class_index, method_index) = vm
                    .resolve_virtual(runtime_class, &invocation.name, &invocation.params)
                    .ok_or_else(|| RuntimeFault::MethodNotFound {
                        class: vm.classes()[runtime_class].name.clone(),
                        name: invocation.name.clone(),
                        params: invocation.params_display(),
                    })?;
                args.insert(0, receiver);
                Ok(ExecutionOutcome::Invoke {
                    class_index,
                    method_index,
                    args,
                })
            }
            Instruction::New {
                result,
                resolved_class,
                class_name,
            } => {
                let class_index = resolved_class.ok_or_else(|| RuntimeFault::TypeMismatch {
                    expected: "resolved class".to_string(),
                    found: class_name.clone(),
                })?;
                let id = vm.heap_mut().allocate(class_index);
                store_to_target(frame, result, Value::Reference(Some(id)))?;
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::NullPush => {
                frame.push(Value::Null);
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::InstanceDelete { source } => {
                let id = as_reference(load_from_target(frame, source)?)?;
                vm.heap_mut().delete(id)?;
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::InstanceGetAddress { source, result } => {
                let value = load_from_target(frame, source)?;
                store_to_target(frame, result, value)?;
                Ok(ExecutionOutcome::Continue)
            }
            Instruction::Return(has_value) => {
                let value = if *has_value { Some(frame.pop()?) } else { None };
                Ok(ExecutionOutcome::Return(value))
            }
        }
    }

    /// Textual round-trip for diagnostics and the loader round-trip law
    /// (spec.md §8 law 5).
    pub fn debug(&self) -> String {
        match self {
            Instruction::Push(Value::Int(v)) => format!("IPUSH {}", v),
            Instruction::Push(Value::Long(v)) => format!("LPUSH {}", v),
            Instruction::Push(Value::Float(v)) => format!("FPUSH {}", v),
            Instruction::Push(Value::Double(v)) => format!("DPUSH {}", v),
            Instruction::Push(Value::Str(v)) => format!("SPUSH {}", v),
            Instruction::Push(_) => "PUSH <unsupported>".to_string(),
            Instruction::Pop => "POP".to_string(),
            Instruction::Arithmetic(ArithOp::Add) => "IADD".to_string(),
            Instruction::Arithmetic(ArithOp::Sub) => "ISUB".to_string(),
            Instruction::Arithmetic(ArithOp::Mul) => "IMUL".to_string(),
            Instruction::Arithmetic(ArithOp::Div) => "IDIV".to_string(),
            Instruction::Arithmetic(ArithOp::Mod) => "IMOD".to_string(),
            Instruction::Compare(CompareOp::Eq) => "CMPEQ".to_string(),
            Instruction::Compare(CompareOp::Lt) => "CMPLT".to_string(),
            Instruction::Compare(CompareOp::Gt) => "CMPGT".to_string(),
            Instruction::Goto(offset) => format!("GOTO {}", offset),
            Instruction::IfTrue(offset) => format!("IFTRUE {}", offset),
            Instruction::IfFalse(offset) => format!("IFFALSE {}", offset),
            Instruction::LocalLoad(index) => format!("ILOAD {}", index),
            Instruction::LocalStore(index) => format!("ISTORE {}", index),
            Instruction::FieldGet(name) => format!("GETFIELD {}", name),
            Instruction::FieldSet(name) => format!("PUTFIELD {}", name),
            Instruction::InvokeStatic(invocation) => invocation.debug("INVOKESTATIC"),
            Instruction::InvokeVirtual(invocation) => invocation.debug("INVOKEVIRTUAL"),
            Instruction::InvokeInterface(invocation) => invocation.debug("INVOKEINTERFACE"),
            Instruction::New { class_name, result, .. } => format!("NEW {} {}", class_name, result.debug()),
            Instruction::NullPush => "NULLPUSH".to_string(),
            Instruction::InstanceDelete { source } => format!("INSTANCE_DELETE {}", source.debug()),
            Instruction::InstanceGetAddress { source, result } => {
                format!("INSTANCE_GET_ADDRESS {} {}", source.debug(), result.debug())
            }
            Instruction::Return(true) => "IRETURN".to_string(),
            Instruction::Return(false) => "RETURN".to_string(),
        }
    }
}

fn unresolved_call(invocation: &Invocation) -> RuntimeFault {
    RuntimeFault::MethodNotFound {
        class: invocation.class.clone(),
        name: invocation.name.clone(),
        params: invocation.params_display(),
    }
}

fn jump_target(pc: usize, offset: i32) -> usize {
    (pc as i64 + offset as i64).max(0) as usize
}

fn pop_arguments(frame: &mut Frame, count: usize) -> Result<Vec<Value>, RuntimeFault> {
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        args.push(frame.pop()?);
    }
    args.reverse();
    Ok(args)
}

fn as_reference(value: Value) -> Result<InstanceId, RuntimeFault> {
    match value {
        Value::Reference(Some(id)) => Ok(id),
        Value::Reference(None) | Value::Null => Err(RuntimeFault::NullDereference),
        other => Err(RuntimeFault::TypeMismatch {
            expected: "reference".to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

fn truthy(value: Value) -> Result<bool, RuntimeFault> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Int(i) => Ok(i != 0),
        other => Err(RuntimeFault::TypeMismatch {
            expected: "bool".to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

fn load_from_target(frame: &mut Frame, target: &Target) -> Result<Value, RuntimeFault> {
    match target {
        Target::Stack => frame.pop(),
        Target::Local(index) => frame.local(*index),
        Target::Field(_) | Target::Return | Target::Discard => Err(RuntimeFault::TypeMismatch {
            expected: "a readable stack or local source".to_string(),
            found: "field/return/discard target".to_string(),
        }),
    }
}

fn store_to_target(frame: &mut Frame, target: &Target, value: Value) -> Result<(), RuntimeFault> {
    match target {
        Target::Stack | Target::Return => {
            frame.push(value);
            Ok(())
        }
        Target::Local(index) => frame.set_local(*index, value),
        Target::Discard => Ok(()),
        Target::Field(_) => Err(RuntimeFault::TypeMismatch {
            expected: "a writable stack or local target".to_string(),
            found: "field target (use GETFIELD/PUTFIELD)".to_string(),
        }),
    }
}

fn apply_arithmetic(op: ArithOp, a: Value, b: Value) -> Result<Value, RuntimeFault> {
    macro_rules! numeric {
        ($a:ident, $b:ident, $wrap:path) => {
            match op {
                ArithOp::Add => Ok($wrap($a + $b)),
                ArithOp::Sub => Ok($wrap($a - $b)),
                ArithOp::Mul => Ok($wrap($a * $b)),
                ArithOp::Div => {
                    if $b == Default::default() {
                        Err(RuntimeFault::DivisionByZero)
                    } else {
                        Ok($wrap($a / $b))
                    }
                }
                ArithOp::Mod => {
                    if $b == Default::default() {
                        Err(RuntimeFault::DivisionByZero)
                    } else {
                        Ok($wrap($a % $b))
                    }
                }
            }
        };
    }

    match (a, b) {
        (Value::Int(a), Value::Int(b)) => numeric!(a, b, Value::Int),
        (Value::Long(a), Value::Long(b)) => numeric!(a, b, Value::Long),
        (Value::Float(a), Value::Float(b)) => numeric!(a, b, Value::Float),
        (Value::Double(a), Value::Double(b)) => numeric!(a, b, Value::Double),
        (a, b) => Err(RuntimeFault::TypeMismatch {
            expected: a.type_name().to_string(),
            found: b.type_name().to_string(),
        }),
    }
}

fn apply_compare(op: CompareOp, a: Value, b: Value) -> Result<bool, RuntimeFault> {
    fn compare<T: PartialOrd>(op: CompareOp, a: T, b: T) -> bool {
        match op {
            CompareOp::Eq => a == b,
            CompareOp::Lt => a < b,
            CompareOp::Gt => a > b,
        }
    }

    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Ok(compare(op, a, b)),
        (Value::Long(a), Value::Long(b)) => Ok(compare(op, a, b)),
        (Value::Float(a), Value::Float(b)) => Ok(compare(op, a, b)),
        (Value::Double(a), Value::Double(b)) => Ok(compare(op, a, b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(match op {
            CompareOp::Eq => a == b,
            _ => {
                return Err(RuntimeFault::TypeMismatch {
                    expected: "ordered type".to_string(),
                    found: "bool".to_string(),
                })
            }
        }),
        (a, b) => Err(RuntimeFault::TypeMismatch {
            expected: a.type_name().to_string(),
            found: b.type_name().to_string(),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ipush_round_trips_through_debug() {
        let instruction = Instruction::parse("IPUSH", &["3"], 1).unwrap();
        assert_eq!(instruction.debug(), "IPUSH 3");
    }

    #[test]
    fn unknown_word_is_a_load_error() {
        assert!(Instruction::parse("FROBNICATE", &[], 1).is_err());
    }

    #[test]
    fn s6_addition_executes_against_a_frame() {
        use crate::bytecode::class::Class;
        use crate::bytecode::modifier::Modifiers;
        use crate::vm::config::VmConfig;

        let mut vm = VirtualMachine::new(VmConfig::default());
        vm.register_class(Class {
            name: "Main".to_string(),
            super_name: "Object".to_string(),
            modifiers: Modifiers::empty(),
            interfaces: vec![],
            methods: vec![],
            fields: vec![],
            inner_classes: vec![],
        })
        .unwrap();

        let mut frame = Frame::new(0, 0, Vec::new());
        Instruction::parse("IPUSH", &["3"], 1).unwrap().execute(&mut frame, &mut vm).unwrap();
        Instruction::parse("IPUSH", &["4"], 2).unwrap().execute(&mut frame, &mut vm).unwrap();
        Instruction::parse("IADD", &[], 3).unwrap().execute(&mut frame, &mut vm).unwrap();
        assert_eq!(frame.pop().unwrap(), Value::Int(7));
    }
}
