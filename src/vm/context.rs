//! The execution context: a call stack of frames (spec.md §4.7).

use crate::error::RuntimeFault;
use crate::vm::value::Value;

/// One method invocation: an operand stack, a fixed-size local slot array,
/// a program counter, and the indices of the class/method being run.
#[derive(Debug)]
pub struct Frame {
    pub operand_stack: Vec<Value>,
    pub locals: Vec<Value>,
    pub pc: usize,
    pub class_index: usize,
    pub method_index: usize,
}

impl Frame {
    pub fn new(class_index: usize, method_index: usize, locals: Vec<Value>) -> Frame {
        Frame {
            operand_stack: Vec::new(),
            locals,
            pc: 0,
            class_index,
            method_index,
        }
    }

    pub fn push(&mut self, value: Value) {
        self.operand_stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeFault> {
        self.operand_stack.pop().ok_or(RuntimeFault::StackUnderflow)
    }

    pub fn local(&self, index: u16) -> Result<Value, RuntimeFault> {
        self.locals
            .get(index as usize)
            .cloned()
            .ok_or(RuntimeFault::StackUnderflow)
    }

    pub fn set_local(&mut self, index: u16, value: Value) -> Result<(), RuntimeFault> {
        let slot = self
            .locals
            .get_mut(index as usize)
            .ok_or(RuntimeFault::StackUnderflow)?;
        *slot = value;
        Ok(())
    }
}

/// The call stack for one running root-method invocation (spec.md §4.7,
/// §5 "Ownership"). Each frame owns its locals; the operand stack holds
/// primitive values or non-owning heap references.
#[derive(Debug, Default)]
pub struct Context {
    frames: Vec<Frame>,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    pub fn push_frame(&mut self, frame: Frame, max_depth: usize) -> Result<(), RuntimeFault> {
        if self.frames.len() >= max_depth {
            return Err(RuntimeFault::StackOverflow(max_depth));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn current_mut(&mut self) -> Result<&mut Frame, RuntimeFault> {
        self.frames.last_mut().ok_or(RuntimeFault::StackUnderflow)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
