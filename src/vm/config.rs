//! Ambient embedder-tunable knobs (SPEC_FULL.md "Ambient: configuration").
//!
//! Not a spec feature addition: this generalizes the handful of dials a
//! host embedding the loader and VM would need, the way the teacher's
//! `VM::init` is parameterized by a `Closure`. Defaults match the spec's
//! implied behavior exactly.

/// Tunables for [`crate::bytecode::loader`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Initial capacity hint for a method's operand stack, avoiding a few
    /// early reallocations on hot loader paths.
    pub initial_stack_capacity: usize,
}

impl Default for LoaderConfig {
    fn default() -> LoaderConfig {
        LoaderConfig {
            initial_stack_capacity: 16,
        }
    }
}

/// Tunables for [`crate::vm::machine::VirtualMachine`].
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Call depth at which further invocation raises
    /// [`crate::error::RuntimeFault::StackOverflow`] rather than growing
    /// the context's frame stack without bound.
    pub max_call_depth: usize,
}

impl Default for VmConfig {
    fn default() -> VmConfig {
        VmConfig { max_call_depth: 1024 }
    }
}
