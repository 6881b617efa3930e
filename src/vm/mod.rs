//! The runtime: values, heap, execution context, configuration, and the
//! virtual machine that ties them together (spec.md §4.7, §5).

pub mod config;
pub mod context;
pub mod heap;
pub mod machine;
pub mod value;

pub use config::{LoaderConfig, VmConfig};
pub use context::{Context, Frame};
pub use heap::{Heap, Instance, InstanceId};
pub use machine::VirtualMachine;
pub use value::Value;
