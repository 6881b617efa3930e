//! The instance heap (spec.md §5 "Ownership", §4.6 `NEW`/`InstanceDelete`).
//!
//! Instances live in an arena indexed by [`InstanceId`] rather than behind
//! a raw pointer. Deleting an instance sets its slot to `None`; any
//! subsequent dereference through a stale [`InstanceId`] is then a cheap
//! `Option::None` check that surfaces as [`RuntimeFault::UseAfterDelete`]
//! instead of a dangling-pointer hazard (spec.md §5).

use std::collections::HashMap;

use crate::error::RuntimeFault;
use crate::vm::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub class_index: usize,
    pub fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class_index: usize) -> Instance {
        Instance {
            class_index,
            fields: HashMap::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Option<Instance>>,
}

impl Heap {
    pub fn new() -> Heap {
        Heap::default()
    }

    pub fn allocate(&mut self, class_index: usize) -> InstanceId {
        let id = InstanceId(self.slots.len());
        self.slots.push(Some(Instance::new(class_index)));
        id
    }

    pub fn get(&self, id: InstanceId) -> Result<&Instance, RuntimeFault> {
        self.slots
            .get(id.0)
            .and_then(|slot| slot.as_ref())
            .ok_or(RuntimeFault::UseAfterDelete)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Result<&mut Instance, RuntimeFault> {
        self.slots
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .ok_or(RuntimeFault::UseAfterDelete)
    }

    /// Invalidates every alias to this instance. The slot becomes `None`;
    /// `get`/`get_mut` on a stale id now fail cleanly.
    pub fn delete(&mut self, id: InstanceId) -> Result<(), RuntimeFault> {
        let slot = self.slots.get_mut(id.0).ok_or(RuntimeFault::UseAfterDelete)?;
        if slot.is_none() {
            return Err(RuntimeFault::UseAfterDelete);
        }
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn delete_then_use_is_a_fault() {
        let mut heap = Heap::new();
        let id = heap.allocate(0);
        assert!(heap.get(id).is_ok());
        heap.delete(id).unwrap();
        assert_eq!(heap.get(id), Err(RuntimeFault::UseAfterDelete));
    }

    #[test]
    fn double_delete_is_a_fault() {
        let mut heap = Heap::new();
        let id = heap.allocate(0);
        heap.delete(id).unwrap();
        assert_eq!(heap.delete(id), Err(RuntimeFault::UseAfterDelete));
    }
}
