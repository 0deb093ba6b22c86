//! Identity table
//!
//! Maps object identity to a dense per-export index plus a reference
//! count. Indices are handed out at first visit, so the table works for any
//! model that can compare [`ObjectRef`]s. One table per export call.

use rehydrate_core::ObjectRef;
use std::collections::HashMap;

/// Dense index of an object within one export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity(pub usize);

/// Outcome of visiting an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Never seen before: emit its payload
    First(Identity),
    /// Seen before (shared or cyclic): emit a bare reference
    Again(Identity),
}

#[derive(Debug, Default)]
pub struct IdentityTable {
    index: HashMap<ObjectRef, Identity>,
    refcounts: Vec<u32>,
}

impl IdentityTable {
    pub fn new() -> Self {
        IdentityTable::default()
    }

    /// Record one more occurrence of `obj`
    pub fn visit(&mut self, obj: ObjectRef) -> Visit {
        if let Some(&id) = self.index.get(&obj) {
            self.refcounts[id.0] += 1;
            return Visit::Again(id);
        }
        let id = Identity(self.refcounts.len());
        self.index.insert(obj, id);
        self.refcounts.push(1);
        Visit::First(id)
    }

    pub fn refcount(&self, id: Identity) -> u32 {
        self.refcounts.get(id.0).copied().unwrap_or(0)
    }

    /// Shared or self-referencing objects need a binding in the final text
    pub fn needs_binding(&self, id: Identity) -> bool {
        self.refcount(id) > 1
    }

    /// Number of distinct objects visited
    pub fn objects(&self) -> usize {
        self.refcounts.len()
    }

    /// Number of objects that will carry a binding
    pub fn bindings(&self) -> usize {
        self.refcounts.iter().filter(|&&n| n > 1).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_then_again() {
        let mut table = IdentityTable::new();
        let a = ObjectRef(7);
        let b = ObjectRef(3);

        assert_eq!(table.visit(a), Visit::First(Identity(0)));
        assert_eq!(table.visit(b), Visit::First(Identity(1)));
        assert_eq!(table.visit(a), Visit::Again(Identity(0)));

        assert_eq!(table.refcount(Identity(0)), 2);
        assert!(table.needs_binding(Identity(0)));
        assert!(!table.needs_binding(Identity(1)));
        assert_eq!(table.objects(), 2);
        assert_eq!(table.bindings(), 1);
    }
}
