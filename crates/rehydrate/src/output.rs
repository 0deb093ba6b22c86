//! Output tree and emission finalizer
//!
//! The exporter never writes placeholder syntax into text. It records
//! [`Node::Bind`] where an object's payload starts and [`Node::Ref`] where
//! the object is reached again. Only after the walk, when every reference
//! count is final, [`finalize`] turns the tree into text: a `Bind` becomes
//! `$o<name>=` when the object is shared or cyclic and nothing otherwise.
//! User strings are plain `Text` nodes and are never inspected.
//!
//! Names are handed out here, in text order, and only to objects that keep
//! a binding. An unshared object never consumes a name, so the names in the
//! final text are always `$o0`, `$o1`, ... without gaps.

use crate::identity::{Identity, IdentityTable};
use crate::naming;
use crate::syntax::PLACEHOLDER_SIGIL;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    /// Start of an object's payload
    Bind(Identity),
    /// Repeat occurrence of an object
    Ref(Identity),
}

#[derive(Debug, Default)]
pub struct OutputTree {
    nodes: Vec<Node>,
}

impl OutputTree {
    pub fn new() -> Self {
        OutputTree::default()
    }

    /// Append text, merging into the previous text node
    pub fn push_str(&mut self, s: &str) {
        if let Some(Node::Text(last)) = self.nodes.last_mut() {
            last.push_str(s);
        } else {
            self.nodes.push(Node::Text(s.to_string()));
        }
    }

    pub fn bind(&mut self, id: Identity) {
        self.nodes.push(Node::Bind(id));
    }

    pub fn reference(&mut self, id: Identity) {
        self.nodes.push(Node::Ref(id));
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// Serialize the tree, keeping only the bindings that are needed.
///
/// Names are given out in order of first appearance in the text, so the
/// n-th object that needs a binding is named `naming::encode(n)`.
pub fn finalize(tree: &OutputTree, identities: &IdentityTable) -> String {
    let mut names: HashMap<Identity, String> = HashMap::new();
    let mut out = String::new();

    for node in tree.nodes() {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Bind(id) | Node::Ref(id) => {
                if !identities.needs_binding(*id) {
                    continue;
                }
                let next = names.len();
                let name = names.entry(*id).or_insert_with(|| naming::encode(next));
                out.push_str(PLACEHOLDER_SIGIL);
                out.push_str(name);
                if matches!(node, Node::Bind(_)) {
                    out.push('=');
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Visit;
    use rehydrate_core::ObjectRef;

    fn id(visit: Visit) -> Identity {
        match visit {
            Visit::First(id) | Visit::Again(id) => id,
        }
    }

    #[test]
    fn test_text_nodes_merge() {
        let mut tree = OutputTree::new();
        tree.push_str("[");
        tree.push_str("1");
        assert_eq!(tree.nodes(), &[Node::Text("[1".to_string())]);
    }

    #[test]
    fn test_unshared_binding_is_dropped() {
        let mut table = IdentityTable::new();
        let mut tree = OutputTree::new();
        tree.bind(id(table.visit(ObjectRef(0))));
        tree.push_str("new record");

        assert_eq!(finalize(&tree, &table), "new record");
    }

    #[test]
    fn test_shared_binding_is_kept_and_named_in_text_order() {
        let mut table = IdentityTable::new();
        let mut tree = OutputTree::new();

        // First object is unshared and must not consume a name
        tree.push_str("[");
        tree.bind(id(table.visit(ObjectRef(5))));
        tree.push_str("new record,");
        let shared = id(table.visit(ObjectRef(9)));
        tree.bind(shared);
        tree.push_str("new record,");
        tree.reference(id(table.visit(ObjectRef(9))));
        tree.push_str("]");

        assert_eq!(
            finalize(&tree, &table),
            "[new record,$o0=new record,$o0]"
        );
    }

    #[test]
    fn test_text_resembling_placeholders_is_untouched() {
        let mut table = IdentityTable::new();
        let mut tree = OutputTree::new();
        tree.push_str("[\"$o0=\",");
        tree.bind(id(table.visit(ObjectRef(1))));
        tree.push_str("new record]");

        assert_eq!(finalize(&tree, &table), "[\"$o0=\",new record]");
    }
}
