//! # Section Snapshot Store
//!
//! Pristine copies of each section, taken before any decoration is
//! attached and with all bookkeeping attributes stripped.
//!
//! Snapshots are `Arc<VNode>` and are never mutated: a reset builds a fresh
//! subtree *from* the snapshot, so any number of resets reproduce the same
//! content.

use crate::markers;
use sitecanvas_dom::{NodeId, Tree, VNode};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct SnapshotStore {
    sections: HashMap<String, Arc<VNode>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a clean deep copy of `node` under `section_id`.
    ///
    /// A section is captured once; later calls for the same id are ignored.
    pub fn capture(&mut self, section_id: &str, tree: &Tree, node: NodeId) -> bool {
        if self.sections.contains_key(section_id) {
            return false;
        }
        let Some(mut copy) = tree.to_vnode(node) else {
            return false;
        };
        copy.retain_attributes_deep(&|name| !markers::is_bookkeeping_attr(name));
        self.sections.insert(section_id.to_string(), Arc::new(copy));
        true
    }

    pub fn get(&self, section_id: &str) -> Option<Arc<VNode>> {
        self.sections.get(section_id).cloned()
    }

    /// Build a detached copy of the pristine section, tagged with its id
    pub fn restore(&self, section_id: &str, tree: &mut Tree) -> Option<NodeId> {
        let snapshot = self.sections.get(section_id)?;
        let id = tree.build(snapshot);
        if let Some(el) = tree.element_mut(id) {
            el.set_attr(markers::SECTION, section_id);
        }
        Some(id)
    }

    /// Free the snapshot of a permanently deleted section
    pub fn discard(&mut self, section_id: &str) -> bool {
        self.sections.remove(section_id).is_some()
    }

    pub fn contains(&self, section_id: &str) -> bool {
        self.sections.contains_key(section_id)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecanvas_dom::{parse_document, serialize_node_with, KeepAll};

    #[test]
    fn test_capture_strips_bookkeeping() {
        let tree = parse_document(
            r#"<section data-sc-section="section_1" class="hero"><h1 data-sc-key="hero_h1_1" contenteditable="true">Hi</h1></section>"#,
        );
        let section = tree.children(tree.root())[0];
        let mut store = SnapshotStore::new();
        assert!(store.capture("section_1", &tree, section));

        let copy = store.get("section_1").unwrap();
        assert_eq!(copy.attr("class"), Some("hero"));
        assert_eq!(copy.attr(markers::SECTION), None);
        assert_eq!(copy.children()[0].attr(markers::KEY), None);
        assert_eq!(copy.children()[0].attr(markers::CONTENT_EDITABLE), None);
    }

    #[test]
    fn test_restore_is_repeatable_and_capture_once() {
        let mut tree = parse_document(r#"<section><p>Original</p></section>"#);
        let section = tree.children(tree.root())[0];
        let mut store = SnapshotStore::new();
        store.capture("section_1", &tree, section);

        let p = tree.element_children(section)[0];
        tree.set_text(p, "Edited").unwrap();
        assert!(!store.capture("section_1", &tree, section));

        let first = store.restore("section_1", &mut tree).unwrap();
        let second = store.restore("section_1", &mut tree).unwrap();
        assert_ne!(first, second);
        assert_eq!(
            serialize_node_with(&tree, first, &KeepAll),
            r#"<section data-sc-section="section_1"><p>Original</p></section>"#
        );
        assert_eq!(
            serialize_node_with(&tree, first, &KeepAll),
            serialize_node_with(&tree, second, &KeepAll)
        );
    }

    #[test]
    fn test_discard() {
        let tree = parse_document("<section>x</section>");
        let mut store = SnapshotStore::new();
        store.capture("section_1", &tree, tree.children(tree.root())[0]);
        assert!(store.discard("section_1"));
        assert!(!store.discard("section_1"));
        assert!(store.is_empty());
    }
}
