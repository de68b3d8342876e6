//! # Content Tree
//!
//! Arena-backed node tree with parent links.
//!
//! Nodes are addressed by [`NodeId`]. An id stays valid until its node is
//! removed and is never handed out again, so editor metadata keyed by
//! `NodeId` can detect deletion with [`Tree::is_alive`] instead of dangling.

use crate::error::{DomError, DomResult};
use crate::style;
use crate::vdom::VNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle to a node in a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tag name plus ordered attributes
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|(key, _)| key == name)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.attr("style")
            .and_then(|s| style::get_property(s, property))
    }

    pub fn set_style(&mut self, property: &str, value: &str) {
        let current = self.attr("style").unwrap_or("");
        let updated = style::set_property(current, property, value);
        self.set_attr("style", updated);
    }

    pub fn remove_style(&mut self, property: &str) {
        if let Some(current) = self.attr("style") {
            let updated = style::remove_property(current, property);
            if updated.is_empty() {
                self.remove_attr("style");
            } else {
                self.set_attr("style", updated);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Synthetic root holding top-level nodes
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena of nodes addressed by [`NodeId`].
///
/// Freed slots are never handed out again, so a stale id can only miss and
/// never alias a newer node. The arena lives as long as one loaded document;
/// a session gets a fresh tree on every load.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Option<Slot>>,
    live: usize,
    root: NodeId,
    doctype: Option<String>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            slots: vec![Some(Slot {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            })],
            live: 1,
            root: NodeId(0),
            doctype: None,
        }
    }

    /// Build a tree whose root holds copies of `nodes`
    pub fn from_vnodes(doctype: Option<String>, nodes: &[VNode]) -> Self {
        let mut tree = Self::new();
        tree.doctype = doctype;
        let root = tree.root;
        for node in nodes {
            let id = tree.build(node);
            tree.attach(root, id, None);
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn set_doctype(&mut self, doctype: Option<String>) {
        self.doctype = doctype;
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.index()).and_then(|s| s.as_ref())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots.get_mut(id.index()).and_then(|s| s.as_mut())
    }

    fn require(&self, id: NodeId) -> DomResult<&Slot> {
        self.slot(id).ok_or(DomError::NodeNotFound(id))
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    /// Number of live nodes (including the root)
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slot(id).map(|s| &s.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.slot_mut(id).map(|s| &mut s.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn set_text_node(&mut self, id: NodeId, content: impl Into<String>) -> DomResult<()> {
        match self.slot_mut(id).map(|s| &mut s.data) {
            Some(NodeData::Text(text)) => {
                *text = content.into();
                Ok(())
            }
            Some(_) => Err(DomError::NotText(id)),
            None => Err(DomError::NodeNotFound(id)),
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    /// Element children only
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.live += 1;
        self.slots.push(Some(Slot {
            data,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, element: ElementData) -> NodeId {
        self.alloc(NodeData::Element(element))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(content.into()))
    }

    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(content.into()))
    }

    /// Create detached nodes from an owned copy
    pub fn build(&mut self, node: &VNode) -> NodeId {
        match node {
            VNode::Element {
                tag,
                attributes,
                children,
            } => {
                let id = self.alloc(NodeData::Element(ElementData {
                    tag: tag.clone(),
                    attributes: attributes.clone(),
                }));
                for child in children {
                    let child_id = self.build(child);
                    self.attach(id, child_id, None);
                }
                id
            }
            VNode::Text { content } => self.alloc(NodeData::Text(content.clone())),
            VNode::Comment { content } => self.alloc(NodeData::Comment(content.clone())),
        }
    }

    /// Deep copy of a subtree (the root yields `None`; use [`Tree::to_vnodes`])
    pub fn to_vnode(&self, id: NodeId) -> Option<VNode> {
        let slot = self.slot(id)?;
        match &slot.data {
            NodeData::Document => None,
            NodeData::Element(el) => Some(VNode::Element {
                tag: el.tag.clone(),
                attributes: el.attributes.clone(),
                children: self.to_vnodes(id),
            }),
            NodeData::Text(text) => Some(VNode::text(text.clone())),
            NodeData::Comment(text) => Some(VNode::comment(text.clone())),
        }
    }

    /// Deep copies of every child of `id`
    pub fn to_vnodes(&self, id: NodeId) -> Vec<VNode> {
        self.children(id)
            .iter()
            .filter_map(|child| self.to_vnode(*child))
            .collect()
    }

    // Links an already-detached child; callers validate first.
    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        if let Some(slot) = self.slot_mut(parent) {
            match index {
                Some(i) if i <= slot.children.len() => slot.children.insert(i, child),
                _ => slot.children.push(child),
            }
        }
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.require(parent)?;
        self.require(child)?;
        if child == self.root {
            return Err(DomError::CycleDetected(child));
        }
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(DomError::CycleDetected(child));
        }
        Ok(())
    }

    /// Remove `id` from its parent, keeping the subtree alive
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        self.require(id)?;
        if let Some(parent) = self.parent(id) {
            if let Some(slot) = self.slot_mut(parent) {
                slot.children.retain(|c| *c != id);
            }
        }
        if let Some(slot) = self.slot_mut(id) {
            slot.parent = None;
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_at(parent, usize::MAX, child)
    }

    /// Insert `child` into `parent` at `index` (clamped to the end)
    pub fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) -> DomResult<()> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        let len = self.children(parent).len();
        self.attach(parent, child, Some(index.min(len)));
        Ok(())
    }

    /// Insert `child` before `reference`; `None` appends
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.check_insert(parent, child)?;
        if reference == Some(child) {
            return Ok(());
        }
        self.detach(child)?;
        let index = match reference {
            Some(reference) => self
                .children(parent)
                .iter()
                .position(|c| *c == reference)
                .ok_or(DomError::NotAChild {
                    parent,
                    node: reference,
                })?,
            None => self.children(parent).len(),
        };
        self.attach(parent, child, Some(index));
        Ok(())
    }

    /// Insert `child` immediately after `reference`
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> DomResult<()> {
        let parent = self.parent(reference).ok_or(DomError::Detached(reference))?;
        if reference == child {
            return Ok(());
        }
        self.check_insert(parent, child)?;
        self.detach(child)?;
        let index = self
            .index_in_parent(reference)
            .ok_or(DomError::Detached(reference))?;
        self.attach(parent, child, Some(index + 1));
        Ok(())
    }

    /// Detach and free a subtree
    pub fn remove(&mut self, id: NodeId) -> DomResult<()> {
        if id == self.root {
            return Err(DomError::CycleDetected(id));
        }
        self.detach(id)?;
        self.free(id);
        Ok(())
    }

    fn free(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(slot) = self.slots.get_mut(current.index()).and_then(Option::take) {
                pending.extend(slot.children);
                self.live -= 1;
            }
        }
    }

    /// Slots ever allocated, live or freed
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Put `replacement` where `old` is and free `old`
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) -> DomResult<()> {
        let parent = self.parent(old).ok_or(DomError::Detached(old))?;
        self.insert_before(parent, replacement, Some(old))?;
        self.remove(old)
    }

    /// Replace an element with its children
    pub fn unwrap(&mut self, id: NodeId) -> DomResult<()> {
        let parent = self.parent(id).ok_or(DomError::Detached(id))?;
        let children = self.children(id).to_vec();
        for child in children {
            self.insert_before(parent, child, Some(id))?;
        }
        self.remove(id)
    }

    /// Wrap `id` in a new element placed at its position
    pub fn wrap(&mut self, id: NodeId, wrapper: ElementData) -> DomResult<NodeId> {
        let parent = self.parent(id).ok_or(DomError::Detached(id))?;
        let wrapper_id = self.create_element(wrapper);
        self.insert_before(parent, wrapper_id, Some(id))?;
        self.append_child(wrapper_id, id)?;
        Ok(wrapper_id)
    }

    /// Remove every child of `id`
    pub fn clear_children(&mut self, id: NodeId) -> DomResult<()> {
        let children = self.require(id)?.children.clone();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Parent chain of `id`, nearest first (excludes `id`)
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Nearest node (starting with `id` itself) matching `pred`
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Tree, NodeId) -> bool) -> Option<NodeId> {
        if !self.is_alive(id) {
            return None;
        }
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|candidate| pred(self, *candidate))
    }

    /// `id` and every descendant in document order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.is_alive(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Replace the children of `id` with a single text node
    pub fn set_text(&mut self, id: NodeId, content: impl Into<String>) -> DomResult<NodeId> {
        self.clear_children(id)?;
        let text = self.create_text(content);
        self.append_child(id, text)?;
        Ok(text)
    }

    /// Split a text node at a character offset; returns the new second half
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> DomResult<NodeId> {
        let content = self.text(id).ok_or(DomError::NotText(id))?.to_string();
        let len = content.chars().count();
        if offset > len {
            return Err(DomError::OffsetOutOfBounds { offset, len });
        }
        let byte = content
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(content.len());
        let (head, tail) = content.split_at(byte);
        let tail_id = self.create_text(tail);
        self.set_text_node(id, head)?;
        self.insert_after(id, tail_id)?;
        Ok(tail_id)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.root();
        let section = tree.create_element(ElementData::new("section"));
        let a = tree.create_element(ElementData::new("p"));
        let b = tree.create_element(ElementData::new("p"));
        tree.append_child(root, section).unwrap();
        tree.append_child(section, a).unwrap();
        tree.append_child(section, b).unwrap();
        tree.set_text(a, "first").unwrap();
        tree.set_text(b, "second").unwrap();
        (tree, section, a, b)
    }

    #[test]
    fn test_insert_before_and_after() {
        let (mut tree, section, a, b) = sample();

        tree.insert_before(section, b, Some(a)).unwrap();
        assert_eq!(tree.children(section), &[b, a]);

        tree.insert_after(a, b).unwrap();
        assert_eq!(tree.children(section), &[a, b]);
    }

    #[test]
    fn test_remove_frees_subtree() {
        let (mut tree, section, a, _) = sample();
        let text = tree.children(a)[0];
        let before = tree.len();

        tree.remove(a).unwrap();

        assert!(!tree.is_alive(a));
        assert!(!tree.is_alive(text));
        assert_eq!(tree.children(section).len(), 1);
        assert_eq!(tree.len(), before - 2);
        assert_eq!(tree.len(), tree.descendants(tree.root()).len());
        assert!(tree.capacity() > tree.len());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let (mut tree, section, a, _) = sample();
        tree.remove(a).unwrap();

        let fresh = tree.create_element(ElementData::new("p"));
        tree.append_child(section, fresh).unwrap();

        assert_ne!(fresh, a);
        assert!(!tree.is_alive(a));
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut tree, section, a, _) = sample();
        let result = tree.append_child(a, section);
        assert_eq!(result, Err(DomError::CycleDetected(section)));
    }

    #[test]
    fn test_split_text_multibyte() {
        let mut tree = Tree::new();
        let p = tree.create_element(ElementData::new("p"));
        tree.append_child(tree.root(), p).unwrap();
        let text = tree.set_text(p, "héllo").unwrap();

        let tail = tree.split_text(text, 2).unwrap();

        assert_eq!(tree.text(text), Some("hé"));
        assert_eq!(tree.text(tail), Some("llo"));
        assert_eq!(tree.children(p), &[text, tail]);
        assert_eq!(
            tree.split_text(text, 9),
            Err(DomError::OffsetOutOfBounds { offset: 9, len: 2 })
        );
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let (mut tree, section, a, b) = sample();

        let frame = tree.wrap(a, ElementData::new("div")).unwrap();
        assert_eq!(tree.children(section), &[frame, b]);
        assert_eq!(tree.parent(a), Some(frame));

        tree.unwrap(frame).unwrap();
        assert_eq!(tree.children(section), &[a, b]);
        assert!(!tree.is_alive(frame));
    }

    #[test]
    fn test_vnode_round_trip() {
        let (tree, section, _, _) = sample();
        let copy = tree.to_vnode(section).unwrap();

        let mut other = Tree::new();
        let id = other.build(&copy);
        assert_eq!(other.to_vnode(id), Some(copy));
    }

    #[test]
    fn test_descendants_document_order() {
        let (tree, section, a, b) = sample();
        let order = tree.descendants(section);
        let a_text = tree.children(a)[0];
        let b_text = tree.children(b)[0];
        assert_eq!(order, vec![section, a, a_text, b, b_text]);
    }

    #[test]
    fn test_element_style_helpers() {
        let mut el = ElementData::new("span");
        el.set_style("font-size", "20px");
        el.set_style("color", "red");
        assert_eq!(el.style("font-size").as_deref(), Some("20px"));

        el.remove_style("font-size");
        el.remove_style("color");
        assert!(!el.has_attr("style"));
    }
}
