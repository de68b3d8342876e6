//! Tree → HTML.
//!
//! A [`NodeFilter`] decides per node whether it is written, skipped, or
//! replaced by its children, and per attribute whether it is written. The
//! editor uses this to emit clean documents without touching the live tree.

use crate::parser::{is_raw_text, is_void};
use crate::tree::{NodeData, NodeId, Tree};
use crate::vdom::VNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Keep,
    /// Drop the node and its subtree
    Skip,
    /// Drop the node but write its children in its place
    Unwrap,
}

pub trait NodeFilter {
    fn node(&self, _tree: &Tree, _id: NodeId) -> FilterAction {
        FilterAction::Keep
    }

    fn attribute(&self, _name: &str) -> bool {
        true
    }
}

/// Writes everything
pub struct KeepAll;

impl NodeFilter for KeepAll {}

pub fn serialize(tree: &Tree) -> String {
    serialize_with(tree, &KeepAll)
}

/// Whole document, doctype included
pub fn serialize_with(tree: &Tree, filter: &dyn NodeFilter) -> String {
    let mut ser = Serializer::new(tree, filter);
    if let Some(doctype) = tree.doctype() {
        ser.buffer.push_str("<!");
        ser.buffer.push_str(doctype);
        ser.buffer.push('>');
    }
    ser.write_children(tree.root(), false);
    ser.buffer
}

/// Outer markup of one node
pub fn serialize_node_with(tree: &Tree, id: NodeId, filter: &dyn NodeFilter) -> String {
    let mut ser = Serializer::new(tree, filter);
    ser.write_node(id, false);
    ser.buffer
}

/// Inner markup of one node
pub fn serialize_children_with(tree: &Tree, id: NodeId, filter: &dyn NodeFilter) -> String {
    let mut ser = Serializer::new(tree, filter);
    let raw = tree.tag(id).map(is_raw_text).unwrap_or(false);
    ser.write_children(id, raw);
    ser.buffer
}

pub fn serialize_vnodes(nodes: &[VNode]) -> String {
    let mut buffer = String::new();
    for node in nodes {
        write_vnode(&mut buffer, node, false);
    }
    buffer
}

struct Serializer<'a> {
    tree: &'a Tree,
    filter: &'a dyn NodeFilter,
    buffer: String,
}

impl<'a> Serializer<'a> {
    fn new(tree: &'a Tree, filter: &'a dyn NodeFilter) -> Self {
        Self {
            tree,
            filter,
            buffer: String::new(),
        }
    }

    fn write_children(&mut self, id: NodeId, raw: bool) {
        for child in self.tree.children(id) {
            self.write_node(*child, raw);
        }
    }

    fn write_node(&mut self, id: NodeId, raw: bool) {
        let tree = self.tree;
        let Some(data) = tree.data(id) else {
            return;
        };

        match data {
            NodeData::Document => self.write_children(id, false),
            NodeData::Text(text) => {
                if raw {
                    self.buffer.push_str(text);
                } else {
                    escape_text(&mut self.buffer, text);
                }
            }
            NodeData::Comment(text) => {
                self.buffer.push_str("<!--");
                self.buffer.push_str(text);
                self.buffer.push_str("-->");
            }
            NodeData::Element(el) => match self.filter.node(tree, id) {
                FilterAction::Skip => {}
                FilterAction::Unwrap => self.write_children(id, raw),
                FilterAction::Keep => {
                    self.buffer.push('<');
                    self.buffer.push_str(&el.tag);
                    for (name, value) in &el.attributes {
                        if self.filter.attribute(name) {
                            write_attribute(&mut self.buffer, name, value);
                        }
                    }
                    self.buffer.push('>');

                    if is_void(&el.tag) {
                        return;
                    }
                    self.write_children(id, is_raw_text(&el.tag));
                    self.buffer.push_str("</");
                    self.buffer.push_str(&el.tag);
                    self.buffer.push('>');
                }
            },
        }
    }
}

fn write_vnode(buffer: &mut String, node: &VNode, raw: bool) {
    match node {
        VNode::Text { content } if raw => buffer.push_str(content),
        VNode::Text { content } => escape_text(buffer, content),
        VNode::Comment { content } => {
            buffer.push_str("<!--");
            buffer.push_str(content);
            buffer.push_str("-->");
        }
        VNode::Element {
            tag,
            attributes,
            children,
        } => {
            buffer.push('<');
            buffer.push_str(tag);
            for (name, value) in attributes {
                write_attribute(buffer, name, value);
            }
            buffer.push('>');
            if is_void(tag) {
                return;
            }
            for child in children {
                write_vnode(buffer, child, is_raw_text(tag));
            }
            buffer.push_str("</");
            buffer.push_str(tag);
            buffer.push('>');
        }
    }
}

fn write_attribute(buffer: &mut String, name: &str, value: &str) {
    buffer.push(' ');
    buffer.push_str(name);
    if value.is_empty() {
        return;
    }
    buffer.push_str("=\"");
    for c in value.chars() {
        match c {
            '&' => buffer.push_str("&amp;"),
            '"' => buffer.push_str("&quot;"),
            _ => buffer.push(c),
        }
    }
    buffer.push('"');
}

pub fn escape_text(buffer: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => buffer.push_str("&amp;"),
            '<' => buffer.push_str("&lt;"),
            '>' => buffer.push_str("&gt;"),
            '\u{a0}' => buffer.push_str("&nbsp;"),
            _ => buffer.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    struct DropMarked;

    impl NodeFilter for DropMarked {
        fn node(&self, tree: &Tree, id: NodeId) -> FilterAction {
            match tree.attr(id, "data-role") {
                Some("ui") => FilterAction::Skip,
                Some("frame") => FilterAction::Unwrap,
                _ => FilterAction::Keep,
            }
        }

        fn attribute(&self, name: &str) -> bool {
            name != "data-role"
        }
    }

    #[test]
    fn test_round_trip() {
        let source = r#"<!DOCTYPE html><html><body><p class="a">x &amp; y</p><img src="a.png" alt=""><script>if (a < b) {}</script></body></html>"#;
        let tree = parse_document(source);
        assert_eq!(
            serialize(&tree),
            r#"<!DOCTYPE html><html><body><p class="a">x &amp; y</p><img src="a.png" alt><script>if (a < b) {}</script></body></html>"#
        );
    }

    #[test]
    fn test_filter_skip_and_unwrap() {
        let tree = parse_document(
            r#"<div data-role="frame"><img src="a.png"><button data-role="ui">x</button></div><p>t</p>"#,
        );
        assert_eq!(
            serialize_with(&tree, &DropMarked),
            r#"<img src="a.png"><p>t</p>"#
        );
    }

    #[test]
    fn test_attribute_escaping() {
        let node = VNode::element("a").with_attr("title", r#"say "hi" & go"#);
        assert_eq!(
            serialize_vnodes(&[node]),
            r#"<a title="say &quot;hi&quot; &amp; go"></a>"#
        );
    }

    #[test]
    fn test_inner_and_outer() {
        let tree = parse_document("<p>a<strong>b</strong></p>");
        let p = tree.children(tree.root())[0];
        assert_eq!(serialize_children_with(&tree, p, &KeepAll), "a<strong>b</strong>");
        assert_eq!(
            serialize_node_with(&tree, p, &KeepAll),
            "<p>a<strong>b</strong></p>"
        );
    }
}
