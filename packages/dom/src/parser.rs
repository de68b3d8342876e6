//! Tolerant HTML parser.
//!
//! Templates are authored by hand and by generators, so the parser never
//! fails: unclosed elements are closed at end of input, stray end tags are
//! dropped, and anything that does not lex as markup becomes text.

use crate::lexer::{decode_entities, end_tag_name, parse_start_tag, Token};
use crate::tree::{ElementData, NodeData, NodeId, Tree};
use crate::vdom::VNode;
use logos::Logos;

pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements opened deeper than this take no children of their own
pub const MAX_DEPTH: usize = 256;

// Opening one of these closes an open <p>
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Parse a full document. The doctype, if any, is kept on the tree.
pub fn parse_document(source: &str) -> Tree {
    let mut builder = TreeBuilder::new();
    builder.run(source);
    builder.finish()
}

/// Parse markup into detached owned nodes
pub fn parse_fragment(source: &str) -> Vec<VNode> {
    let tree = parse_document(source);
    tree.to_vnodes(tree.root())
}

struct TreeBuilder {
    tree: Tree,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        let tree = Tree::new();
        let root = tree.root();
        Self {
            tree,
            stack: vec![root],
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.root())
    }

    fn current_tag(&self) -> Option<&str> {
        self.tree.tag(self.current())
    }

    fn run(&mut self, source: &str) {
        let mut lex = Token::lexer(source);

        while let Some(token) = lex.next() {
            match token {
                Ok(Token::Text(text)) => self.push_text(&decode_entities(text)),
                Ok(Token::Comment(content)) => self.push_comment(content),
                Ok(Token::Declaration(decl)) => {
                    if self.tree.doctype().is_none() {
                        self.tree.set_doctype(Some(decl.to_string()));
                    }
                }
                Ok(Token::EndTag(slice)) => self.close(&end_tag_name(slice)),
                Ok(Token::StartTag(slice)) => {
                    let tag = parse_start_tag(slice);
                    let name = tag.name.clone();
                    let opened = self.open(tag.name, tag.attributes, tag.self_closing);

                    if opened && is_raw_text(&name) {
                        let rest = lex.remainder();
                        let end = find_raw_text_end(rest, &name).unwrap_or(rest.len());
                        if end > 0 {
                            self.push_raw_text(&rest[..end]);
                        }
                        lex.bump(end);
                    }
                }
                Err(()) => self.push_text(lex.slice()),
            }
        }
    }

    fn finish(self) -> Tree {
        self.tree
    }

    fn append(&mut self, node: NodeId) {
        let parent = self.current();
        if let Err(err) = self.tree.append_child(parent, node) {
            tracing::debug!(%err, "dropping node during parse");
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        if let Some(last) = self.tree.children(parent).last().copied() {
            if let Some(NodeData::Text(existing)) = self.tree.data(last) {
                let merged = format!("{}{}", existing, text);
                if let Err(err) = self.tree.set_text_node(last, merged) {
                    tracing::debug!(%err, "dropping text during parse");
                }
                return;
            }
        }
        let node = self.tree.create_text(text);
        self.append(node);
    }

    fn push_raw_text(&mut self, text: &str) {
        let node = self.tree.create_text(text);
        self.append(node);
    }

    fn push_comment(&mut self, content: &str) {
        let node = self.tree.create_comment(content);
        self.append(node);
    }

    /// Returns true when the element stays open for children
    fn open(&mut self, name: String, attributes: Vec<(String, String)>, self_closing: bool) -> bool {
        if CLOSES_PARAGRAPH.contains(&name.as_str()) && self.current_tag() == Some("p") {
            self.stack.pop();
        }
        if name == "li" {
            self.close_open_list_item();
        }

        let void = is_void(&name);
        let node = self.tree.create_element(ElementData {
            tag: name,
            attributes,
        });
        self.append(node);

        if void || self_closing {
            return false;
        }
        if self.stack.len() > MAX_DEPTH {
            tracing::debug!(depth = self.stack.len(), "nesting too deep, flattening");
            return false;
        }
        self.stack.push(node);
        true
    }

    fn close_open_list_item(&mut self) {
        for depth in (1..self.stack.len()).rev() {
            match self.tree.tag(self.stack[depth]) {
                Some("li") => {
                    self.stack.truncate(depth);
                    return;
                }
                Some("ul") | Some("ol") => return,
                _ => {}
            }
        }
    }

    fn close(&mut self, name: &str) {
        if is_void(name) {
            return;
        }
        let found = (1..self.stack.len())
            .rev()
            .find(|depth| self.tree.tag(self.stack[*depth]) == Some(name));

        match found {
            Some(depth) => self.stack.truncate(depth),
            None => tracing::debug!(tag = name, "ignoring stray end tag"),
        }
    }
}

fn find_raw_text_end(rest: &str, tag: &str) -> Option<usize> {
    let needle = format!("</{}", tag);
    let lower = rest.to_ascii_lowercase();
    lower.find(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::serialize;

    #[test]
    fn test_parse_nested() {
        let tree = parse_document(r#"<section class="hero"><h1>Title</h1><p>Body</p></section>"#);
        let section = tree.children(tree.root())[0];
        assert_eq!(tree.tag(section), Some("section"));
        assert_eq!(tree.attr(section, "class"), Some("hero"));
        assert_eq!(tree.element_children(section).len(), 2);
        assert_eq!(tree.text_content(section), "TitleBody");
    }

    #[test]
    fn test_void_and_self_closing() {
        let tree = parse_document(r#"<div><img src="a.png"><br/><span/>x</div>"#);
        let div = tree.children(tree.root())[0];
        let tags: Vec<_> = tree
            .children(div)
            .iter()
            .map(|c| tree.tag(*c).unwrap_or("#text"))
            .collect();
        assert_eq!(tags, vec!["img", "br", "span", "#text"]);
    }

    #[test]
    fn test_implicit_closes() {
        let tree = parse_document("<ul><li>One<li>Two</ul><p>A<p>B");
        assert_eq!(
            serialize(&tree),
            "<ul><li>One</li><li>Two</li></ul><p>A</p><p>B</p>"
        );
    }

    #[test]
    fn test_stray_end_tag_ignored() {
        let tree = parse_document("<div>a</span>b</div>");
        assert_eq!(serialize(&tree), "<div>ab</div>");
    }

    #[test]
    fn test_raw_text() {
        let tree = parse_document("<style>p > a { color: red }</style><p>x</p>");
        let style = tree.children(tree.root())[0];
        assert_eq!(tree.text_content(style), "p > a { color: red }");
        assert_eq!(tree.element_children(tree.root()).len(), 2);
    }

    #[test]
    fn test_doctype_and_entities() {
        let tree = parse_document("<!DOCTYPE html><p>Tom &amp; Jerry</p>");
        assert_eq!(tree.doctype(), Some("DOCTYPE html"));
        assert_eq!(tree.text_content(tree.root()), "Tom & Jerry");
    }

    #[test]
    fn test_deep_nesting_is_flattened() {
        let source = "<div>".repeat(10_000) + "x";
        let tree = parse_document(&source);
        let depth = tree
            .descendants(tree.root())
            .into_iter()
            .map(|id| tree.ancestors(id).count())
            .max()
            .unwrap();
        assert!(depth <= MAX_DEPTH + 1);
        assert_eq!(tree.text_content(tree.root()), "x");
        assert!(serialize(&tree).ends_with("x</div></div>"));
    }

    #[test]
    fn test_parse_fragment() {
        let nodes = parse_fragment("<b>x</b> y");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].tag(), Some("b"));
        assert_eq!(nodes[1], VNode::text(" y"));
    }
}
