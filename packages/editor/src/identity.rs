//! # Identity Assignment
//!
//! Gives every editable occurrence a key that stays put for the rest of the
//! session.
//!
//! ## Categories
//!
//! - **Text**: headings, paragraphs, list items, quotes, captions and
//!   buttons with enough visible text. Key `{section}_{tag}_{n}` unless
//!   the author supplied `data-key`.
//! - **Image**: `img` with a real source. Key `{base}__inst_{n}` so that
//!   identical images stay independently addressable.
//! - **Link**: every `a`, including ones with no destination yet, so the
//!   user can repair them. Key `link_{n}`.
//! - **Section**: top-level structural containers. Id `section_{n}`.
//!
//! ## Scoping
//!
//! [`IdentityAssigner::assign`] only keys nodes that have no key yet and
//! only inside the scope it is given. Re-running it after a reorder or a
//! reset never touches keys outside the mutated region.

use crate::markers;
use sitecanvas_dom::{NodeId, Tree};
use sitecanvas_protocol::{keys, ItemType};
use std::collections::HashMap;

const TEXT_TAGS: &[&str] = &[
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "p",
    "li",
    "blockquote",
    "figcaption",
    "button",
];

const SECTION_TAGS: &[&str] = &["section", "header", "footer", "nav", "main", "article", "aside"];

/// Section tags that only wrap the real sections when they hold any
const WRAPPER_TAGS: &[&str] = &["main", "article"];

const NON_CONTENT_TAGS: &[&str] = &["script", "style", "template", "noscript", "head", "meta", "link"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Text,
    Image,
    Link,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Text => "text",
            Category::Image => "image",
            Category::Link => "link",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Category::Text),
            "image" => Some(Category::Image),
            "link" => Some(Category::Link),
            _ => None,
        }
    }

    pub fn item_type(self) -> ItemType {
        match self {
            Category::Text => ItemType::Text,
            Category::Image => ItemType::Image,
            Category::Link => ItemType::Link,
        }
    }
}

/// `data:` urls, `#` and blank sources are placeholders, not images
pub fn is_placeholder_src(src: &str) -> bool {
    let src = src.trim();
    src.is_empty() || src == "#" || src == "about:blank" || src.starts_with("data:")
}

/// False for links the user still has to point somewhere
pub fn has_destination(href: Option<&str>) -> bool {
    match href.map(str::trim) {
        None | Some("") | Some("#") => false,
        Some(_) => true,
    }
}

pub fn visible_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

pub fn slugify(value: &str) -> String {
    let mut out = String::new();
    let mut pending_sep = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            pending_sep = false;
        } else {
            pending_sep = true;
        }
    }
    out.truncate(32);
    out.trim_end_matches('_').to_string()
}

/// Category of an element, if it is editable at all
pub fn classify(tree: &Tree, id: NodeId, min_text_chars: usize) -> Option<Category> {
    let el = tree.element(id)?;
    match el.tag.as_str() {
        "a" => Some(Category::Link),
        "img" => match el.attr("src") {
            Some(src) if !is_placeholder_src(src) => Some(Category::Image),
            _ => None,
        },
        tag if TEXT_TAGS.contains(&tag) => {
            (visible_chars(&tree.text_content(id)) >= min_text_chars).then_some(Category::Text)
        }
        _ => None,
    }
}

/// Category recorded on an already managed node
pub fn managed_category(tree: &Tree, id: NodeId) -> Option<Category> {
    tree.attr(id, markers::MANAGED).and_then(Category::parse)
}

/// Top-level sections in document order.
///
/// Structural tags not nested in another structural tag; failing that,
/// the element children of `body` (or of the root). A `main` or `article`
/// holding structural tags is a wrapper: its children are the sections.
pub fn find_sections(tree: &Tree) -> Vec<NodeId> {
    let candidates: Vec<NodeId> = tree
        .descendants(tree.root())
        .into_iter()
        .filter(|id| !markers::in_ui(tree, *id))
        .filter(|id| has_tag(tree, *id, SECTION_TAGS))
        .collect();

    let is_wrapper = |id: NodeId| {
        has_tag(tree, id, WRAPPER_TAGS)
            && candidates
                .iter()
                .any(|other| *other != id && tree.is_descendant_of(*other, id))
    };
    let sections: Vec<NodeId> = candidates.iter().copied().filter(|id| !is_wrapper(*id)).collect();

    let top_level: Vec<NodeId> = sections
        .iter()
        .copied()
        .filter(|id| !tree.ancestors(*id).any(|a| sections.contains(&a)))
        .collect();

    if !top_level.is_empty() {
        return top_level;
    }

    let container = tree
        .descendants(tree.root())
        .into_iter()
        .find(|id| tree.tag(*id) == Some("body"))
        .unwrap_or_else(|| {
            // <html> without <body>, or bare markup
            tree.element_children(tree.root())
                .into_iter()
                .find(|id| tree.tag(*id) == Some("html"))
                .unwrap_or(tree.root())
        });

    tree.element_children(container)
        .into_iter()
        .filter(|id| {
            tree.tag(*id)
                .map(|t| !NON_CONTENT_TAGS.contains(&t))
                .unwrap_or(false)
        })
        .filter(|id| !markers::is_ui(tree, *id))
        .collect()
}

fn has_tag(tree: &Tree, id: NodeId, tags: &[&str]) -> bool {
    tree.tag(id).map(|t| tags.contains(&t)).unwrap_or(false)
}

/// Per-session key counters.
///
/// Counters only move forward; a fresh allocator is created on a full load
/// and nowhere else.
#[derive(Debug, Clone, Default)]
pub struct KeyAllocator {
    text: u32,
    image: u32,
    link: u32,
    section: u32,
}

impl KeyAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, base: &str, tag: &str) -> String {
        self.text += 1;
        format!("{}_{}_{}", base, tag, self.text)
    }

    pub fn image(&mut self, base: &str) -> String {
        self.image += 1;
        keys::instance_key(base, self.image)
    }

    pub fn link(&mut self) -> String {
        self.link += 1;
        format!("link_{}", self.link)
    }

    pub fn section(&mut self) -> String {
        self.section += 1;
        format!("section_{}", self.section)
    }
}

/// Live keys → nodes.
///
/// Entries are checked against the tree on lookup, so a node that was
/// removed (or rebuilt by a reset) never resolves through a stale entry.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    nodes: HashMap<String, NodeId>,
}

impl KeyIndex {
    pub fn get(&self, tree: &Tree, key: &str) -> Option<NodeId> {
        let id = *self.nodes.get(key)?;
        let el = tree.element(id)?;
        (el.attr(markers::KEY) == Some(key) || el.attr(markers::SECTION) == Some(key)).then_some(id)
    }

    pub fn contains(&self, tree: &Tree, key: &str) -> bool {
        self.get(tree, key).is_some()
    }

    fn insert(&mut self, key: String, id: NodeId) {
        self.nodes.insert(key, id);
    }

    /// Re-point every key found under `root` at its current node
    pub fn refresh(&mut self, tree: &Tree, root: NodeId) {
        for id in tree.descendants(root) {
            if let Some(el) = tree.element(id) {
                for name in [markers::KEY, markers::SECTION] {
                    if let Some(key) = el.attr(name) {
                        self.nodes.insert(key.to_string(), id);
                    }
                }
            }
        }
    }

    /// Drop the keys held by a subtree that is about to go away
    pub fn forget(&mut self, tree: &Tree, root: NodeId) -> Vec<String> {
        let mut removed = Vec::new();
        for id in tree.descendants(root) {
            if let Some(el) = tree.element(id) {
                for name in [markers::KEY, markers::SECTION] {
                    if let Some(key) = el.attr(name) {
                        if self.nodes.get(key) == Some(&id) {
                            self.nodes.remove(key);
                            removed.push(key.to_string());
                        }
                    }
                }
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Assigns section ids and instance keys, and owns the key index
#[derive(Debug, Clone)]
pub struct IdentityAssigner {
    min_text_chars: usize,
    keys: KeyAllocator,
    index: KeyIndex,
}

impl IdentityAssigner {
    pub fn new(min_text_chars: usize) -> Self {
        Self {
            min_text_chars,
            keys: KeyAllocator::new(),
            index: KeyIndex::default(),
        }
    }

    pub fn index(&self) -> &KeyIndex {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut KeyIndex {
        &mut self.index
    }

    pub fn lookup(&self, tree: &Tree, key: &str) -> Option<NodeId> {
        self.index.get(tree, key)
    }

    /// Give every top-level section an id. Runs once per load.
    pub fn assign_sections(&mut self, tree: &mut Tree) -> Vec<(String, NodeId)> {
        let mut assigned = Vec::new();
        for id in find_sections(tree) {
            let section_id = match tree.attr(id, markers::SECTION) {
                Some(existing) => existing.to_string(),
                None => self.keys.section(),
            };
            if let Some(el) = tree.element_mut(id) {
                el.set_attr(markers::SECTION, section_id.clone());
            }
            self.index.insert(section_id.clone(), id);
            assigned.push((section_id, id));
        }
        assigned
    }

    /// Key every unkeyed editable node under `scope`; returns the new keys
    pub fn assign(&mut self, tree: &mut Tree, scope: NodeId) -> Vec<String> {
        let mut assigned = Vec::new();

        for id in tree.descendants(scope) {
            if !tree.is_element(id) || markers::in_ui(tree, id) {
                continue;
            }
            if let Some(key) = tree.attr(id, markers::KEY).map(str::to_string) {
                match self.index.get(tree, &key) {
                    Some(owner) if owner != id => {
                        tracing::warn!(%key, "key already held by another node, re-keying");
                        if let Some(el) = tree.element_mut(id) {
                            el.remove_attr(markers::KEY);
                            el.remove_attr(markers::MANAGED);
                        }
                    }
                    _ => {
                        self.index.insert(key, id);
                        continue;
                    }
                }
            }
            let Some(category) = classify(tree, id, self.min_text_chars) else {
                continue;
            };
            if category == Category::Text && self.inside_managed_text(tree, id) {
                continue;
            }

            let key = self.allocate(tree, id, category);
            if let Some(el) = tree.element_mut(id) {
                el.set_attr(markers::KEY, key.clone());
                el.set_attr(markers::MANAGED, category.as_str());
            }
            self.index.insert(key.clone(), id);
            assigned.push(key);
        }

        if !assigned.is_empty() {
            tracing::debug!(count = assigned.len(), "assigned instance keys");
        }
        assigned
    }

    fn inside_managed_text(&self, tree: &Tree, id: NodeId) -> bool {
        tree.ancestors(id)
            .any(|a| managed_category(tree, a) == Some(Category::Text))
    }

    fn allocate(&mut self, tree: &Tree, id: NodeId, category: Category) -> String {
        let author_key = tree
            .attr(id, markers::AUTHOR_KEY)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        match category {
            Category::Text => match author_key {
                Some(key) if !self.index.contains(tree, &key) => key,
                _ => {
                    let tag = tree.tag(id).unwrap_or("text").to_string();
                    self.keys.text(&section_base(tree, id), &tag)
                }
            },
            Category::Image => {
                let base = author_key
                    .or_else(|| {
                        tree.attr(id, "alt")
                            .map(slugify)
                            .filter(|slug| !slug.is_empty())
                    })
                    .unwrap_or_else(|| "image".to_string());
                self.keys.image(&base)
            }
            Category::Link => self.keys.link(),
        }
    }
}

/// First class of the containing section, else its tag, else `page`
fn section_base(tree: &Tree, id: NodeId) -> String {
    let section = tree.closest(id, |t, n| t.attr(n, markers::SECTION).is_some());
    let Some(section) = section.and_then(|s| tree.element(s)) else {
        return "page".to_string();
    };
    section
        .classes()
        .next()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| section.tag.clone())
}
