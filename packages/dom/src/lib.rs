//! # Sitecanvas DOM
//!
//! The content tree a preview session renders and edits.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ template: {{key}} substitution               │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ lexer + parser: HTML text → Tree             │
//! │  - tolerant (stray/unclosed tags, raw text)  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ tree: arena of nodes with parent links       │
//! │  - NodeId stable for the node's lifetime     │
//! │  - VNode: owned deep copy (snapshots)        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ serializer: Tree → HTML through a NodeFilter │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use sitecanvas_dom::{parse_document, serialize};
//!
//! let tree = parse_document("<section><h1>Hello</h1></section>");
//! assert_eq!(serialize(&tree), "<section><h1>Hello</h1></section>");
//! ```

mod error;
pub mod lexer;
pub mod parser;
pub mod serializer;
pub mod style;
pub mod template;
pub mod tree;
pub mod vdom;

pub use error::{DomError, DomResult};
pub use parser::{parse_document, parse_fragment};
pub use serializer::{
    serialize, serialize_children_with, serialize_node_with, serialize_vnodes, serialize_with,
    FilterAction, KeepAll, NodeFilter,
};
pub use template::render_template;
pub use tree::{ElementData, NodeData, NodeId, Tree};
pub use vdom::VNode;
