//! # Layout Boundary
//!
//! The editor never measures anything itself. Geometry comes from the
//! embedder through [`LayoutProvider`]; drag placement, toolbar placement,
//! image panning and the asset picker's size hint all read from it.

use crate::markers;
use serde::{Deserialize, Serialize};
use sitecanvas_dom::{NodeId, Tree};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

pub trait LayoutProvider: Send {
    /// Bounding box of a node in page coordinates
    fn rect(&self, tree: &Tree, node: NodeId) -> Option<Rect>;

    /// Visible part of the page
    fn viewport(&self) -> Rect;
}

/// Layout from a fixed table of rectangles keyed by instance key or
/// section id.
///
/// Image frames resolve through the media element they hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedLayout {
    #[serde(default)]
    pub rects: HashMap<String, Rect>,
    #[serde(default = "default_viewport")]
    pub viewport: Rect,
}

fn default_viewport() -> Rect {
    Rect::new(0.0, 0.0, 1280.0, 800.0)
}

impl Default for FixedLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedLayout {
    pub fn new() -> Self {
        Self {
            rects: HashMap::new(),
            viewport: default_viewport(),
        }
    }

    pub fn with_rect(mut self, key: impl Into<String>, rect: Rect) -> Self {
        self.rects.insert(key.into(), rect);
        self
    }

    pub fn with_viewport(mut self, viewport: Rect) -> Self {
        self.viewport = viewport;
        self
    }

    fn key_of(tree: &Tree, node: NodeId) -> Option<String> {
        let el = tree.element(node)?;
        if let Some(key) = el.attr(markers::KEY).or_else(|| el.attr(markers::SECTION)) {
            return Some(key.to_string());
        }
        if el.has_attr(markers::FRAME) {
            return tree
                .children(node)
                .iter()
                .find_map(|child| tree.attr(*child, markers::KEY))
                .map(str::to_string);
        }
        None
    }
}

impl LayoutProvider for FixedLayout {
    fn rect(&self, tree: &Tree, node: NodeId) -> Option<Rect> {
        let key = Self::key_of(tree, node)?;
        self.rects.get(&key).copied()
    }

    fn viewport(&self) -> Rect {
        self.viewport
    }
}
