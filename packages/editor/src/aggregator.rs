//! # Change Aggregator
//!
//! Every mutation restarts one debounce deadline. When the deadline passes,
//! the session writes a single clean snapshot of the whole tree, so the
//! serialization cost is paid once per quiet period.
//!
//! Emissions are level-triggered: each snapshot is complete, so a lost or
//! superseded one is repaired by the next.

use crate::markers;
use sitecanvas_dom::{serialize_children_with, serialize_with, FilterAction, NodeFilter, NodeId, Tree};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ChangeAggregator {
    debounce: Duration,
    deadline: Option<Instant>,
    revision: u64,
}

impl ChangeAggregator {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
            revision: 0,
        }
    }

    /// Restart the debounce window
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_scheduled(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed; returns the new revision
    pub fn take_due(&mut self, now: Instant) -> Option<u64> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.revision += 1;
                Some(self.revision)
            }
            _ => None,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Strips everything the editor added to the tree
pub struct CleanFilter;

impl NodeFilter for CleanFilter {
    fn node(&self, tree: &Tree, id: NodeId) -> FilterAction {
        if markers::is_ui(tree, id) {
            FilterAction::Skip
        } else if markers::is_frame(tree, id) {
            FilterAction::Unwrap
        } else {
            FilterAction::Keep
        }
    }

    fn attribute(&self, name: &str) -> bool {
        !markers::is_bookkeeping_attr(name)
    }
}

pub fn clean_document(tree: &Tree) -> String {
    serialize_with(tree, &CleanFilter)
}

/// Clean inner markup of one element
pub fn clean_inner(tree: &Tree, id: NodeId) -> String {
    serialize_children_with(tree, id, &CleanFilter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecanvas_dom::parse_document;

    #[test]
    fn test_restart_not_stacked() {
        let start = Instant::now();
        let mut agg = ChangeAggregator::new(Duration::from_millis(400));

        agg.schedule(start);
        agg.schedule(start + Duration::from_millis(300));

        assert_eq!(agg.take_due(start + Duration::from_millis(400)), None);
        assert_eq!(agg.take_due(start + Duration::from_millis(700)), Some(1));
        assert_eq!(agg.take_due(start + Duration::from_millis(800)), None);
    }

    #[test]
    fn test_clean_document() {
        let tree = parse_document(concat!(
            r#"<section data-sc-section="section_1">"#,
            r#"<div data-sc-ui="section-controls"><span data-sc-ui="reset"></span></div>"#,
            r#"<h1 data-sc-key="k" data-sc-managed="text" contenteditable="true">Hi<span data-sc-ui="delete"></span></h1>"#,
            r#"<div data-sc-frame style="overflow: hidden"><img src="a.png" data-sc-key="i__inst_1" style="transform: scale(2)"><span data-sc-ui="adjust"></span></div>"#,
            r#"</section>"#
        ));
        assert_eq!(
            clean_document(&tree),
            r#"<section><h1>Hi</h1><img src="a.png" style="transform: scale(2)"></section>"#
        );
    }
}
