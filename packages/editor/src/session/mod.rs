//! # Render Session
//!
//! One loaded template and everything the editor tracks about it.
//!
//! The session is a synchronous state machine. User input arrives through
//! [`RenderSession::perform`], host commands through
//! [`RenderSession::handle_command`], and time through
//! [`RenderSession::tick`]; outgoing messages collect in an outbox read
//! with [`RenderSession::drain_events`]. The async driver in
//! [`crate::driver`] is the only place that waits on anything.
//!
//! ## Lifecycle
//!
//! ```text
//! Loading ──load()──▶ Ready ──(edits, commands, ticks)──▶ Ready
//!    │
//!    └──fail_load()──▶ Failed (terminal, nothing rendered)
//! ```

mod generation;
mod media;
mod structure;
mod text;

use crate::aggregator::{clean_document, clean_inner, ChangeAggregator};
use crate::config::EditorConfig;
use crate::errors::{EditorError, EditorResult};
use crate::identity::{managed_category, Category, IdentityAssigner};
use crate::layout::{FixedLayout, LayoutProvider};
use crate::markers;
use crate::outline::build_outline;
use crate::snapshot::SnapshotStore;
use crate::surface::decorate;
use crate::surface::{DragState, ImageTransform, LinkDraft, PendingImageTarget, Toolbar};
use sitecanvas_dom::{parse_document, NodeId, Tree};
use sitecanvas_protocol::{EditorEvent, GenerationScope, HostCommand, LayerActionKind, ItemType, RequestCorrelator};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

/// Explicit per-node interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Idle,
    /// Text element with the toolbar attached
    Focused,
    /// Image in pan/zoom mode
    Adjusting,
    Dragging,
    /// Delete requested; leaves the tree once the transition ends
    Exiting { until: Instant },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub key: String,
    pub start: usize,
    pub end: usize,
}

pub struct RenderSession {
    pub(crate) config: EditorConfig,
    pub(crate) template_id: String,
    pub(crate) tree: Tree,
    pub(crate) load: LoadState,
    pub(crate) identity: IdentityAssigner,
    pub(crate) snapshots: SnapshotStore,
    pub(crate) aggregator: ChangeAggregator,
    pub(crate) states: HashMap<String, NodeState>,
    /// Keys and section ids with a generation request in flight
    pub(crate) busy: HashSet<String>,
    pub(crate) correlator: RequestCorrelator<GenerationScope>,
    pub(crate) pending_image: Option<PendingImageTarget>,
    pub(crate) transforms: HashMap<String, ImageTransform>,
    pub(crate) link_draft: Option<LinkDraft>,
    pub(crate) drag: Option<DragState>,
    pub(crate) toolbar: Toolbar,
    pub(crate) selection: Option<Selection>,
    pub(crate) layout: Box<dyn LayoutProvider>,
    pub(crate) scrolled_to: Option<String>,
    outbox: Vec<EditorEvent>,
}

impl RenderSession {
    pub fn new(template_id: impl Into<String>, config: EditorConfig) -> Self {
        let template_id = template_id.into();
        Self {
            identity: IdentityAssigner::new(config.min_text_chars),
            aggregator: ChangeAggregator::new(config.debounce()),
            correlator: RequestCorrelator::new(&template_id),
            config,
            template_id,
            tree: Tree::new(),
            load: LoadState::Loading,
            snapshots: SnapshotStore::new(),
            states: HashMap::new(),
            busy: HashSet::new(),
            pending_image: None,
            transforms: HashMap::new(),
            link_draft: None,
            drag: None,
            toolbar: Toolbar::default(),
            selection: None,
            layout: Box::new(FixedLayout::new()),
            scrolled_to: None,
            outbox: Vec::new(),
        }
    }

    pub fn with_layout(mut self, layout: impl LayoutProvider + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    pub fn set_layout(&mut self, layout: Box<dyn LayoutProvider>) {
        self.layout = layout;
    }

    /// Parse, key, snapshot and decorate a template.
    ///
    /// Snapshots are taken before decoration so controls never leak into
    /// a reset.
    pub fn load(&mut self, html: &str) -> EditorResult<()> {
        let tree = parse_document(html);
        let has_content = tree
            .descendants(tree.root())
            .into_iter()
            .any(|id| tree.is_element(id));
        if !has_content {
            let reason = "template has no content".to_string();
            self.fail_load(reason.clone());
            return Err(EditorError::LoadFailed(reason));
        }

        self.tree = tree;
        self.identity = IdentityAssigner::new(self.config.min_text_chars);
        self.snapshots = SnapshotStore::new();
        self.states.clear();
        self.busy.clear();
        self.transforms.clear();
        self.correlator.clear();
        self.pending_image = None;
        self.link_draft = None;
        self.drag = None;
        self.selection = None;
        self.toolbar.hide();

        let sections = self.identity.assign_sections(&mut self.tree);
        for (section_id, node) in &sections {
            self.snapshots.capture(section_id, &self.tree, *node);
        }
        let root = self.tree.root();
        let keys = self.identity.assign(&mut self.tree, root);
        decorate::decorate(&mut self.tree, root)?;

        self.load = LoadState::Ready;
        tracing::info!(
            template = %self.template_id,
            sections = sections.len(),
            keys = keys.len(),
            "template loaded"
        );

        self.emit(EditorEvent::Ready {
            template_id: self.template_id.clone(),
            images: self.keys_of(Category::Image),
        });
        self.emit(EditorEvent::Layers {
            sections: build_outline(&self.tree),
        });
        Ok(())
    }

    /// Terminal: the page shows a failure state and nothing else
    pub fn fail_load(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(template = %self.template_id, %reason, "template failed to load");
        self.tree = Tree::new();
        self.load = LoadState::Failed(reason.clone());
        self.aggregator.cancel();
        self.emit(EditorEvent::LoadFailed { reason });
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn is_ready(&self) -> bool {
        self.load == LoadState::Ready
    }

    pub(crate) fn ensure_ready(&self) -> EditorResult<()> {
        match self.load {
            LoadState::Ready => Ok(()),
            _ => Err(EditorError::NotLoaded),
        }
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    // ---- lookups ----

    pub(crate) fn node(&self, key: &str) -> EditorResult<NodeId> {
        self.identity
            .lookup(&self.tree, key)
            .filter(|id| self.tree.attr(*id, markers::KEY) == Some(key))
            .ok_or_else(|| EditorError::UnknownKey(key.to_string()))
    }

    pub(crate) fn managed(&self, key: &str, category: Category) -> EditorResult<NodeId> {
        let id = self.node(key)?;
        if managed_category(&self.tree, id) != Some(category) {
            return Err(EditorError::WrongKind {
                key: key.to_string(),
                expected: category.as_str(),
            });
        }
        Ok(id)
    }

    pub(crate) fn section_node(&self, section_id: &str) -> EditorResult<NodeId> {
        self.identity
            .lookup(&self.tree, section_id)
            .filter(|id| self.tree.attr(*id, markers::SECTION) == Some(section_id))
            .ok_or_else(|| EditorError::UnknownSection(section_id.to_string()))
    }

    pub fn is_live(&self, key: &str) -> bool {
        self.node(key).is_ok()
    }

    /// Live keys of one category in document order
    pub fn keys_of(&self, category: Category) -> Vec<String> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .filter(|id| managed_category(&self.tree, *id) == Some(category))
            .filter_map(|id| self.tree.attr(id, markers::KEY).map(str::to_string))
            .collect()
    }

    pub fn section_ids(&self) -> Vec<String> {
        crate::identity::find_sections(&self.tree)
            .into_iter()
            .filter_map(|id| self.tree.attr(id, markers::SECTION).map(str::to_string))
            .collect()
    }

    /// Visible text of a keyed node
    pub fn text_of(&self, key: &str) -> Option<String> {
        self.node(key).ok().map(|id| self.tree.text_content(id))
    }

    pub fn attr_of(&self, key: &str, name: &str) -> Option<String> {
        let id = self.node(key).ok()?;
        self.tree.attr(id, name).map(str::to_string)
    }

    pub fn node_state(&self, key: &str) -> NodeState {
        self.states.get(key).copied().unwrap_or(NodeState::Idle)
    }

    pub fn is_busy(&self, key: &str) -> bool {
        self.busy.contains(key)
    }

    pub fn pending_image(&self) -> Option<&PendingImageTarget> {
        self.pending_image.as_ref()
    }

    pub fn transform(&self, key: &str) -> ImageTransform {
        self.transforms.get(key).copied().unwrap_or_default()
    }

    pub fn link_draft(&self) -> Option<&LinkDraft> {
        self.link_draft.as_ref()
    }

    pub fn toolbar(&self) -> &Toolbar {
        &self.toolbar
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn scrolled_to(&self) -> Option<&str> {
        self.scrolled_to.as_deref()
    }

    pub fn pending_requests(&self) -> usize {
        self.correlator.len()
    }

    pub fn has_snapshot(&self, section_id: &str) -> bool {
        self.snapshots.contains(section_id)
    }

    // ---- output ----

    /// The document as the host should store it
    pub fn clean_html(&self) -> String {
        clean_document(&self.tree)
    }

    /// Clean markup of a single section, by id
    pub fn section_html(&self, section_id: &str) -> EditorResult<String> {
        let id = self.section_node(section_id)?;
        Ok(sitecanvas_dom::serialize_node_with(
            &self.tree,
            id,
            &crate::aggregator::CleanFilter,
        ))
    }

    pub(crate) fn clean_inner(&self, id: NodeId) -> String {
        clean_inner(&self.tree, id)
    }

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        tracing::trace!(kind = event.kind(), "queue event");
        self.outbox.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn revision(&self) -> u64 {
        self.aggregator.revision()
    }

    pub(crate) fn mark_changed(&mut self, now: Instant) {
        self.aggregator.schedule(now);
    }

    pub(crate) fn set_state(&mut self, key: &str, state: NodeState) {
        if state == NodeState::Idle {
            self.states.remove(key);
        } else {
            self.states.insert(key.to_string(), state);
        }
    }

    /// Forget everything tracked about keys whose nodes are gone
    pub(crate) fn forget_keys(&mut self, keys: &[String]) {
        for key in keys {
            self.states.remove(key);
            self.transforms.remove(key);
            self.busy.remove(key);
            if self.pending_image.as_ref().map(|p| &p.key) == Some(key) {
                self.pending_image = None;
            }
            if self.link_draft.as_ref().map(|d| &d.key) == Some(key) {
                self.link_draft = None;
            }
            if self.selection.as_ref().map(|s| &s.key) == Some(key) {
                self.selection = None;
            }
            if self.toolbar.key() == Some(key.as_str()) {
                self.toolbar.hide();
            }
            if self.drag.as_ref().map(|d| &d.key) == Some(key) {
                self.drag = None;
            }
        }
    }

    // ---- time ----

    /// Earliest instant at which [`RenderSession::tick`] has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        let exits = self.states.values().filter_map(|state| match state {
            NodeState::Exiting { until } => Some(*until),
            _ => None,
        });
        self.aggregator
            .deadline()
            .into_iter()
            .chain(self.toolbar.deadline())
            .chain(exits)
            .min()
    }

    /// Whether a frame is waiting to be applied (buffered drag sample)
    pub fn wants_frame(&self) -> bool {
        self.drag.as_ref().map(|d| d.has_pending()).unwrap_or(false)
    }

    /// Advance timers: finish exit transitions, expire the toolbar grace
    /// window, apply a buffered drag sample, and emit the debounced
    /// snapshot.
    pub fn tick(&mut self, now: Instant) {
        let mut due: Vec<String> = self
            .states
            .iter()
            .filter_map(|(key, state)| match state {
                NodeState::Exiting { until } if *until <= now => Some(key.clone()),
                _ => None,
            })
            .collect();
        due.sort();
        for key in due {
            if let Err(err) = self.finish_delete(&key, now) {
                tracing::debug!(%key, %err, "delete transition target vanished");
                self.states.remove(&key);
            }
        }

        if let Some(key) = self.toolbar.tick(now) {
            if self.node_state(&key) == NodeState::Focused {
                self.set_state(&key, NodeState::Idle);
            }
            self.selection = None;
        }

        if let Some(drag) = self.drag.as_mut() {
            if let Err(err) = drag.frame(&mut self.tree, self.layout.as_ref()) {
                tracing::debug!(%err, "drag frame failed");
            }
        }

        if let Some(revision) = self.aggregator.take_due(now) {
            if self.is_ready() {
                let html = clean_document(&self.tree);
                self.emit(EditorEvent::FullSnapshot { html, revision });
                self.emit(EditorEvent::Layers {
                    sections: build_outline(&self.tree),
                });
            }
        }
    }

    // ---- host commands ----

    /// Apply a host command. Commands naming keys that no longer exist are
    /// dropped; every command is safe to receive twice.
    pub fn handle_command(&mut self, command: HostCommand, now: Instant) {
        if !self.is_ready() {
            tracing::debug!(?command, "ignoring command before load");
            return;
        }

        let result = match command {
            HostCommand::ReplaceImage { key, src } => self.replace_image(&key, &src, now),
            HostCommand::ApplyGeneratedContent {
                request_id,
                target,
                items,
                error,
            } => self
                .apply_generated(&request_id, &target, &items, error, now)
                .map(|_| ()),
            HostCommand::LayerAction {
                key,
                item_type,
                action,
            } => self.layer_action(&key, item_type, action, now),
            HostCommand::ResetSection { section_id } => self.reset_section(&section_id, now),
            HostCommand::DeleteSection { section_id } => self.delete_section(&section_id, now),
        };

        if let Err(err) = result {
            tracing::debug!(%err, "host command had no effect");
        }
    }

    /// Host-driven navigation: scroll to a node and optionally open its editor
    pub fn layer_action(
        &mut self,
        key: &str,
        item_type: ItemType,
        action: LayerActionKind,
        now: Instant,
    ) -> EditorResult<()> {
        self.node(key)?;
        self.scrolled_to = Some(key.to_string());
        tracing::debug!(%key, ?action, "layer action");

        if action == LayerActionKind::Focus {
            return Ok(());
        }
        match item_type {
            ItemType::Text => self.focus(key, now),
            ItemType::Image => self.activate_image(key).map(|_| ()),
            ItemType::Link => self.open_link_editor(key),
        }
    }
}
