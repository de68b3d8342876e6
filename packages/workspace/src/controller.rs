//! # Host Controller
//!
//! The host's half of the channel. Folds editor events into the canonical
//! [`ContentState`], hands it to the content store once a full snapshot and
//! the layer outline that follows it have both arrived, and answers the
//! editor's requests:
//!
//! ```text
//!   ready ─────────────▶ replace-image for every instance with a stored source
//!   open-asset-picker ─▶ remembered until the user picks (or cancels)
//!   generate-request ──▶ GenerationService ──▶ apply-generated-content
//!   full-snapshot ─────▶ marked unsaved
//!   layers ────────────▶ ContentStore::save (when unsaved)
//! ```
//!
//! Generation calls run concurrently and may finish in any order; the
//! editor matches replies by request id.

use crate::config::HostConfig;
use crate::error::{GenerationError, StoreError};
use crate::generation::{GenerationRequest, GenerationService};
use crate::state::ContentState;
use crate::store::ContentStore;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use sitecanvas_protocol::{EditorEvent, HostCommand, HostEndpoint, ItemType, LayerActionKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Things the host user does outside the preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "kebab-case")]
pub enum HostInput {
    ChooseAsset {
        url: String,
    },
    CancelAsset,
    ResetSection {
        section_id: String,
    },
    DeleteSection {
        section_id: String,
    },
    Layer {
        key: String,
        item_type: ItemType,
        action: LayerActionKind,
    },
}

/// What the host owes the editor after one event
#[derive(Debug, Default, PartialEq)]
pub struct Reaction {
    pub commands: Vec<HostCommand>,
    pub job: Option<GenerationRequest>,
}

pub struct HostController<S: ContentStore> {
    config: HostConfig,
    state: ContentState,
    store: S,
    /// Image instance waiting for the asset picker
    pending_picker: Option<String>,
    /// A snapshot arrived that the store has not seen yet
    unsaved: bool,
}

impl<S: ContentStore> HostController<S> {
    /// Resume from the store when it has state for this template
    pub fn new(
        template_id: impl Into<String>,
        config: HostConfig,
        store: S,
    ) -> Result<Self, StoreError> {
        let template_id = template_id.into();
        let state = match store.load(&template_id)? {
            Some(state) => {
                tracing::info!(template = %template_id, revision = state.revision, "resumed content state");
                state
            }
            None => ContentState::new(template_id),
        };

        Ok(Self {
            config,
            state,
            store,
            pending_picker: None,
            unsaved: false,
        })
    }

    pub fn state(&self) -> &ContentState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn pending_picker(&self) -> Option<&str> {
        self.pending_picker.as_deref()
    }

    pub fn has_unsaved(&self) -> bool {
        self.unsaved
    }

    /// Save a snapshot whose layer outline never came
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.unsaved {
            self.store.save(&self.state)?;
            self.unsaved = false;
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: &EditorEvent) -> Result<Reaction, StoreError> {
        let snapshot = self.state.apply_event(event);
        let mut reaction = Reaction::default();

        match event {
            EditorEvent::Ready { images, .. } => {
                reaction.commands = images
                    .iter()
                    .filter_map(|key| {
                        self.state.replacement_for(key).map(|src| HostCommand::ReplaceImage {
                            key: key.clone(),
                            src: src.to_string(),
                        })
                    })
                    .collect();
            }
            EditorEvent::LoadFailed { reason } => {
                tracing::warn!(template = %self.state.template_id, %reason, "preview failed to load");
            }
            EditorEvent::OpenAssetPicker { key, .. } => {
                self.pending_picker = Some(key.clone());
            }
            EditorEvent::Delete { key, .. } if self.pending_picker.as_deref() == Some(key) => {
                self.pending_picker = None;
            }
            EditorEvent::GenerateRequest {
                request_id,
                scope,
                inventory,
            } => {
                reaction.job = Some(GenerationRequest {
                    request_id: request_id.clone(),
                    scope: scope.clone(),
                    inventory: inventory.clone(),
                    business_context: self.config.business_context.clone(),
                });
            }
            _ => {}
        }

        if self.config.persist_on_snapshot {
            if snapshot {
                self.unsaved = true;
            } else if matches!(event, EditorEvent::Layers { .. }) {
                self.flush()?;
            }
        }
        Ok(reaction)
    }

    pub fn handle_input(&mut self, input: HostInput) -> Option<HostCommand> {
        match input {
            HostInput::ChooseAsset { url } => self.choose_asset(url),
            HostInput::CancelAsset => {
                self.pending_picker = None;
                None
            }
            HostInput::ResetSection { section_id } => Some(HostCommand::ResetSection { section_id }),
            HostInput::DeleteSection { section_id } => {
                Some(HostCommand::DeleteSection { section_id })
            }
            HostInput::Layer {
                key,
                item_type,
                action,
            } => Some(HostCommand::LayerAction {
                key,
                item_type,
                action,
            }),
        }
    }

    /// Answer the open picker; nothing happens when none is open
    pub fn choose_asset(&mut self, url: impl Into<String>) -> Option<HostCommand> {
        let Some(key) = self.pending_picker.take() else {
            tracing::debug!("asset chosen with no picker open");
            return None;
        };
        Some(HostCommand::ReplaceImage {
            key,
            src: url.into(),
        })
    }

    /// Serve one editor until it hangs up
    pub async fn run(
        mut self,
        endpoint: HostEndpoint,
        generator: Arc<dyn GenerationService>,
        mut inputs: mpsc::UnboundedReceiver<HostInput>,
    ) -> Self {
        let (sender, mut events) = endpoint.split();
        let mut jobs: FuturesUnordered<BoxFuture<'static, HostCommand>> = FuturesUnordered::new();
        let mut inputs_open = true;

        loop {
            let mut outgoing = Vec::new();

            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    match self.handle_event(&event) {
                        Ok(reaction) => {
                            outgoing = reaction.commands;
                            if let Some(request) = reaction.job {
                                jobs.push(generation_job(
                                    generator.clone(),
                                    request,
                                    self.config.generation_timeout(),
                                ));
                            }
                        }
                        Err(err) => {
                            tracing::warn!(event = event.kind(), error = %err, "failed to handle editor event");
                        }
                    }
                }
                input = inputs.recv(), if inputs_open => match input {
                    Some(input) => outgoing.extend(self.handle_input(input)),
                    None => inputs_open = false,
                },
                Some(command) = jobs.next(), if !jobs.is_empty() => outgoing.push(command),
            }

            for command in &outgoing {
                if let Err(err) = sender.send(command) {
                    tracing::debug!(error = %err, "editor gone before command was sent");
                }
            }
        }

        if let Err(err) = self.flush() {
            tracing::warn!(error = %err, "failed to save final snapshot");
        }
        self
    }
}

fn generation_job(
    generator: Arc<dyn GenerationService>,
    request: GenerationRequest,
    timeout: Option<Duration>,
) -> BoxFuture<'static, HostCommand> {
    async move {
        let request_id = request.request_id.clone();
        let target = request.scope.clone();

        let call = generator.generate(request);
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(GenerationError::TimedOut(limit.as_millis() as u64))),
            None => call.await,
        };

        match result {
            Ok(items) => {
                tracing::debug!(request_id = %request_id, items = items.len(), "generation finished");
                HostCommand::ApplyGeneratedContent {
                    request_id,
                    target,
                    items,
                    error: false,
                }
            }
            Err(err) => {
                tracing::warn!(request_id = %request_id, error = %err, "generation failed");
                HostCommand::ApplyGeneratedContent {
                    request_id,
                    target,
                    items: Vec::new(),
                    error: true,
                }
            }
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use sitecanvas_protocol::{DeleteKind, GenerationScope, LayerItem, RequestId, SectionOutline};

    fn controller() -> HostController<MemoryStore> {
        HostController::new("bakery", HostConfig::default(), MemoryStore::new()).unwrap()
    }

    #[test]
    fn test_picker_answered_once() {
        let mut host = controller();
        host.handle_event(&EditorEvent::OpenAssetPicker {
            key: "loaf__inst_1".to_string(),
            width: 600.0,
            height: 200.0,
        })
        .unwrap();

        assert_eq!(
            host.choose_asset("/rye.jpg"),
            Some(HostCommand::ReplaceImage {
                key: "loaf__inst_1".to_string(),
                src: "/rye.jpg".to_string(),
            })
        );
        assert_eq!(host.choose_asset("/rye.jpg"), None);
    }

    #[test]
    fn test_deleted_image_closes_picker() {
        let mut host = controller();
        host.handle_event(&EditorEvent::OpenAssetPicker {
            key: "loaf__inst_1".to_string(),
            width: 0.0,
            height: 0.0,
        })
        .unwrap();
        host.handle_event(&EditorEvent::Delete {
            key: "loaf__inst_1".to_string(),
            kind: DeleteKind::Image,
        })
        .unwrap();
        assert_eq!(host.pending_picker(), None);
    }

    #[test]
    fn test_ready_replays_stored_replacements() {
        let mut state = ContentState::new("bakery");
        state
            .image_replacements
            .insert("shop".to_string(), "/new.jpg".to_string());
        let store = MemoryStore::new().with_state(state);
        let mut host = HostController::new("bakery", HostConfig::default(), store).unwrap();
        let reaction = host
            .handle_event(&EditorEvent::Ready {
                template_id: "bakery".to_string(),
                images: vec!["shop__inst_1".to_string(), "loaf__inst_2".to_string()],
            })
            .unwrap();

        assert_eq!(
            reaction.commands,
            vec![HostCommand::ReplaceImage {
                key: "shop__inst_1".to_string(),
                src: "/new.jpg".to_string(),
            }]
        );
    }

    fn snapshot(revision: u64) -> EditorEvent {
        EditorEvent::FullSnapshot {
            html: "<p>x</p>".to_string(),
            revision,
        }
    }

    fn layers(label: &str) -> EditorEvent {
        EditorEvent::Layers {
            sections: vec![SectionOutline {
                section_id: "section_1".to_string(),
                label: "hero".to_string(),
                items: vec![LayerItem {
                    item_type: ItemType::Text,
                    label: label.to_string(),
                    key: "hero_h1_1".to_string(),
                }],
            }],
        }
    }

    #[test]
    fn test_snapshot_persisted_unless_disabled() {
        let mut host = controller();
        host.handle_event(&snapshot(1)).unwrap();
        assert!(host.has_unsaved());
        host.handle_event(&layers("Warm rye")).unwrap();
        assert_eq!(host.store().saves(), 1);
        assert!(!host.has_unsaved());

        let config = HostConfig {
            persist_on_snapshot: false,
            ..HostConfig::default()
        };
        let mut host = HostController::new("bakery", config, MemoryStore::new()).unwrap();
        host.handle_event(&snapshot(1)).unwrap();
        host.handle_event(&layers("Warm rye")).unwrap();
        assert_eq!(host.store().saves(), 0);
    }

    #[test]
    fn test_saved_state_carries_the_snapshot_outline() {
        let mut host = controller();
        host.handle_event(&layers("Fresh bread daily")).unwrap();
        assert_eq!(host.store().saves(), 0);

        host.handle_event(&snapshot(1)).unwrap();
        host.handle_event(&layers("Warm rye")).unwrap();

        let saved = host.store().get("bakery").unwrap();
        assert_eq!(saved.revision, 1);
        assert_eq!(saved.outline[0].items[0].label, "Warm rye");
        assert_eq!(Some(saved), Some(host.state()));
    }

    #[test]
    fn test_flush_saves_snapshot_without_layers() {
        let mut host = controller();
        host.handle_event(&snapshot(3)).unwrap();
        host.flush().unwrap();
        host.flush().unwrap();
        assert_eq!(host.store().saves(), 1);
        assert_eq!(host.store().get("bakery").map(|s| s.revision), Some(3));
    }

    struct Broken;

    impl ContentStore for Broken {
        fn load(&self, _template_id: &str) -> Result<Option<ContentState>, StoreError> {
            Ok(None)
        }

        fn save(&mut self, state: &ContentState) -> Result<(), StoreError> {
            Err(StoreError::Rejected {
                template_id: state.template_id.clone(),
                reason: "read-only".to_string(),
            })
        }
    }

    #[test]
    fn test_store_failure_keeps_state() {
        let mut host = HostController::new("bakery", HostConfig::default(), Broken).unwrap();
        host.handle_event(&snapshot(2)).unwrap();
        let result = host.handle_event(&layers("Warm rye"));
        assert!(matches!(result, Err(StoreError::Rejected { .. })));
        assert_eq!(host.state().revision, 2);
        assert!(host.has_unsaved());
    }

    #[test]
    fn test_generate_request_becomes_job() {
        let mut host = controller();
        let reaction = host
            .handle_event(&EditorEvent::GenerateRequest {
                request_id: RequestId::from("r-1"),
                scope: GenerationScope::Element {
                    key: "hero_p_2".to_string(),
                },
                inventory: vec![],
            })
            .unwrap();
        assert_eq!(reaction.job.map(|job| job.request_id), Some(RequestId::from("r-1")));
        assert!(reaction.commands.is_empty());
    }
}
