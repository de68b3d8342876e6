//! User input as data.
//!
//! Pointer and keyboard gestures reduced to the operations they trigger.
//! Scripts replayed by the CLI and the async driver both feed the session
//! through [`RenderSession::perform`].

use crate::errors::EditorResult;
use crate::layout::FixedLayout;
use crate::session::RenderSession;
use crate::surface::FormatFlag;
use serde::{Deserialize, Serialize};
use sitecanvas_protocol::GenerationScope;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum UserAction {
    Focus { key: String },
    Blur,
    ToolbarPointerDown,
    Select { key: String, start: usize, end: usize },
    EditText { key: String, html: String },
    ToggleFormat { format: FormatFlag },
    Grow,
    Shrink,
    SetColor { color: String },

    Delete { key: String },
    DeleteSection { section_id: String },
    ResetSection { section_id: String },

    DragStart { key: String, y: f64 },
    DragMove { y: f64 },
    DragEnd,
    DragCancel,

    ActivateImage { key: String },
    ToggleAdjust { key: String },
    Pan { key: String, x: f64, y: f64 },
    ZoomIn { key: String },
    ZoomOut { key: String },
    ResetTransform { key: String },

    OpenLinkEditor { key: String },
    UpdateLinkDraft { href: String },
    SaveLink,
    CancelLink,

    GenerateText { key: String },
    GenerateSection { section_id: String },

    /// New measurements, e.g. after a resize or scroll
    Layout { layout: FixedLayout },
    /// Let time pass; only meaningful to script replay
    Wait { ms: u64 },
}

impl UserAction {
    /// How long the action asks the clock to advance
    pub fn wait(&self) -> Option<Duration> {
        match self {
            UserAction::Wait { ms } => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }
}

impl RenderSession {
    /// Apply one user action at `now`
    pub fn perform(&mut self, action: UserAction, now: Instant) -> EditorResult<()> {
        tracing::trace!(?action, "perform");
        match action {
            UserAction::Focus { key } => self.focus(&key, now),
            UserAction::Blur => {
                self.blur(now);
                Ok(())
            }
            UserAction::ToolbarPointerDown => {
                self.toolbar_pointer_down();
                Ok(())
            }
            UserAction::Select { key, start, end } => self.select(&key, start, end, now),
            UserAction::EditText { key, html } => self.edit_text(&key, &html, now),
            UserAction::ToggleFormat { format } => self.toggle_format(format, now).map(|_| ()),
            UserAction::Grow => self.grow(now).map(|_| ()),
            UserAction::Shrink => self.shrink(now).map(|_| ()),
            UserAction::SetColor { color } => self.set_color(&color, now),

            UserAction::Delete { key } => self.delete(&key, now),
            UserAction::DeleteSection { section_id } => self.delete_section(&section_id, now),
            UserAction::ResetSection { section_id } => self.reset_section(&section_id, now),

            UserAction::DragStart { key, y } => self.begin_drag(&key, y),
            UserAction::DragMove { y } => self.drag_move(y),
            UserAction::DragEnd => self.end_drag(now),
            UserAction::DragCancel => self.cancel_drag(),

            UserAction::ActivateImage { key } => self.activate_image(&key).map(|_| ()),
            UserAction::ToggleAdjust { key } => self.toggle_adjust(&key).map(|_| ()),
            UserAction::Pan { key, x, y } => self.pan(&key, x, y, now).map(|_| ()),
            UserAction::ZoomIn { key } => self.zoom_in(&key, now).map(|_| ()),
            UserAction::ZoomOut { key } => self.zoom_out(&key, now).map(|_| ()),
            UserAction::ResetTransform { key } => self.reset_transform(&key, now).map(|_| ()),

            UserAction::OpenLinkEditor { key } => self.open_link_editor(&key),
            UserAction::UpdateLinkDraft { href } => self.update_link_draft(&href),
            UserAction::SaveLink => self.save_link(now),
            UserAction::CancelLink => {
                self.cancel_link();
                Ok(())
            }

            UserAction::GenerateText { key } => self
                .request_generation(GenerationScope::Element { key })
                .map(|_| ()),
            UserAction::GenerateSection { section_id } => self
                .request_generation(GenerationScope::Section { section_id })
                .map(|_| ()),

            UserAction::Layout { layout } => {
                self.set_layout(Box::new(layout));
                self.refresh_toolbar();
                Ok(())
            }
            UserAction::Wait { .. } => Ok(()),
        }
    }
}
