//! Error types for the editor

use sitecanvas_dom::DomError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Tree error: {0}")]
    Dom(#[from] DomError),

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("{key} is not a {expected} node")]
    WrongKind { key: String, expected: &'static str },

    #[error("Image {0} is not in adjust mode")]
    NotAdjusting(String),

    #[error("No layout available for {0}")]
    NotMeasured(String),

    #[error("Selection {start}..{end} out of bounds for text of length {len}")]
    InvalidSelection { start: usize, end: usize, len: usize },

    #[error("No text element is selected")]
    NoSelection,

    #[error("No drag in progress")]
    NotDragging,

    #[error("No link editor is open")]
    NoLinkDraft,

    #[error("Session is not loaded")]
    NotLoaded,

    #[error("Template failed to load: {0}")]
    LoadFailed(String),
}
