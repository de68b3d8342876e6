//! Formatting toolbar visibility.
//!
//! ```text
//! Hidden ──focus──▶ Visible ──blur──▶ Grace ──deadline──▶ Hidden
//!                      ▲                │
//!                      └─toolbar click──┘
//! ```

use crate::layout::Rect;
use crate::surface::format::FormatState;
use std::time::{Duration, Instant};

pub const TOOLBAR_HEIGHT: f64 = 44.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Above,
    Below,
}

/// Above the element when it fits in the viewport, else below
pub fn placement(element: Rect, viewport: Rect) -> Placement {
    if element.y - TOOLBAR_HEIGHT >= viewport.y {
        Placement::Above
    } else {
        Placement::Below
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarState {
    Hidden,
    Visible {
        key: String,
    },
    /// Blurred, but a click landing on the toolbar can still keep it
    Grace {
        key: String,
        until: Instant,
    },
}

#[derive(Debug, Clone)]
pub struct Toolbar {
    pub state: ToolbarState,
    pub placement: Placement,
    pub active: FormatState,
}

impl Default for Toolbar {
    fn default() -> Self {
        Self {
            state: ToolbarState::Hidden,
            placement: Placement::Above,
            active: FormatState::default(),
        }
    }
}

impl Toolbar {
    pub fn show(&mut self, key: &str) {
        self.state = ToolbarState::Visible {
            key: key.to_string(),
        };
    }

    pub fn blur(&mut self, now: Instant, grace: Duration) {
        if let ToolbarState::Visible { key } = &self.state {
            self.state = ToolbarState::Grace {
                key: key.clone(),
                until: now + grace,
            };
        }
    }

    /// Pointer landed on the toolbar: the blur did not happen
    pub fn hold(&mut self) -> bool {
        if let ToolbarState::Grace { key, .. } = &self.state {
            self.state = ToolbarState::Visible { key: key.clone() };
            return true;
        }
        matches!(self.state, ToolbarState::Visible { .. })
    }

    /// Hide once the grace window has passed. Returns the key it was anchored to.
    pub fn tick(&mut self, now: Instant) -> Option<String> {
        match &self.state {
            ToolbarState::Grace { key, until } if *until <= now => {
                let key = key.clone();
                self.hide();
                Some(key)
            }
            _ => None,
        }
    }

    pub fn hide(&mut self) {
        self.state = ToolbarState::Hidden;
        self.active = FormatState::default();
    }

    pub fn key(&self) -> Option<&str> {
        match &self.state {
            ToolbarState::Hidden => None,
            ToolbarState::Visible { key } | ToolbarState::Grace { key, .. } => Some(key),
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self.state, ToolbarState::Hidden)
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            ToolbarState::Grace { until, .. } => Some(until),
            _ => None,
        }
    }
}
