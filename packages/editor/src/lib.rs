//! # Sitecanvas Editor
//!
//! Preview-side editing engine for rendered site templates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ dom: template HTML → node tree              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: RenderSession                       │
//! │  - Identity: stable keys per occurrence     │
//! │  - Snapshots: pristine sections for reset   │
//! │  - Mutation surface: text, media, links     │
//! │  - Change aggregation: debounced snapshots  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ protocol: events out, commands in           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Keys are forever**: a key names one occurrence for the whole session
//! 2. **The host owns persistence**: the editor only reports what changed
//! 3. **Clean output**: controls and bookkeeping never reach the host
//! 4. **Stale is harmless**: commands and responses for vanished nodes are dropped
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sitecanvas_editor::{EditorConfig, RenderSession, UserAction};
//! use std::time::Instant;
//!
//! let mut session = RenderSession::new("landing", EditorConfig::default());
//! session.load(&html)?;
//!
//! session.perform(
//!     UserAction::EditText { key: "hero_h1_1".into(), html: "Hello".into() },
//!     Instant::now(),
//! )?;
//!
//! for event in session.drain_events() {
//!     // forward to the host
//! }
//! ```

mod actions;
mod aggregator;
mod config;
mod driver;
mod errors;
mod outline;
mod session;
mod snapshot;

pub mod identity;
pub mod layout;
pub mod markers;
pub mod surface;

pub use actions::UserAction;
pub use aggregator::{clean_document, clean_inner, ChangeAggregator, CleanFilter};
pub use config::EditorConfig;
pub use driver::run_session;
pub use errors::{EditorError, EditorResult};
pub use identity::{Category, IdentityAssigner, KeyIndex};
pub use layout::{FixedLayout, LayoutProvider, Rect};
pub use outline::build_outline;
pub use session::{LoadState, NodeState, RenderSession, Selection};
pub use snapshot::SnapshotStore;
