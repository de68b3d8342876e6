//! # Sitecanvas Workspace
//!
//! Everything on the host side of the preview channel: the canonical
//! content state and its reconciliation, plus the boundaries to the
//! content store, the template catalog and the copy generator.

mod catalog;
mod config;
mod controller;
mod error;
mod generation;
mod state;
mod store;

pub use catalog::{DirectoryCatalog, MemoryCatalog, TemplateCatalog};
pub use config::HostConfig;
pub use controller::{HostController, HostInput, Reaction};
pub use error::{CatalogError, GenerationError, StoreError};
pub use generation::{CannedGenerator, GenerationRequest, GenerationService, NoopGenerator};
pub use state::{ContentState, LinkValue};
pub use store::{ContentStore, MemoryStore};
