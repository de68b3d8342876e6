//! # Sitecanvas Protocol
//!
//! The only path between a preview session and its host.
//!
//! Every message is a self-contained JSON object tagged by `"type"`. The
//! channel carries strings, never shared references, and a receiver drops
//! anything it cannot decode rather than failing:
//!
//! ```text
//!   editor ──EditorEvent (edit, delete, full-snapshot, generate-request…)──▶ host
//!   editor ◀──HostCommand (replace-image, apply-generated-content…)──────── host
//! ```
//!
//! Requests that expect a reply carry a [`RequestId`] and are tracked by a
//! [`RequestCorrelator`] on the originating side.

mod channel;
mod codec;
mod correlator;
mod error;
pub mod keys;
mod messages;

pub use channel::{pair, EditorEndpoint, Endpoint, HostEndpoint, Receiver, Sender};
pub use codec::{decode, encode};
pub use correlator::{PendingRequest, RequestCorrelator, RequestIdGenerator};
pub use error::ProtocolError;
pub use messages::*;
