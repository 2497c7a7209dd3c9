//! Page-level controllers: editor, preview and signature.
//!
//! Each session owns its scene. Failures are reported through the session's
//! notifier and the previous scene stays on screen.

mod editor;
mod preview;
mod signature;

pub use editor::{EditorSession, LoadOutcome};
pub use preview::PreviewSession;
pub use signature::SignatureSession;

use crate::bridge::BridgeError;
use crate::storage::StoreError;
use thiserror::Error;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}
