//! CertCanvas Core Library
//!
//! Platform-agnostic scene model, scaling, serialization and data binding
//! for certificate designs.

pub mod binding;
pub mod bridge;
pub mod composite;
pub mod notify;
pub mod scaling;
pub mod scene;
pub mod session;
pub mod shapes;
pub mod snap;
pub mod storage;
pub mod surface;

pub use binding::{Record, SignaturePlacement, fill_anchors, place_signature};
pub use bridge::{BridgeError, CUSTOM_PROPERTIES, LoadedScene, deserialize, serialize};
pub use composite::{AnchorComposite, ObjectFactory, Primitive};
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use scaling::{FitScale, ResponsiveView};
pub use scene::{CANONICAL_HEIGHT, CANONICAL_WIDTH, Scene};
pub use session::{EditorSession, PreviewSession, SessionError, SignatureSession};
pub use shapes::SceneObject;
pub use snap::{SNAP_THRESHOLD, SnapResult};
pub use storage::{DesignStore, MemoryStore, StoreError};
pub use surface::{DesignSurface, EditOutcome, PolicyViolation};
