//! HTTP collaborator for CertCanvas: the certificate backend client, a
//! `DesignStore` over it, and an image loader for scene assets.

pub mod assets;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
mod store;

pub use assets::HttpAssetLoader;
pub use client::{ApiClient, SIGNATURE_FIELD};
pub use config::ClientConfig;
pub use error::ApiError;
pub use models::{
    ApiResponse, Participant, ParticipantDraft, RenderResponse, RenderResult, Signer,
    SignerStatus,
};
