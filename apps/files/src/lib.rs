//! Client-side synchronization for a course's file and video collections.
//!
//! [`AssetOrchestrator`] is the single entry point for table intents; it calls
//! the remote [`AssetApi`] and folds every result into the shared
//! [`AssetStore`].

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod state;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{AssetApi, ClientError, ClientResult, StudioClient};
pub use config::{AppConfig, AppProfile, CollectionKind};
pub use error::FailureKind;
pub use models::{ActiveStatus, AssetRecord, UploadFile, UsageLocation};
pub use orchestrator::{AssetOrchestrator, ConflictDecision};
pub use state::{AssetState, AssetStore, OperationKind, OperationSnapshot, RequestStatus};
