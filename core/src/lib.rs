//! Core library for the sniping pipeline, shared between the CLI and any
//! future embedding binary.

pub mod backoff;
pub mod decode;
pub mod error;
pub mod executor;
pub mod ingest;
pub mod metrics;
pub mod mint_validator;
pub mod models;
pub mod orchestrator;
pub mod rate_limiter;
pub mod rpc;
pub mod settings;
pub mod signal;

pub use error::CoreError;
pub use models::{BuyOrder, DecodedEvent, Fingerprint, LogMessage, TagResult, TransactionInfo};
pub use orchestrator::{Orchestrator, OrchestratorState};
pub use settings::Settings;
