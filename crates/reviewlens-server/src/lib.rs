//! ReviewLens Server
//!
//! HTTP surface of ReviewLens: review analysis with write-through to the
//! review store, review listing and feedback, aggregate stats, and the
//! flat settings file.

pub mod app;
pub mod config;
pub mod orchestrator;
pub mod routes;
pub mod settings;

pub use app::AppState;
pub use config::{ConfigOverrides, ServerConfig};
pub use orchestrator::{AnalysisFailure, AnalysisOrchestrator, AnalysisOutcome, FailureKind, ModelSlot};
pub use routes::create_router;
pub use settings::SettingsStore;
