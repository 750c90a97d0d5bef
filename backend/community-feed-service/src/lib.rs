/// Community Feed Service Library
///
/// Owns the engagement core of the community platform: the like toggle, the
/// denormalized like counter and feed assembly.
///
/// # Modules
///
/// - `domain`: posts, likes, author profiles and post views
/// - `repository`: storage traits with PostgreSQL and in-process implementations
/// - `services`: like toggle state machine, feed assembly, post creation, reconciliation
/// - `handlers`: actix-web HTTP endpoints
/// - `workers`: background counter reconciliation
/// - `metrics`: prometheus collectors
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod repository;
pub mod services;
pub mod state;
pub mod workers;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
