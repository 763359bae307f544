//! Gamification Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL and in-memory repository implementations
//! - `presentation/` - HTTP handlers
//!
//! ## Workflow Invariants
//! - One submission row per (user, task); a completed row is never
//!   overwritten by a participant
//! - Every increment of a user's totals has exactly one point log, written
//!   in the same transaction
//! - Quiz answer keys never leave the backend
//! - Leaving a mission removes its submissions but never reverts points

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::GamificationConfig;
pub use error::{GamificationError, GamificationResult};
pub use infra::memory::InMemoryGamificationRepository;
pub use infra::postgres::PgGamificationRepository;
pub use presentation::router::{gamification_router, gamification_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
