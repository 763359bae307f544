//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod catalog;
pub mod config;
pub mod enrollment;
pub mod profile;
pub mod ranking;
pub mod submit_quiz;
pub mod submit_task;
pub mod validate_submission;
