//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Mission, Task, Quiz, Submission, PointLog, ...)
//! - Domain value objects (status codes, Validator, quiz projections)
//! - Domain services (quiz scoring)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
