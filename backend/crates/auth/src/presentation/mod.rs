//! Presentation Layer
//!
//! Role-gating middleware and the identity extractor.

pub mod middleware;
