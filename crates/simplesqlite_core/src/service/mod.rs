//! Caller-facing services.
//!
//! # Responsibility
//! - Own connection lifecycle so callers only pass a path per call.
//! - Keep storage details behind the repository layer.

pub mod operations;
