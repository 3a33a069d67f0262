//! # atr-core
//!
//! Core types for the Atrium console error subsystem.
//!
//! This crate provides the foundational types shared across all Atrium crates:
//! - The `ErrorRecord` entity and its JSON serialization
//! - Taxonomy enums (`ErrorType`, `Severity`) and machine codes
//! - The fixed user-facing message table
//! - Prefixed ID generation
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod messages;

pub use entities::ErrorRecord;
pub use enums::{ErrorCode, ErrorType, Severity};
pub use errors::CoreError;
