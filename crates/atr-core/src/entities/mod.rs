//! Entity structs for Atrium domain objects.
//!
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip
//! and schema validation.

mod record;

pub use record::ErrorRecord;
