//! YAML document schema types with serde deserialization.
//!
//! Defines the type hierarchy for rule documents:
//! - `RuleEnvelope`: lightweight first-pass header (apiVersion, kind, metadata)
//! - `RuleDocument`: enum dispatching to kind-specific types
//! - `ThreatRule`: predicate tree over one element category, linked to a threat
//! - `ThreatDocument`: threat catalog entry

mod document;
mod envelope;
mod kind;
mod metadata;
mod rule;
mod threat;

pub use document::*;
pub use envelope::*;
pub use kind::*;
pub use metadata::*;
pub use rule::*;
pub use threat::*;

#[cfg(test)]
mod tests;
