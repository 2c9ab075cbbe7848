//! Filesystem loader for rule and threat documents.
//!
//! Scans a directory recursively for YAML files and loads every document via
//! two-pass deserialization (RuleEnvelope -> RuleDocument).

mod core;
mod error;

#[cfg(test)]
mod tests;

pub use self::core::RuleLoader;
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};
