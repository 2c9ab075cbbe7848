//! Rule engine for threat modeling over an element diagram.
//!
//! This crate provides:
//! - YAML rule and threat documents with serde deserialization
//! - A sandboxed comparison-expression language with scoped temporary variables
//! - The rule analyzer that turns predicate trees into findings
//! - Sequential and rayon-backed scanning, validation and reporting

pub mod analyzer;
pub mod expression;
pub mod loader;
pub mod report;
pub mod scanner;
pub mod schema;
pub mod scope;
pub mod validation;

pub use analyzer::RuleAnalyzer;
pub use expression::ExpressionEvaluator;
pub use scanner::Scanner;
