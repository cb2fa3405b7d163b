//! Deterministic rule classifier.
//!
//! Three ordered tiers of case-insensitive patterns (emergency, consultation,
//! self-care) plus a keyword table that tags recognised symptoms. Needs no
//! external service, so it is both the emergency floor and the last
//! evidence-based fallback.

pub mod classifier;
pub mod patterns;

pub use classifier::{RuleClassifier, RuleVerdict};
