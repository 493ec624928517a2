//! A rule set indexed by conclusion template and closed under pairwise
//! anti-unification, with a generality DAG tracking which stored rule
//! subsumes which.

pub mod index;

pub use index::{IndexedRuleSet, RuleId};
