//! Matching, unification and anti-unification over [`metarule_core`]
//! sentences and rules.

pub mod anti_unify;
pub mod matching;
pub mod unify;

pub use anti_unify::{anti_unify, anti_unify_rule, Generalization};
pub use matching::{find_rule_substitutions, find_substitutions, is_more_general, matches, same_template};
pub use unify::{unify, unify_sequence};
