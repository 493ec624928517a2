//! The symbolic term algebra: tokens, sentences, substitutions and rules,
//! plus the sentence/rule text syntax used at the system's boundary.
//!
//! This crate has no notion of matching, unification, proving or rule
//! sets — those live in `metarule-match`, `metarule-rules` and
//! `metarule-provers`, all built on top of the types exported here.

pub mod error;
pub mod parse;
pub mod rule;
pub mod sentence;
pub mod substitution;
pub mod template;
pub mod token;
pub mod vocab;

pub use error::{Error, Result};
pub use rule::Rule;
pub use sentence::{AlphaConversion, Sentence, SentenceView};
pub use substitution::{Substitution, VariableBinding};
pub use template::{decompose, compose, Template};
pub use token::{Token, TokenKind};
pub use vocab::{Context, FreshVariables, Vocabulary, VocabKind};
