//! Vocabulary checkpoint persistence: a small versioned binary container
//! holding the three ordered string tables (words, variables, specials)
//! that make up a [`metarule_core::Context`]'s vocabularies, so a training
//! run can resume against a stable set of token ids.

pub mod checkpoint;
pub mod decode;
pub mod encode;

pub use checkpoint::{load, save, Checkpoint};
pub use decode::{Decode, Error};
pub use encode::Encode;
