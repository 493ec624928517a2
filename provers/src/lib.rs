//! The two inference engines: a weighted goal-directed backward prover and
//! a weighted data-driven (Rete) forward prover, plus the naive forward
//! prover used as its reference, and the proof graph and weight/budget
//! types they share.

pub mod backward;
pub mod naive;
pub mod proof;
pub mod rete;
pub mod weight;

pub use backward::{prove, Params, ProofEntry, ProofPath};
pub use proof::{Proof, RuleAppId, SentenceId};
pub use rete::ReteNetwork;
pub use weight::{Budget, Weight};
