//! # Proof Gate Module
//!
//! Validation of the two-phase settlement pipeline:
//!
//! 1. Initialization proof over the deposit tree
//! 2. Transition chain plus group signature over the final root
//! 3. Conservation proof over the final balances

pub mod gate;
pub mod public_inputs;
pub mod registry;

pub use gate::{ChainClaim, ProofGate, VerifierSet};
pub use public_inputs::{
    closing_message, selector_word, tree_signals, TransitionInputs, TRANSITION_PREFIX_LEN,
};
pub use registry::FunctionRegistry;
