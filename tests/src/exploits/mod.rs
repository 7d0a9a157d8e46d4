//! # Attack Simulations
//!
//! Each test plays an adversary against a live bridge and asserts the
//! attack is rejected with no state change.
//!
//! | Module | Attack surface |
//! |--------|----------------|
//! | `double_spend` | Withdrawing the same funds through two paths |
//! | `proof_forgery` | Replayed, spliced or unauthorized settlement |

pub mod double_spend;
pub mod proof_forgery;
