//! # Integration Flows
//!
//! Complete channel lifecycles across the ledger, proof gate, security and
//! dispute components.

pub mod emergency;
pub mod settlement;
