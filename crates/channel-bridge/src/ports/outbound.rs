//! # Outbound Ports
//!
//! Traits for the bridge's external dependencies: the token ledger, the clock,
//! block context, signature recovery and event sinks. Verifier oracles live in
//! `bridge-zkp` and are re-exported here.

use crate::domain::{BlockContext, ChannelError};
use crate::events::ChannelEvent;
use shared_crypto::{GroupPublicKey, ThresholdSignature};
use shared_types::{Address, Amount, Hash, Timestamp, TokenId};

pub use bridge_zkp::{Groth16Verifier, TransitionVerifier};

/// Fungible token ledger holding the bridge vault.
pub trait TokenGateway: Send + Sync {
    /// Balance of `owner`.
    fn balance_of(&self, token: &TokenId, owner: &Address) -> Result<Amount, ChannelError>;

    /// Amount `spender` may move out of `owner`.
    fn allowance(
        &self,
        token: &TokenId,
        owner: &Address,
        spender: &Address,
    ) -> Result<Amount, ChannelError>;

    /// Move `amount` from `from` to `to` using `spender`'s allowance.
    fn transfer_from(
        &self,
        token: &TokenId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), ChannelError>;

    /// Move `amount` out of `from`'s own balance.
    fn transfer(
        &self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), ChannelError>;
}

/// Abstract time source for testability.
pub trait TimeSource: Send + Sync {
    /// Current time in seconds.
    fn now(&self) -> Timestamp;
}

/// Source of the block context bound into transition proofs.
pub trait BlockContextProvider: Send + Sync {
    /// Context of the block executing the current operation.
    fn current(&self) -> BlockContext;
}

/// Threshold signature recovery primitive.
pub trait SignerRecovery: Send + Sync {
    /// Signer identity if `signature` is valid for `message` under `group_key`.
    fn recover(
        &self,
        message: &Hash,
        group_key: &GroupPublicKey,
        signature: &ThresholdSignature,
    ) -> Option<Address>;
}

/// Sink for committed channel events.
pub trait EventPublisher: Send + Sync {
    /// Publish one event.
    fn publish(&self, event: ChannelEvent);
}
