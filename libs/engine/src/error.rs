//! Engine error types.
//!
//! Every error is terminal for the operation that raised it: a failed
//! operation leaves pool reserves, shares, and the token ledger exactly as
//! they were. Variants carry the triggering values so callers can decide
//! whether to retry with looser bounds.

use crate::ledger::LedgerError;
use crate::types::{PoolId, TokenId};
use ethers_core::types::U256;
use simpleswap_math::MathError;

#[derive(Debug, thiserror::Error)]
pub enum AmmError {
    #[error("deadline {deadline} has passed (now {now})")]
    Expired { deadline: u64, now: u64 },

    #[error("identical tokens in pair: {0:?}")]
    IdenticalTokens(TokenId),

    #[error("swap path must contain exactly 2 tokens, got {0}")]
    InvalidPath(usize),

    #[error("no pool registered for id {0}")]
    PoolNotFound(PoolId),

    #[error("pool {0} holds no reserves")]
    EmptyPool(PoolId),

    #[error("computed amount {computed} below caller minimum {minimum}")]
    SlippageExceeded { computed: U256, minimum: U256 },

    #[error("insufficient liquidity shares: have {have}, need {need}")]
    InsufficientShares { have: U256, need: U256 },

    #[error(transparent)]
    ArithmeticOverflow(#[from] MathError),

    #[error("token transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),
}
