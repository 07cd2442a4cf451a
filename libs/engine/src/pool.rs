//! Pool record: reserves, total liquidity, and per-provider share balances.
//!
//! A pool is created by the first deposit for its pair and never destroyed;
//! draining it to zero leaves an empty-but-existing record whose id mapping
//! stays stable, ready for reseeding.

use crate::types::{AccountId, TokenId};
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mutable state of a single token pair.
///
/// `token0 < token1` always holds; the pair is fixed at creation. Invariant:
/// `reserve0`, `reserve1` and `total_liquidity` are zero together or
/// positive together.
#[derive(Debug, Clone)]
pub struct Pool {
    pub token0: TokenId,
    pub token1: TokenId,
    pub reserve0: U256,
    pub reserve1: U256,
    pub total_liquidity: U256,
    shares: HashMap<AccountId, U256>,
}

/// Read model of a pool, the shape the `pools(poolId)` accessor returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub token0: TokenId,
    pub token1: TokenId,
    pub reserve0: U256,
    pub reserve1: U256,
    pub total_liquidity: U256,
}

impl Pool {
    /// New zeroed pool for a canonically ordered pair.
    pub fn new(token0: TokenId, token1: TokenId) -> Self {
        debug_assert!(token0 < token1);
        Self {
            token0,
            token1,
            reserve0: U256::zero(),
            reserve1: U256::zero(),
            total_liquidity: U256::zero(),
            shares: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_liquidity.is_zero()
    }

    /// Reserves oriented as `(reserve_in, reserve_out)` for a swap entering
    /// with `token_in`. `None` when the token is not part of this pair.
    pub fn oriented_reserves(&self, token_in: TokenId) -> Option<(U256, U256)> {
        if token_in == self.token0 {
            Some((self.reserve0, self.reserve1))
        } else if token_in == self.token1 {
            Some((self.reserve1, self.reserve0))
        } else {
            None
        }
    }

    /// Share balance of one provider.
    pub fn shares_of(&self, provider: AccountId) -> U256 {
        self.shares.get(&provider).copied().unwrap_or_default()
    }

    /// Credits freshly minted shares to `provider`.
    pub fn credit_shares(&mut self, provider: AccountId, minted: U256) {
        let entry = self.shares.entry(provider).or_default();
        *entry += minted;
    }

    /// Burns `amount` shares from `provider`. Caller must have verified the
    /// balance; this only asserts it in debug builds.
    pub fn debit_shares(&mut self, provider: AccountId, amount: U256) {
        let entry = self.shares.entry(provider).or_default();
        debug_assert!(*entry >= amount);
        *entry -= amount;
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            token0: self.token0,
            token1: self.token1,
            reserve0: self.reserve0,
            reserve1: self.reserve1,
            total_liquidity: self.total_liquidity,
        }
    }
}
