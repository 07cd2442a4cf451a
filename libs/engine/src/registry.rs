//! Pool registry: the arena of pool records keyed by [`PoolId`].
//!
//! Each pool sits behind its own `RwLock`; an operation holds the write lock
//! for its whole critical section, so operations on one pool serialize while
//! different pools proceed concurrently.

use crate::error::AmmError;
use crate::pool::Pool;
use crate::types::{self, PoolId, TokenId};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
pub struct PoolRegistry {
    pools: DashMap<PoolId, Arc<RwLock<Pool>>>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure id derivation; same result regardless of argument order.
    pub fn pool_id(token_x: TokenId, token_y: TokenId) -> Result<PoolId, AmmError> {
        types::pool_id(token_x, token_y)
    }

    /// Returns the pool for the pair, allocating a zeroed record on first
    /// use. Pool records persist even when drained to zero.
    pub fn get_or_create(
        &self,
        token_x: TokenId,
        token_y: TokenId,
    ) -> Result<(PoolId, Arc<RwLock<Pool>>), AmmError> {
        let (token0, token1) = types::sort_tokens(token_x, token_y)?;
        let id = types::pool_id(token0, token1)?;
        let pool = self
            .pools
            .entry(id)
            .or_insert_with(|| {
                info!(pool_id = %id, ?token0, ?token1, "registered new pool");
                Arc::new(RwLock::new(Pool::new(token0, token1)))
            })
            .clone();
        Ok((id, pool))
    }

    pub fn get(&self, id: PoolId) -> Option<Arc<RwLock<Pool>>> {
        self.pools.get(&id).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::types::Address;

    fn addr(byte: u8) -> TokenId {
        Address::from([byte; 20])
    }

    #[test]
    fn creates_once_per_pair() {
        let registry = PoolRegistry::new();
        let (id_ab, pool_ab) = registry.get_or_create(addr(1), addr(2)).unwrap();
        let (id_ba, pool_ba) = registry.get_or_create(addr(2), addr(1)).unwrap();

        assert_eq!(id_ab, id_ba);
        assert!(Arc::ptr_eq(&pool_ab, &pool_ba));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn stores_tokens_in_canonical_order() {
        let registry = PoolRegistry::new();
        let (_, pool) = registry.get_or_create(addr(9), addr(3)).unwrap();
        let pool = pool.read();
        assert_eq!(pool.token0, addr(3));
        assert_eq!(pool.token1, addr(9));
    }

    #[test]
    fn get_returns_none_for_unknown_id() {
        let registry = PoolRegistry::new();
        let id = PoolRegistry::pool_id(addr(1), addr(2)).unwrap();
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn rejects_identical_tokens() {
        let registry = PoolRegistry::new();
        assert!(matches!(
            registry.get_or_create(addr(5), addr(5)),
            Err(AmmError::IdenticalTokens(_))
        ));
    }
}
