//! Token and pool identifiers with canonical pair ordering.
//!
//! Every derived computation (pool id, reserve orientation) happens strictly
//! after canonicalization, so `(A, B)` and `(B, A)` always resolve to the
//! same pool.

use crate::error::AmmError;
use ethers_core::types::Address;
use ethers_core::utils::keccak256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token contract identifier. 20-byte address with the byte-wise
/// total order used for canonical pair ordering.
pub type TokenId = Address;

/// Ledger account identifier (liquidity providers, swap callers, the
/// engine's own vault).
pub type AccountId = Address;

/// Deterministic pool identifier: keccak256 over the canonically ordered
/// token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId([u8; 32]);

impl PoolId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Orders a token pair canonically (`token0 < token1`).
///
/// Fails with [`AmmError::IdenticalTokens`] when both sides name the same
/// token; no pool can exist for such a pair.
pub fn sort_tokens(token_x: TokenId, token_y: TokenId) -> Result<(TokenId, TokenId), AmmError> {
    if token_x == token_y {
        return Err(AmmError::IdenticalTokens(token_x));
    }
    if token_x < token_y {
        Ok((token_x, token_y))
    } else {
        Ok((token_y, token_x))
    }
}

/// Derives the [`PoolId`] for a pair, canonicalizing first.
///
/// `pool_id(A, B) == pool_id(B, A)` for every distinct pair.
pub fn pool_id(token_x: TokenId, token_y: TokenId) -> Result<PoolId, AmmError> {
    let (token0, token1) = sort_tokens(token_x, token_y)?;
    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(token0.as_bytes());
    packed[20..].copy_from_slice(token1.as_bytes());
    Ok(PoolId(keccak256(packed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> TokenId {
        Address::from([byte; 20])
    }

    #[test]
    fn sort_orders_by_address() {
        let (t0, t1) = sort_tokens(addr(9), addr(2)).unwrap();
        assert_eq!(t0, addr(2));
        assert_eq!(t1, addr(9));

        let (t0, t1) = sort_tokens(addr(2), addr(9)).unwrap();
        assert_eq!(t0, addr(2));
        assert_eq!(t1, addr(9));
    }

    #[test]
    fn sort_rejects_identical_tokens() {
        assert!(matches!(
            sort_tokens(addr(7), addr(7)),
            Err(AmmError::IdenticalTokens(_))
        ));
    }

    #[test]
    fn pool_id_is_order_independent() {
        let ab = pool_id(addr(1), addr(2)).unwrap();
        let ba = pool_id(addr(2), addr(1)).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn pool_id_distinguishes_pairs() {
        let ab = pool_id(addr(1), addr(2)).unwrap();
        let ac = pool_id(addr(1), addr(3)).unwrap();
        assert_ne!(ab, ac);
    }

    #[test]
    fn pool_id_displays_as_hex() {
        let id = pool_id(addr(1), addr(2)).unwrap();
        let text = id.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 2 + 64);
    }
}
