//! # Swap Engine - Pooled-Liquidity AMM Operations
//!
//! ## Purpose
//!
//! The caller-facing engine: add/remove liquidity, exact-input constant
//! product swaps, and read-only price queries over the pool registry.
//!
//! ## Architecture Role
//!
//! Frontends and tests call the operations here; the engine canonicalizes
//! token pairs, resolves the pool through [`PoolRegistry`], prices with
//! `simpleswap-math`, and settles funds through the [`TokenLedger`]
//! collaborator. Each operation runs inside the pool's exclusive critical
//! section: all precondition checks and arithmetic come first, then ledger
//! transfers, then the reserve/share commit. A failure at any point leaves
//! pool state untouched; a failed second transfer is compensated by
//! reversing the first.

use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, BPS_DENOMINATOR};
use crate::error::AmmError;
use crate::ledger::TokenLedger;
use crate::pool::PoolSnapshot;
use crate::registry::PoolRegistry;
use crate::types::{self, AccountId, PoolId, TokenId};
use ethers_core::types::U256;
use simpleswap_math as math;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Fixed-point scale of [`SwapEngine::get_price`] results: 18 decimals.
pub fn price_scale() -> U256 {
    U256::exp10(18)
}

/// Amounts actually taken and shares minted by `add_liquidity`, oriented to
/// the caller's `(token_x, token_y)` argument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityOutcome {
    pub amount_x_used: U256,
    pub amount_y_used: U256,
    pub liquidity_minted: U256,
}

/// Constant-product AMM engine over a set of lazily created pools.
///
/// The engine owns a ledger account (`vault`) that holds every pool's
/// reserves; deposits are pulled from the caller with `transfer_from` and
/// payouts pushed with `transfer`.
pub struct SwapEngine<L: TokenLedger> {
    registry: PoolRegistry,
    ledger: L,
    clock: Arc<dyn Clock>,
    vault: AccountId,
    config: EngineConfig,
}

impl<L: TokenLedger> SwapEngine<L> {
    /// Fee-less engine on the system clock.
    pub fn new(ledger: L, vault: AccountId) -> Self {
        Self::with_parts(ledger, vault, EngineConfig::default(), Arc::new(SystemClock))
    }

    pub fn with_parts(
        ledger: L,
        vault: AccountId,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry: PoolRegistry::new(),
            ledger,
            clock,
            vault,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn vault(&self) -> AccountId {
        self.vault
    }

    /// Pure pool id derivation; order of arguments does not matter.
    pub fn get_pool_id(token_x: TokenId, token_y: TokenId) -> Result<PoolId, AmmError> {
        PoolRegistry::pool_id(token_x, token_y)
    }

    /// Read accessor over the pool record, the `pools(poolId)` surface.
    pub fn pools(&self, id: PoolId) -> Result<PoolSnapshot, AmmError> {
        let pool = self.registry.get(id).ok_or(AmmError::PoolNotFound(id))?;
        let pool = pool.read();
        Ok(pool.snapshot())
    }

    /// Share balance of one provider in one pool.
    pub fn liquidity_of(&self, id: PoolId, provider: AccountId) -> Result<U256, AmmError> {
        let pool = self.registry.get(id).ok_or(AmmError::PoolNotFound(id))?;
        let pool = pool.read();
        Ok(pool.shares_of(provider))
    }

    /// Number of registered pools (drained pools included).
    pub fn pool_count(&self) -> usize {
        self.registry.len()
    }

    /// Deposits liquidity into the pair's pool, creating it on first use.
    ///
    /// The first deposit uses the desired amounts as-is and mints
    /// `floor(sqrt(amount0 * amount1))` shares, fixing the initial price.
    /// Later deposits are scaled down to the currently held reserve ratio so
    /// the deposit never moves the price, and mint shares proportionally,
    /// taking the more conservative of the two reserve ratios.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        &self,
        caller: AccountId,
        token_x: TokenId,
        token_y: TokenId,
        amount_x_desired: U256,
        amount_y_desired: U256,
        amount_x_min: U256,
        amount_y_min: U256,
        recipient: AccountId,
        deadline: u64,
    ) -> Result<AddLiquidityOutcome, AmmError> {
        let now = self.check_deadline(deadline)?;
        let (id, pool) = self.registry.get_or_create(token_x, token_y)?;
        let mut pool = pool.write();

        // Orient the caller's x/y arguments to storage order.
        let flipped = token_x != pool.token0;
        let (amount0_desired, amount1_desired, amount0_min, amount1_min) = if flipped {
            (amount_y_desired, amount_x_desired, amount_y_min, amount_x_min)
        } else {
            (amount_x_desired, amount_y_desired, amount_x_min, amount_y_min)
        };

        let (amount0, amount1, minted) = if pool.is_empty() {
            let product = math::checked_mul(amount0_desired, amount1_desired)?;
            let minted = math::integer_sqrt(product);
            (amount0_desired, amount1_desired, minted)
        } else {
            let amount1_optimal =
                math::mul_div(amount0_desired, pool.reserve1, pool.reserve0)?;
            let (amount0, amount1) = if amount1_optimal <= amount1_desired {
                (amount0_desired, amount1_optimal)
            } else {
                let amount0_optimal =
                    math::mul_div(amount1_desired, pool.reserve0, pool.reserve1)?;
                debug_assert!(amount0_optimal <= amount0_desired);
                (amount0_optimal, amount1_desired)
            };
            let minted_by_0 = math::mul_div(amount0, pool.total_liquidity, pool.reserve0)?;
            let minted_by_1 = math::mul_div(amount1, pool.total_liquidity, pool.reserve1)?;
            (amount0, amount1, minted_by_0.min(minted_by_1))
        };

        if amount0 < amount0_min {
            return Err(AmmError::SlippageExceeded {
                computed: amount0,
                minimum: amount0_min,
            });
        }
        if amount1 < amount1_min {
            return Err(AmmError::SlippageExceeded {
                computed: amount1,
                minimum: amount1_min,
            });
        }

        // Stage the commit before touching the ledger, so an arithmetic
        // failure cannot strand pulled funds.
        let new_reserve0 = math::checked_add(pool.reserve0, amount0)?;
        let new_reserve1 = math::checked_add(pool.reserve1, amount1)?;
        let new_total = math::checked_add(pool.total_liquidity, minted)?;

        self.ledger
            .transfer_from(pool.token0, self.vault, caller, self.vault, amount0)?;
        if let Err(err) = self
            .ledger
            .transfer_from(pool.token1, self.vault, caller, self.vault, amount1)
        {
            self.refund(pool.token0, caller, amount0);
            return Err(err.into());
        }

        pool.reserve0 = new_reserve0;
        pool.reserve1 = new_reserve1;
        pool.total_liquidity = new_total;
        pool.credit_shares(recipient, minted);

        info!(
            pool_id = %id,
            %amount0,
            %amount1,
            %minted,
            total_liquidity = %pool.total_liquidity,
            now,
            "liquidity added"
        );

        let (amount_x_used, amount_y_used) = if flipped {
            (amount1, amount0)
        } else {
            (amount0, amount1)
        };
        Ok(AddLiquidityOutcome {
            amount_x_used,
            amount_y_used,
            liquidity_minted: minted,
        })
    }

    /// Burns `liquidity` shares from the caller and pays out the
    /// proportional slice of both reserves, floor-rounded in the pool's
    /// favor.
    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity(
        &self,
        caller: AccountId,
        token_x: TokenId,
        token_y: TokenId,
        liquidity: U256,
        amount_x_min: U256,
        amount_y_min: U256,
        recipient: AccountId,
        deadline: u64,
    ) -> Result<(U256, U256), AmmError> {
        let now = self.check_deadline(deadline)?;
        let id = types::pool_id(token_x, token_y)?;
        let pool = self.registry.get(id).ok_or(AmmError::PoolNotFound(id))?;
        let mut pool = pool.write();

        if pool.is_empty() {
            return Err(AmmError::EmptyPool(id));
        }
        let have = pool.shares_of(caller);
        if have < liquidity {
            return Err(AmmError::InsufficientShares {
                have,
                need: liquidity,
            });
        }

        let amount0 = math::mul_div(liquidity, pool.reserve0, pool.total_liquidity)?;
        let amount1 = math::mul_div(liquidity, pool.reserve1, pool.total_liquidity)?;

        let flipped = token_x != pool.token0;
        let (amount0_min, amount1_min) = if flipped {
            (amount_y_min, amount_x_min)
        } else {
            (amount_x_min, amount_y_min)
        };
        if amount0 < amount0_min {
            return Err(AmmError::SlippageExceeded {
                computed: amount0,
                minimum: amount0_min,
            });
        }
        if amount1 < amount1_min {
            return Err(AmmError::SlippageExceeded {
                computed: amount1,
                minimum: amount1_min,
            });
        }

        let new_reserve0 = math::checked_sub(pool.reserve0, amount0)?;
        let new_reserve1 = math::checked_sub(pool.reserve1, amount1)?;
        let new_total = math::checked_sub(pool.total_liquidity, liquidity)?;

        self.ledger
            .transfer(pool.token0, self.vault, recipient, amount0)?;
        if let Err(err) = self
            .ledger
            .transfer(pool.token1, self.vault, recipient, amount1)
        {
            // Reverse the first payout; funds just left the vault, so the
            // recipient holds them.
            if let Err(reverse_err) =
                self.ledger
                    .transfer(pool.token0, recipient, self.vault, amount0)
            {
                error!(pool_id = %id, %reverse_err, "failed to reverse partial payout");
            }
            return Err(err.into());
        }

        pool.reserve0 = new_reserve0;
        pool.reserve1 = new_reserve1;
        pool.total_liquidity = new_total;
        pool.debit_shares(caller, liquidity);

        info!(
            pool_id = %id,
            %liquidity,
            %amount0,
            %amount1,
            total_liquidity = %pool.total_liquidity,
            now,
            "liquidity removed"
        );

        if flipped {
            Ok((amount1, amount0))
        } else {
            Ok((amount0, amount1))
        }
    }

    /// Exact-input single-hop swap along `path = [token_in, token_out]`.
    ///
    /// Prices with the constant-product output formula
    /// `floor(amount_in * reserve_out / (reserve_in + amount_in))`; with a
    /// configured fee the input is discounted by `fee_bps` for pricing while
    /// the full input lands in reserves, so the fee accrues to the pool.
    pub fn swap_exact_tokens_for_tokens(
        &self,
        caller: AccountId,
        amount_in: U256,
        amount_out_min: U256,
        path: &[TokenId],
        recipient: AccountId,
        deadline: u64,
    ) -> Result<U256, AmmError> {
        let now = self.check_deadline(deadline)?;
        if path.len() != 2 {
            return Err(AmmError::InvalidPath(path.len()));
        }
        let (token_in, token_out) = (path[0], path[1]);
        let id = types::pool_id(token_in, token_out)?;
        let pool = self.registry.get(id).ok_or(AmmError::PoolNotFound(id))?;
        let mut pool = pool.write();

        let (reserve_in, reserve_out) = pool
            .oriented_reserves(token_in)
            .ok_or(AmmError::PoolNotFound(id))?;
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(AmmError::EmptyPool(id));
        }

        let amount_in_effective = if self.config.fee_bps == 0 {
            amount_in
        } else {
            math::mul_div(
                amount_in,
                U256::from(BPS_DENOMINATOR - self.config.fee_bps),
                U256::from(BPS_DENOMINATOR),
            )?
        };
        let denominator = math::checked_add(reserve_in, amount_in_effective)?;
        let amount_out = math::mul_div(amount_in_effective, reserve_out, denominator)?;

        if amount_out < amount_out_min {
            warn!(
                pool_id = %id,
                %amount_out,
                %amount_out_min,
                "swap rejected: output below caller minimum"
            );
            return Err(AmmError::SlippageExceeded {
                computed: amount_out,
                minimum: amount_out_min,
            });
        }

        // The full input enters the reserves; only pricing is discounted.
        let new_reserve_in = math::checked_add(reserve_in, amount_in)?;
        let new_reserve_out = math::checked_sub(reserve_out, amount_out)?;

        self.ledger
            .transfer_from(token_in, self.vault, caller, self.vault, amount_in)?;
        if let Err(err) = self
            .ledger
            .transfer(token_out, self.vault, recipient, amount_out)
        {
            self.refund(token_in, caller, amount_in);
            return Err(err.into());
        }

        if token_in == pool.token0 {
            pool.reserve0 = new_reserve_in;
            pool.reserve1 = new_reserve_out;
        } else {
            pool.reserve0 = new_reserve_out;
            pool.reserve1 = new_reserve_in;
        }

        debug!(
            pool_id = %id,
            ?token_in,
            %amount_in,
            %amount_out,
            reserve0 = %pool.reserve0,
            reserve1 = %pool.reserve1,
            now,
            "swap executed"
        );
        Ok(amount_out)
    }

    /// Units of `token_y` per unit of `token_x`, scaled by 10^18.
    ///
    /// Read-only; callers wanting the inverse quote the reversed pair and
    /// invert themselves.
    pub fn get_price(&self, token_x: TokenId, token_y: TokenId) -> Result<U256, AmmError> {
        let id = types::pool_id(token_x, token_y)?;
        let pool = self.registry.get(id).ok_or(AmmError::PoolNotFound(id))?;
        let pool = pool.read();
        let (reserve_x, reserve_y) = pool
            .oriented_reserves(token_x)
            .ok_or(AmmError::PoolNotFound(id))?;
        if reserve_x.is_zero() {
            return Err(AmmError::EmptyPool(id));
        }
        Ok(math::mul_div(reserve_y, price_scale(), reserve_x)?)
    }

    fn check_deadline(&self, deadline: u64) -> Result<u64, AmmError> {
        let now = self.clock.now_unix();
        if now > deadline {
            return Err(AmmError::Expired { deadline, now });
        }
        Ok(now)
    }

    /// Returns pulled funds to the caller after a later step failed. The
    /// funds just arrived in the vault, so this cannot legitimately fail.
    fn refund(&self, token: TokenId, caller: AccountId, amount: U256) {
        if let Err(err) = self.ledger.transfer(token, self.vault, caller, amount) {
            error!(?token, %amount, %err, "failed to refund pulled funds");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::ledger::InMemoryLedger;
    use ethers_core::types::Address;

    fn addr(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    fn wad(units: u64) -> U256 {
        U256::from(units) * U256::exp10(18)
    }

    /// Engine with a funded, approved liquidity provider.
    fn engine_with_fee(fee_bps: u32) -> (SwapEngine<InMemoryLedger>, Address) {
        let ledger = InMemoryLedger::new();
        let vault = addr(0xEE);
        let provider = addr(0xAA);
        for token in [addr(1), addr(2)] {
            ledger.mint(token, provider, wad(1_000_000));
            ledger.approve(token, provider, vault, U256::MAX).unwrap();
        }
        let engine = SwapEngine::with_parts(
            ledger,
            vault,
            EngineConfig { fee_bps },
            Arc::new(FixedClock::at(1_000)),
        );
        (engine, provider)
    }

    #[test]
    fn fee_reduces_output_but_grows_reserves_by_full_input() {
        let (engine, provider) = engine_with_fee(30);
        engine
            .add_liquidity(
                provider,
                addr(1),
                addr(2),
                wad(500),
                wad(1000),
                U256::zero(),
                U256::zero(),
                provider,
                2_000,
            )
            .unwrap();

        let out = engine
            .swap_exact_tokens_for_tokens(
                provider,
                wad(10),
                U256::zero(),
                &[addr(1), addr(2)],
                provider,
                2_000,
            )
            .unwrap();

        // Fee-less output for the same trade is 19607843137254901960.
        let fee_less = U256::from_dec_str("19607843137254901960").unwrap();
        assert!(out < fee_less);

        let id = SwapEngine::<InMemoryLedger>::get_pool_id(addr(1), addr(2)).unwrap();
        let snapshot = engine.pools(id).unwrap();
        assert_eq!(snapshot.reserve0 + snapshot.reserve1, wad(510) + wad(1000) - out);
        assert_eq!(snapshot.reserve0, wad(510));
    }

    #[test]
    fn zero_fee_matches_plain_constant_product() {
        let (engine, provider) = engine_with_fee(0);
        engine
            .add_liquidity(
                provider,
                addr(1),
                addr(2),
                wad(500),
                wad(1000),
                U256::zero(),
                U256::zero(),
                provider,
                2_000,
            )
            .unwrap();

        let out = engine
            .swap_exact_tokens_for_tokens(
                provider,
                wad(10),
                U256::zero(),
                &[addr(1), addr(2)],
                provider,
                2_000,
            )
            .unwrap();
        assert_eq!(out, U256::from_dec_str("19607843137254901960").unwrap());
    }

    #[test]
    fn identical_tokens_rejected_before_pool_creation() {
        let (engine, provider) = engine_with_fee(0);
        let err = engine
            .add_liquidity(
                provider,
                addr(1),
                addr(1),
                wad(1),
                wad(1),
                U256::zero(),
                U256::zero(),
                provider,
                2_000,
            )
            .unwrap_err();
        assert!(matches!(err, AmmError::IdenticalTokens(_)));
        assert_eq!(engine.pool_count(), 0);
    }

    #[test]
    fn swap_on_identical_path_tokens_is_rejected() {
        let (engine, provider) = engine_with_fee(0);
        let err = engine
            .swap_exact_tokens_for_tokens(
                provider,
                wad(1),
                U256::zero(),
                &[addr(1), addr(1)],
                provider,
                2_000,
            )
            .unwrap_err();
        assert!(matches!(err, AmmError::IdenticalTokens(_)));
    }
}
