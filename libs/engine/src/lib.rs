//! # SimpleSwap Engine - Constant-Product AMM Core
//!
//! ## Purpose
//!
//! Pooled-liquidity swapping between ERC20-style token pairs: proportional
//! liquidity provision, exact-input constant-product swaps, and fixed-point
//! price queries, with slippage and deadline safety on every mutating
//! operation.
//!
//! ## Integration Points
//!
//! - **Input Sources**: frontends and test harnesses calling the operation
//!   surface on [`SwapEngine`]
//! - **Output Destinations**: an external token ledger behind the
//!   [`TokenLedger`] trait, which actually moves funds
//! - **Precision**: all amounts are integers in each token's smallest unit;
//!   only `get_price` scales its output (18-decimal fixed point)
//!
//! ## Architecture Role
//!
//! ```text
//! Caller ──► SwapEngine ──► PoolRegistry ──► Pool (per-pool RwLock)
//!                │                              │
//!                ▼                              ▼
//!           TokenLedger                  simpleswap-math
//! ```
//!
//! Every operation is atomic per pool: checks and arithmetic, then ledger
//! settlement, then the reserve/share commit, all inside one exclusive
//! critical section. Any failure leaves the engine as if the call never
//! happened.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod pool;
pub mod registry;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{price_scale, AddLiquidityOutcome, SwapEngine};
pub use error::AmmError;
pub use ledger::{InMemoryLedger, LedgerError, TokenLedger};
pub use pool::{Pool, PoolSnapshot};
pub use registry::PoolRegistry;
pub use types::{pool_id, sort_tokens, AccountId, PoolId, TokenId};

/// 256-bit amount type used across the engine surface.
pub use ethers_core::types::{Address, U256};
