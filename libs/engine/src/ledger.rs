//! Token-ledger collaborator seam.
//!
//! The engine never holds token balances itself; it directs an external
//! ledger with standard ERC20-style semantics. [`TokenLedger`] is that seam:
//! production embedders adapt their chain/bank backend behind it, tests use
//! the bundled [`InMemoryLedger`].
//!
//! `transfer` takes an explicit `from` account because the engine is the
//! only trusted caller of this interface; it moves funds out of its own
//! vault for payouts and reverses its own pulls when a later step of an
//! operation fails.

use crate::types::{AccountId, TokenId};
use dashmap::DashMap;
use ethers_core::types::U256;

/// Failures reported by the ledger. The engine surfaces these as
/// `AmmError::TransferFailed` and aborts the whole operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: U256, need: U256 },

    #[error("insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: U256, need: U256 },
}

/// ERC20-style token ledger, one logical balance table per token.
pub trait TokenLedger: Send + Sync {
    /// Current balance of `owner` in `token`.
    fn balance_of(&self, token: TokenId, owner: AccountId) -> U256;

    /// Moves `amount` of `token` from `from` to `to`.
    fn transfer(
        &self,
        token: TokenId,
        from: AccountId,
        to: AccountId,
        amount: U256,
    ) -> Result<(), LedgerError>;

    /// Moves `amount` of `token` from `owner` to `to`, spending the
    /// allowance `owner` granted to `spender`.
    fn transfer_from(
        &self,
        token: TokenId,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: U256,
    ) -> Result<(), LedgerError>;

    /// Sets the allowance `owner` grants to `spender` (overwrite, not add).
    fn approve(
        &self,
        token: TokenId,
        owner: AccountId,
        spender: AccountId,
        amount: U256,
    ) -> Result<(), LedgerError>;
}

/// In-memory [`TokenLedger`] with standard balance and allowance checks.
///
/// Backs the integration tests and demos; plays the role the Hardhat
/// `TestToken` plays for the on-chain original.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: DashMap<(TokenId, AccountId), U256>,
    allowances: DashMap<(TokenId, AccountId, AccountId), U256>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` of `token` to `owner` out of thin air.
    pub fn mint(&self, token: TokenId, owner: AccountId, amount: U256) {
        let mut balance = self.balances.entry((token, owner)).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn allowance(&self, token: TokenId, owner: AccountId, spender: AccountId) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .map(|a| *a)
            .unwrap_or_default()
    }

    fn debit(&self, token: TokenId, owner: AccountId, amount: U256) -> Result<(), LedgerError> {
        let mut balance = self.balances.entry((token, owner)).or_default();
        if *balance < amount {
            return Err(LedgerError::InsufficientBalance {
                have: *balance,
                need: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }

    fn credit(&self, token: TokenId, owner: AccountId, amount: U256) {
        let mut balance = self.balances.entry((token, owner)).or_default();
        *balance += amount;
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, token: TokenId, owner: AccountId) -> U256 {
        self.balances
            .get(&(token, owner))
            .map(|b| *b)
            .unwrap_or_default()
    }

    fn transfer(
        &self,
        token: TokenId,
        from: AccountId,
        to: AccountId,
        amount: U256,
    ) -> Result<(), LedgerError> {
        self.debit(token, from, amount)?;
        self.credit(token, to, amount);
        Ok(())
    }

    fn transfer_from(
        &self,
        token: TokenId,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: U256,
    ) -> Result<(), LedgerError> {
        {
            let mut allowance = self.allowances.entry((token, owner, spender)).or_default();
            if *allowance < amount {
                return Err(LedgerError::InsufficientAllowance {
                    have: *allowance,
                    need: amount,
                });
            }
            *allowance -= amount;
        }
        match self.transfer(token, owner, to, amount) {
            Ok(()) => Ok(()),
            Err(err) => {
                // Restore the allowance consumed above.
                let mut allowance = self.allowances.entry((token, owner, spender)).or_default();
                *allowance += amount;
                Err(err)
            }
        }
    }

    fn approve(
        &self,
        token: TokenId,
        owner: AccountId,
        spender: AccountId,
        amount: U256,
    ) -> Result<(), LedgerError> {
        self.allowances.insert((token, owner, spender), amount);
        Ok(())
    }
}
