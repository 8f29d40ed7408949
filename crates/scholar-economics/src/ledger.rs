use anyhow::{bail, Result};
use async_trait::async_trait;
use scholar_types::{Address, TokenAmount};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Fungible value ledger consumed by the grant treasury.
///
/// `transfer` moves value between two accounts on the caller's authority;
/// `transfer_from` pulls value out of `owner`'s account (donations). The
/// in-memory implementation does not model allowances — authorization is the
/// deployment environment's concern.
#[async_trait]
pub trait ValueLedger: Send + Sync {
    async fn transfer(&self, from: Address, to: Address, amount: TokenAmount) -> Result<()>;

    async fn transfer_from(&self, owner: Address, to: Address, amount: TokenAmount)
        -> Result<()>;

    async fn balance_of(&self, address: Address) -> Result<TokenAmount>;
}

/// In-memory reference ledger.
pub struct MemoryLedger {
    balances: Arc<RwLock<HashMap<Address, TokenAmount>>>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed an account with value. Test and genesis helper.
    pub async fn credit(&self, address: Address, amount: TokenAmount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let mut balances = self.balances.write().await;
        let current = balances.get(&address).copied().unwrap_or(TokenAmount::ZERO);
        let new_balance = current
            .checked_add(amount)
            .ok_or_else(|| anyhow::anyhow!("Balance overflow for {}", address))?;
        balances.insert(address, new_balance);

        info!(
            address = %address,
            amount = %amount,
            balance_before = current.to_units(),
            balance_after = new_balance.to_units(),
            "💰 Balance credited"
        );
        Ok(())
    }

    async fn move_value(&self, from: Address, to: Address, amount: TokenAmount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        if from == to {
            bail!("Cannot transfer to same address");
        }

        // Both balances mutate under one write guard.
        let mut balances = self.balances.write().await;

        let from_balance = balances.get(&from).copied().unwrap_or(TokenAmount::ZERO);
        if from_balance < amount {
            bail!(
                "Insufficient balance: {} has {}, needs {}",
                from,
                from_balance,
                amount
            );
        }

        let to_balance = balances.get(&to).copied().unwrap_or(TokenAmount::ZERO);
        let new_from = from_balance.saturating_sub(amount);
        let new_to = to_balance
            .checked_add(amount)
            .ok_or_else(|| anyhow::anyhow!("Balance overflow for recipient {}", to))?;

        balances.insert(from, new_from);
        balances.insert(to, new_to);

        info!(
            from = %from,
            to = %to,
            amount = %amount,
            from_balance_after = new_from.to_units(),
            to_balance_after = new_to.to_units(),
            "💸 Transfer executed"
        );
        Ok(())
    }
}

#[async_trait]
impl ValueLedger for MemoryLedger {
    async fn transfer(&self, from: Address, to: Address, amount: TokenAmount) -> Result<()> {
        self.move_value(from, to, amount).await
    }

    async fn transfer_from(
        &self,
        owner: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<()> {
        self.move_value(owner, to, amount).await
    }

    async fn balance_of(&self, address: Address) -> Result<TokenAmount> {
        let balances = self.balances.read().await;
        Ok(balances.get(&address).copied().unwrap_or(TokenAmount::ZERO))
    }
}
