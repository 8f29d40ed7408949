use anyhow::{bail, Result};
use async_trait::async_trait;
use scholar_types::{Address, BadgeId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Non-fungible badge issuer. Badges acknowledge donations and grant claims.
///
/// Token ids are allocated by the caller (the treasury); the issuer only
/// enforces id uniqueness.
#[async_trait]
pub trait BadgeIssuer: Send + Sync {
    async fn mint(&self, to: Address, badge_id: BadgeId) -> Result<()>;
}

/// In-memory reference issuer.
pub struct MemoryBadgeIssuer {
    owners: Arc<RwLock<HashMap<BadgeId, Address>>>,
}

impl Default for MemoryBadgeIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBadgeIssuer {
    pub fn new() -> Self {
        Self {
            owners: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn owner_of(&self, badge_id: BadgeId) -> Option<Address> {
        let owners = self.owners.read().await;
        owners.get(&badge_id).copied()
    }

    pub async fn badges_of(&self, address: Address) -> Vec<BadgeId> {
        let owners = self.owners.read().await;
        let mut ids: Vec<BadgeId> = owners
            .iter()
            .filter(|(_, owner)| **owner == address)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl BadgeIssuer for MemoryBadgeIssuer {
    async fn mint(&self, to: Address, badge_id: BadgeId) -> Result<()> {
        let mut owners = self.owners.write().await;
        if owners.contains_key(&badge_id) {
            bail!("Badge {} already minted", badge_id);
        }
        owners.insert(badge_id, to);

        info!(badge_id, owner = %to, "🎖️ Badge minted");
        Ok(())
    }
}
