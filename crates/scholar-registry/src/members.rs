use crate::{AccessController, Result};
use chrono::{DateTime, Utc};
use scholar_events::{EventBus, SystemEvent};
use scholar_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Governance weight class. Stored on the member record; the current vote
/// threshold check counts heads, not weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberTier {
    Bronze,
    Silver,
    Gold,
    Diamond,
}

impl MemberTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberTier::Bronze => "bronze",
            MemberTier::Silver => "silver",
            MemberTier::Gold => "gold",
            MemberTier::Diamond => "diamond",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub address: Address,
    pub tier: MemberTier,
    pub vote_power: u64,
    pub joined: DateTime<Utc>,
}

/// Registry of governance members, independent of academic roles.
pub struct MembershipRegistry {
    access: Arc<AccessController>,
    members: RwLock<HashMap<Address, Member>>,
    events: EventBus,
}

impl MembershipRegistry {
    pub fn new(access: Arc<AccessController>, events: EventBus) -> Self {
        Self {
            access,
            members: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Add a member at the default Bronze tier. Admin-gated; an existing
    /// record for the address is overwritten.
    pub async fn add_member(
        &self,
        caller: Address,
        address: Address,
        vote_power: u64,
    ) -> Result<()> {
        self.access.require_root(caller).await?;

        let member = Member {
            address,
            tier: MemberTier::Bronze,
            vote_power,
            joined: Utc::now(),
        };

        let mut members = self.members.write().await;
        members.insert(address, member);
        drop(members);

        info!(address = %address, vote_power, "🗳️ Member added");
        self.events.emit(SystemEvent::MemberAdded {
            address: address.to_string(),
            tier: MemberTier::Bronze.as_str().to_string(),
            vote_power,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    pub async fn is_member(&self, address: Address) -> bool {
        let members = self.members.read().await;
        members.contains_key(&address)
    }

    pub async fn member(&self, address: Address) -> Option<Member> {
        let members = self.members.read().await;
        members.get(&address).cloned()
    }

    pub async fn member_count(&self) -> usize {
        let members = self.members.read().await;
        members.len()
    }
}
