use crate::{RegistryError, Result};
use chrono::Utc;
use scholar_events::{EventBus, SystemEvent};
use scholar_types::Address;
use tokio::sync::RwLock;
use tracing::info;

/// Root-identity holder gating every admin operation.
///
/// The root is configurable at construction and transferable at runtime, so
/// there is no unmovable admin singleton. Handover is itself root-gated.
pub struct AccessController {
    root: RwLock<Address>,
    events: EventBus,
}

impl AccessController {
    pub fn new(root: Address, events: EventBus) -> Self {
        Self {
            root: RwLock::new(root),
            events,
        }
    }

    pub async fn root(&self) -> Address {
        *self.root.read().await
    }

    /// Fails with an authorization error unless `caller` is the root.
    pub async fn require_root(&self, caller: Address) -> Result<()> {
        let root = self.root.read().await;
        if *root != caller {
            return Err(RegistryError::NotRoot(caller));
        }
        Ok(())
    }

    /// Hand the root identity over to `new_root`.
    pub async fn transfer_ownership(&self, caller: Address, new_root: Address) -> Result<()> {
        let mut root = self.root.write().await;
        if *root != caller {
            return Err(RegistryError::NotRoot(caller));
        }

        let previous = *root;
        *root = new_root;

        info!(
            previous_root = %previous,
            new_root = %new_root,
            "👑 Root identity transferred"
        );
        self.events.emit(SystemEvent::OwnershipTransferred {
            previous_root: previous.to_string(),
            new_root: new_root.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}
