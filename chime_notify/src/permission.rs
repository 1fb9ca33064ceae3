use std::sync::Arc;

use async_trait::async_trait;
use chime_models::permission::Permission;
use chime_storage::{KeyValueStore, load_json, save_json};

pub const PERMISSION_KEY: &str = "notification_permission";

#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn current(&self) -> Permission;

    async fn request(&self) -> Permission;

    async fn revoke(&self) -> Permission;
}

/// Permission remembered in the key/value store.
///
/// There is no system prompt to show from a terminal: the user asking to
/// enable notifications is the grant.
pub struct StoredPermission {
    store: Arc<dyn KeyValueStore>,
}

impl StoredPermission {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn record(&self, permission: Permission) -> Permission {
        if let Err(e) = save_json(self.store.as_ref(), PERMISSION_KEY, &permission).await {
            log::error!("Failed to persist notification permission: {e}");
        }
        log::info!("Notification permission is now {permission}");
        permission
    }
}

#[async_trait]
impl PermissionProvider for StoredPermission {
    async fn current(&self) -> Permission {
        load_json(self.store.as_ref(), PERMISSION_KEY)
            .await
            .unwrap_or(Permission::Default)
    }

    async fn request(&self) -> Permission {
        self.record(Permission::Granted).await
    }

    async fn revoke(&self) -> Permission {
        self.record(Permission::Denied).await
    }
}
