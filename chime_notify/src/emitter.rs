use std::sync::Arc;

use chime_models::{history::HistoryEntry, permission::Permission};
use chime_storage::HistoryLog;

use crate::{AudioCue, Notification, NotificationDisplay, PermissionProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitResult {
    Shown,
    PermissionDenied,
    Unsupported,
    PlatformError,
}

/// Shows notifications and records the ones that were shown.
///
/// `emit` never fails: every problem is logged and reported through
/// [`EmitResult`] so callers can carry on scheduling.
pub struct NotificationEmitter {
    permission: Arc<dyn PermissionProvider>,
    display: Arc<dyn NotificationDisplay>,
    audio: Arc<dyn AudioCue>,
    history: HistoryLog,
}

impl NotificationEmitter {
    pub fn new(
        permission: Arc<dyn PermissionProvider>,
        display: Arc<dyn NotificationDisplay>,
        audio: Arc<dyn AudioCue>,
        history: HistoryLog,
    ) -> Self {
        Self {
            permission,
            display,
            audio,
            history,
        }
    }

    pub async fn emit(&mut self, title: &str, body: &str) -> EmitResult {
        if !self.display.is_supported() {
            log::warn!("Cannot show notification \"{title}\": notifications are not supported");
            return EmitResult::Unsupported;
        }

        let permission = self.permission.current().await;
        if !permission.is_granted() {
            log::warn!("Cannot show notification \"{title}\": permission is {permission}");
            return EmitResult::PermissionDenied;
        }

        let notification = Notification::new(title, body);
        if let Err(e) = self.display.display(&notification).await {
            log::error!("Error showing notification \"{title}\": {e}");
            return EmitResult::PlatformError;
        }

        log::info!("Notification shown: {title}");

        let message = if body.is_empty() { title } else { body };
        self.history.append(message).await;

        if let Err(e) = self.audio.play_tone() {
            log::warn!("Error playing notification sound: {e}");
        }

        EmitResult::Shown
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.list()
    }

    pub async fn permission(&self) -> Permission {
        self.permission.current().await
    }

    pub async fn request_permission(&self) -> Permission {
        self.permission.request().await
    }

    pub async fn revoke_permission(&self) -> Permission {
        self.permission.revoke().await
    }
}
