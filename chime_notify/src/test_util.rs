use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chime_models::permission::Permission;

use crate::{AudioCue, DisplayError, Notification, NotificationDisplay, PermissionProvider};

pub type ShownNotifications = Arc<Mutex<Vec<Notification>>>;

#[derive(Clone, Default)]
pub struct RecordingDisplay {
    shown: ShownNotifications,
    failing: Arc<AtomicBool>,
    unsupported: bool,
    latency: Duration,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    /// Takes `latency` to show each notification, like a blocking platform call.
    pub fn slow(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.shown.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationDisplay for RecordingDisplay {
    fn is_supported(&self) -> bool {
        !self.unsupported
    }

    async fn display(&self, notification: &Notification) -> Result<(), DisplayError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failing.load(Ordering::Relaxed) {
            return Err(DisplayError::Platform("display refused".to_string()));
        }

        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[derive(Clone)]
pub struct FixedPermission(Arc<Mutex<Permission>>);

impl FixedPermission {
    pub fn new(permission: Permission) -> Self {
        Self(Arc::new(Mutex::new(permission)))
    }

    pub fn granted() -> Self {
        Self::new(Permission::Granted)
    }
}

#[async_trait]
impl PermissionProvider for FixedPermission {
    async fn current(&self) -> Permission {
        *self.0.lock().unwrap()
    }

    async fn request(&self) -> Permission {
        *self.0.lock().unwrap() = Permission::Granted;
        Permission::Granted
    }

    async fn revoke(&self) -> Permission {
        *self.0.lock().unwrap() = Permission::Denied;
        Permission::Denied
    }
}

#[derive(Clone, Default)]
pub struct CountingAudio {
    played: Arc<AtomicUsize>,
    failing: bool,
}

impl CountingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn played(&self) -> usize {
        self.played.load(Ordering::Relaxed)
    }
}

impl AudioCue for CountingAudio {
    fn play_tone(&self) -> anyhow::Result<()> {
        self.played.fetch_add(1, Ordering::Relaxed);
        if self.failing {
            anyhow::bail!("no audio device");
        }
        Ok(())
    }
}
