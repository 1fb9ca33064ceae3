use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[cfg(feature = "desktop")]
    #[error(transparent)]
    Desktop(#[from] notify_rust::error::Error),

    #[error("notification task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Platform(String),
}

#[async_trait]
pub trait NotificationDisplay: Send + Sync {
    fn is_supported(&self) -> bool;

    async fn display(&self, notification: &Notification) -> Result<(), DisplayError>;
}

/// Prints notifications to stdout.
pub struct ConsoleDisplay;

#[async_trait]
impl NotificationDisplay for ConsoleDisplay {
    fn is_supported(&self) -> bool {
        true
    }

    async fn display(&self, notification: &Notification) -> Result<(), DisplayError> {
        println!("🔔 {}: {}", notification.title, notification.body);
        Ok(())
    }
}

/// Desktop notifications through the platform notification server.
#[cfg(feature = "desktop")]
pub struct DesktopDisplay {
    app_name: String,
}

#[cfg(feature = "desktop")]
impl DesktopDisplay {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

#[cfg(feature = "desktop")]
#[async_trait]
impl NotificationDisplay for DesktopDisplay {
    fn is_supported(&self) -> bool {
        true
    }

    async fn display(&self, notification: &Notification) -> Result<(), DisplayError> {
        let app_name = self.app_name.clone();
        let notification = notification.clone();

        // Stays on screen until dismissed.
        tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .summary(&notification.title)
                .body(&notification.body)
                .appname(&app_name)
                .timeout(notify_rust::Timeout::Never)
                .show()
                .map(|_| ())
        })
        .await??;

        Ok(())
    }
}
