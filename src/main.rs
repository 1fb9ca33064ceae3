mod appsettings;
mod console;

use std::sync::Arc;

use anyhow::Context;
use chime_models::{
    clock::{Clock, SystemClock, TimezonePolicy},
    settings::Settings,
};
use chime_notify::{
    AudioCue, NoSound, NotificationDisplay, NotificationEmitter, StoredPermission,
};
use chime_scheduler::OccurrenceScheduler;
use chime_storage::{FileKeyValueStore, HistoryLog, KeyValueStore, TimeStore};

use crate::console::Console;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let settings = appsettings::load().context("Failed to load settings")?;
    log::debug!("Loaded settings: {settings:?}");

    let policy: TimezonePolicy = settings.schedule.timezone.parse()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileKeyValueStore::open(&settings.storage.data_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to open data directory {}",
                    settings.storage.data_dir.display()
                )
            })?,
    );

    let times = TimeStore::load(store.clone()).await;
    let history = HistoryLog::load(store.clone(), clock.clone()).await;
    let emitter = NotificationEmitter::new(
        Arc::new(StoredPermission::new(store)),
        create_display(),
        create_audio(&settings),
        history,
    );

    log::info!("Starting scheduler with {} reminder times", times.list().len());
    let handle = OccurrenceScheduler::new(
        times,
        emitter,
        clock,
        policy,
        settings.notification.clone(),
    )
    .start();

    Console::new(handle, policy, settings.notification)
        .run()
        .await
}

fn init_logging() {
    if std::env::var_os("RUST_LOG").is_none() {
        pretty_env_logger::formatted_builder()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        pretty_env_logger::init();
    }
}

#[cfg(feature = "desktop")]
fn create_display() -> Arc<dyn NotificationDisplay> {
    Arc::new(chime_notify::DesktopDisplay::new("chime"))
}

#[cfg(not(feature = "desktop"))]
fn create_display() -> Arc<dyn NotificationDisplay> {
    Arc::new(chime_notify::ConsoleDisplay)
}

fn create_audio(settings: &Settings) -> Arc<dyn AudioCue> {
    if !settings.notification.sound {
        return Arc::new(NoSound);
    }

    #[cfg(feature = "sound")]
    return Arc::new(chime_notify::SineTone);

    #[cfg(not(feature = "sound"))]
    Arc::new(chime_notify::TerminalBell)
}
