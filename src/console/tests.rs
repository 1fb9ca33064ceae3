use std::sync::Arc;

use chime_models::clock::{Clock, SystemClock};
use chime_notify::{
    NotificationEmitter,
    test_util::{CountingAudio, FixedPermission, RecordingDisplay},
};
use chime_scheduler::OccurrenceScheduler;
use chime_storage::{HistoryLog, InMemoryKeyValueStore, KeyValueStore, TimeStore};

use super::*;

struct TestContext {
    display: RecordingDisplay,
    console: Console,
}

impl TestContext {
    async fn start(permission: FixedPermission) -> Self {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let display = RecordingDisplay::new();

        let emitter = NotificationEmitter::new(
            Arc::new(permission),
            Arc::new(display.clone()),
            Arc::new(CountingAudio::new()),
            HistoryLog::load(kv.clone(), clock.clone()).await,
        );
        let handle = OccurrenceScheduler::new(
            TimeStore::load(kv).await,
            emitter,
            clock,
            TimezonePolicy::Local,
            NotificationSettings::default(),
        )
        .start();

        Self {
            display,
            console: Console::new(handle, TimezonePolicy::Local, NotificationSettings::default()),
        }
    }

    async fn run(&self, line: &str) -> String {
        let command = line.parse().unwrap();
        match self.console.execute(command).await.unwrap() {
            ControlFlow::Continue(output) => output,
            ControlFlow::Break(()) => panic!("Unexpected quit for `{line}`"),
        }
    }
}

#[test]
fn parses_commands_with_arguments() {
    assert_eq!("add 08:00".parse::<Command>(), Ok(Command::Add("08:00".to_string())));
    assert_eq!("  REMOVE 8:5 ".parse::<Command>(), Ok(Command::Remove("8:5".to_string())));
    assert_eq!("ls".parse::<Command>(), Ok(Command::List));
    assert_eq!("quit".parse::<Command>(), Ok(Command::Quit));
}

#[test]
fn time_commands_require_an_argument() {
    assert_eq!("add".parse::<Command>(), Err(CommandError::MissingTime("add")));
    assert_eq!("rm".parse::<Command>(), Err(CommandError::MissingTime("remove")));
}

#[test]
fn unknown_command_is_rejected() {
    assert_eq!(
        "snooze 5".parse::<Command>(),
        Err(CommandError::Unknown("snooze".to_string()))
    );
}

#[tokio::test]
async fn add_reports_normalized_time_and_duplicates() {
    let ctx = TestContext::start(FixedPermission::granted()).await;

    assert_eq!(ctx.run("add 8:00").await, "Added notification for 08:00");
    assert_eq!(ctx.run("add 08:00").await, "Time 08:00 is already scheduled");
    assert_eq!(ctx.run("list").await, "08:00");
}

#[tokio::test]
async fn invalid_time_is_reported() {
    let ctx = TestContext::start(FixedPermission::granted()).await;

    assert_eq!(
        ctx.run("add 25:00").await,
        "invalid time \"25:00\", expected HH:MM"
    );
    assert_eq!(ctx.run("list").await, "No times scheduled");
}

#[tokio::test]
async fn remove_reports_present_and_absent_times() {
    let ctx = TestContext::start(FixedPermission::granted()).await;
    ctx.run("add 06:00").await;

    assert_eq!(ctx.run("remove 6:00").await, "Removed scheduled time: 06:00");
    assert_eq!(ctx.run("remove 06:00").await, "Time 06:00 is not scheduled");
}

#[tokio::test]
async fn test_notification_needs_permission() {
    let ctx = TestContext::start(FixedPermission::new(Permission::Default)).await;

    assert_eq!(ctx.run("test").await, "Please enable notifications first");
    assert_eq!(ctx.display.count(), 0);

    assert_eq!(
        ctx.run("enable").await,
        "Notifications enabled! Add times to get started."
    );
    assert_eq!(ctx.run("test").await, "Test notification sent!");
    assert_eq!(ctx.display.shown()[0].title, "Reminder Test");
}

#[tokio::test]
async fn history_lists_shown_notifications() {
    let ctx = TestContext::start(FixedPermission::granted()).await;

    assert_eq!(ctx.run("history").await, "No notifications yet");

    ctx.run("test").await;
    assert!(ctx.run("history").await.ends_with("This is a test notification"));
}

#[tokio::test]
async fn next_without_times_shows_placeholder() {
    let ctx = TestContext::start(FixedPermission::granted()).await;

    assert_eq!(ctx.run("next").await, "Next notification: --:--");
}

#[tokio::test]
async fn quit_breaks_the_loop() {
    let ctx = TestContext::start(FixedPermission::granted()).await;

    let flow = ctx.console.execute(Command::Quit).await.unwrap();

    assert_eq!(flow, ControlFlow::Break(()));
}
