use std::{
    collections::{HashMap, hash_map::Entry},
    ops::ControlFlow,
    sync::Arc,
};

use chime_models::{
    chrono::NaiveDateTime,
    clock::{Clock, TimezonePolicy},
    history::HistoryEntry,
    permission::Permission,
    reminder_time::ReminderTime,
    settings::NotificationSettings,
};
use chime_notify::{EmitResult, NotificationEmitter};
use chime_storage::{TimeStore, TimeStoreError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::{
    occurrence::{delay_until, occurrence},
    status::{format_next, next_occurrence},
    timer::{ArmedTimer, Wakeup},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error(transparent)]
    Store(#[from] TimeStoreError),

    #[error("Scheduler is not running")]
    Stopped,
}

#[derive(Debug)]
enum SchedulerMessage {
    Add {
        raw: String,
        reply: oneshot::Sender<Result<ReminderTime, TimeStoreError>>,
    },
    Remove {
        time: ReminderTime,
        reply: oneshot::Sender<bool>,
    },
    List {
        reply: oneshot::Sender<Vec<ReminderTime>>,
    },
    History {
        reply: oneshot::Sender<Vec<HistoryEntry>>,
    },
    NextOccurrence {
        reply: oneshot::Sender<Option<NaiveDateTime>>,
    },
    Armed {
        reply: oneshot::Sender<Vec<(ReminderTime, NaiveDateTime)>>,
    },
    Resync {
        reply: oneshot::Sender<()>,
    },
    Emit {
        title: String,
        body: String,
        reply: oneshot::Sender<EmitResult>,
    },
    Permission {
        reply: oneshot::Sender<Permission>,
    },
    RequestPermission {
        reply: oneshot::Sender<Permission>,
    },
    RevokePermission {
        reply: oneshot::Sender<Permission>,
    },
    Elapsed {
        time: ReminderTime,
        at: NaiveDateTime,
        seq: u64,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Keeps exactly one armed timer per stored reminder time and re-arms it for
/// the next day whenever it fires.
pub struct OccurrenceScheduler {
    store: TimeStore,
    emitter: NotificationEmitter,
    clock: Arc<dyn Clock>,
    policy: TimezonePolicy,
    notification: NotificationSettings,
}

impl OccurrenceScheduler {
    pub fn new(
        store: TimeStore,
        emitter: NotificationEmitter,
        clock: Arc<dyn Clock>,
        policy: TimezonePolicy,
        notification: NotificationSettings,
    ) -> Self {
        Self {
            store,
            emitter,
            clock,
            policy,
            notification,
        }
    }

    /// Spawns the driving loop and arms timers for the stored times.
    pub fn start(self) -> SchedulerHandle {
        let (tx, rx) = mpsc::unbounded_channel();

        let driver = SchedulerLoop {
            store: self.store,
            emitter: self.emitter,
            clock: self.clock,
            policy: self.policy,
            notification: self.notification,
            tx: tx.downgrade(),
            timers: HashMap::new(),
            last_fired: HashMap::new(),
            next_seq: 0,
        };
        tokio::spawn(driver.run(rx));

        SchedulerHandle { tx }
    }
}

#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<SchedulerMessage>,
}

impl SchedulerHandle {
    pub async fn add(&self, raw_time: &str) -> Result<ReminderTime, SchedulerError> {
        let raw = raw_time.to_string();
        Ok(self
            .request(|reply| SchedulerMessage::Add { raw, reply })
            .await??)
    }

    /// Accepts the same loose `H:M` input as [`SchedulerHandle::add`].
    pub async fn remove(&self, raw_time: &str) -> Result<bool, SchedulerError> {
        let time: ReminderTime = raw_time.parse().map_err(TimeStoreError::from)?;
        self.request(|reply| SchedulerMessage::Remove { time, reply })
            .await
    }

    pub async fn list(&self) -> Result<Vec<ReminderTime>, SchedulerError> {
        self.request(|reply| SchedulerMessage::List { reply }).await
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>, SchedulerError> {
        self.request(|reply| SchedulerMessage::History { reply })
            .await
    }

    pub async fn next_occurrence(&self) -> Result<Option<NaiveDateTime>, SchedulerError> {
        self.request(|reply| SchedulerMessage::NextOccurrence { reply })
            .await
    }

    /// Armed timers as `(time, occurrence)`, ordered by time.
    pub async fn armed(&self) -> Result<Vec<(ReminderTime, NaiveDateTime)>, SchedulerError> {
        self.request(|reply| SchedulerMessage::Armed { reply }).await
    }

    pub async fn resync(&self) -> Result<(), SchedulerError> {
        self.request(|reply| SchedulerMessage::Resync { reply }).await
    }

    /// Shows a notification right away, outside of any schedule.
    pub async fn emit(&self, title: &str, body: &str) -> Result<EmitResult, SchedulerError> {
        let title = title.to_string();
        let body = body.to_string();
        self.request(|reply| SchedulerMessage::Emit { title, body, reply })
            .await
    }

    pub async fn permission(&self) -> Result<Permission, SchedulerError> {
        self.request(|reply| SchedulerMessage::Permission { reply })
            .await
    }

    pub async fn request_permission(&self) -> Result<Permission, SchedulerError> {
        self.request(|reply| SchedulerMessage::RequestPermission { reply })
            .await
    }

    pub async fn revoke_permission(&self) -> Result<Permission, SchedulerError> {
        self.request(|reply| SchedulerMessage::RevokePermission { reply })
            .await
    }

    /// Cancels every timer and stops the loop.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        self.request(|reply| SchedulerMessage::Shutdown { reply })
            .await
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> SchedulerMessage,
    ) -> Result<T, SchedulerError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(message(reply))
            .map_err(|_| SchedulerError::Stopped)?;

        response.await.map_err(|_| SchedulerError::Stopped)
    }
}

struct SchedulerLoop {
    store: TimeStore,
    emitter: NotificationEmitter,
    clock: Arc<dyn Clock>,
    policy: TimezonePolicy,
    notification: NotificationSettings,
    tx: mpsc::WeakUnboundedSender<SchedulerMessage>,
    timers: HashMap<ReminderTime, ArmedTimer>,
    last_fired: HashMap<ReminderTime, NaiveDateTime>,
    next_seq: u64,
}

impl SchedulerLoop {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SchedulerMessage>) {
        log::info!("Starting occurrence scheduler");
        self.resync().await;

        let mut shutdown_reply = None;
        while let Some(message) = rx.recv().await {
            if let ControlFlow::Break(reply) = self.handle_message(message).await {
                shutdown_reply = Some(reply);
                break;
            }
        }

        self.cancel_all();
        log::info!("Occurrence scheduler stopped");

        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    async fn handle_message(&mut self, message: SchedulerMessage) -> ControlFlow<oneshot::Sender<()>> {
        match message {
            SchedulerMessage::Add { raw, reply } => {
                let result = self.store.add(&raw).await;
                match &result {
                    Ok(time) => {
                        log::info!("Added reminder time {time}");
                        self.resync().await;
                    }
                    Err(e) => log::info!("Rejected reminder time \"{raw}\": {e}"),
                }
                let _ = reply.send(result);
            }
            SchedulerMessage::Remove { time, reply } => {
                let removed = self.store.remove(&time).await;
                if removed {
                    log::info!("Removed reminder time {time}");
                    self.resync().await;
                }
                let _ = reply.send(removed);
            }
            SchedulerMessage::List { reply } => {
                let _ = reply.send(self.store.list().to_vec());
            }
            SchedulerMessage::History { reply } => {
                let _ = reply.send(self.emitter.history());
            }
            SchedulerMessage::NextOccurrence { reply } => {
                let _ = reply.send(next_occurrence(self.store.list(), self.wall_now()));
            }
            SchedulerMessage::Armed { reply } => {
                let _ = reply.send(self.armed());
            }
            SchedulerMessage::Resync { reply } => {
                self.resync().await;
                let _ = reply.send(());
            }
            SchedulerMessage::Emit { title, body, reply } => {
                let result = self.emitter.emit(&title, &body).await;
                let _ = reply.send(result);
            }
            SchedulerMessage::Permission { reply } => {
                let _ = reply.send(self.emitter.permission().await);
            }
            SchedulerMessage::RequestPermission { reply } => {
                let _ = reply.send(self.emitter.request_permission().await);
            }
            SchedulerMessage::RevokePermission { reply } => {
                let _ = reply.send(self.emitter.revoke_permission().await);
            }
            SchedulerMessage::Elapsed { time, at, seq } => self.on_elapsed(time, at, seq).await,
            SchedulerMessage::Shutdown { reply } => return ControlFlow::Break(reply),
        }

        ControlFlow::Continue(())
    }

    /// Cancels every timer, then arms a fresh one per stored time.
    ///
    /// Occurrences that came due while the loop was busy fire first, as their
    /// queued wake-ups turn stale once the timers are replaced.
    async fn resync(&mut self) {
        let now = self.wall_now();
        self.fire_overdue(now).await;
        self.cancel_all();

        let times = self.store.list().to_vec();
        self.last_fired.retain(|time, _| times.contains(time));

        for time in &times {
            self.arm(*time, now);
        }

        log::info!(
            "[RESYNC] {} timer(s) armed, next occurrence {}",
            self.timers.len(),
            format_next(next_occurrence(&times, now))
        );
    }

    fn arm(&mut self, time: ReminderTime, now: NaiveDateTime) {
        // A time that just fired must not come back for the same instant when
        // the wall clock trails the timer.
        let not_before = match self.last_fired.get(&time) {
            Some(fired_at) if *fired_at > now => *fired_at,
            _ => now,
        };
        let at = occurrence(&time, not_before);
        let delay = delay_until(at, now);
        let wakeup = self.spawn_wakeup(time, at, delay);

        log::debug!("[ARM] {time} at {at}, sleeping for {delay:?}");

        match self.timers.entry(time) {
            Entry::Occupied(mut entry) => entry.get_mut().rearm(at, wakeup),
            Entry::Vacant(entry) => {
                entry.insert(ArmedTimer::new(time, at, wakeup));
            }
        }
    }

    fn spawn_wakeup(&mut self, time: ReminderTime, at: NaiveDateTime, delay: std::time::Duration) -> Wakeup {
        self.next_seq += 1;
        let seq = self.next_seq;
        let tx = self.tx.clone();

        Wakeup::spawn(seq, delay, move || {
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(SchedulerMessage::Elapsed { time, at, seq });
            }
        })
    }

    async fn fire_overdue(&mut self, now: NaiveDateTime) {
        let mut overdue: Vec<(NaiveDateTime, ReminderTime)> = self
            .timers
            .iter()
            .filter(|(time, _)| self.store.contains(time))
            .filter_map(|(time, timer)| timer.armed_at().filter(|at| *at <= now).map(|at| (at, *time)))
            .collect();
        overdue.sort();

        for (at, time) in overdue {
            log::info!("[FIRE] {time} came due before its wake-up was handled");
            self.fire(time, at).await;
        }
    }

    fn cancel_all(&mut self) {
        for (time, mut timer) in self.timers.drain() {
            timer.cancel();
            log::debug!("[CANCEL] {time} ({:?})", timer.state());
        }
    }

    async fn on_elapsed(&mut self, time: ReminderTime, at: NaiveDateTime, seq: u64) {
        let is_current = self
            .timers
            .get(&time)
            .is_some_and(|timer| timer.is_current(seq, at));
        if !is_current {
            log::debug!("Ignoring stale wake-up for {time} at {at}");
            return;
        }

        log::info!("[FIRE] {time}");
        self.fire(time, at).await;

        let now = self.wall_now();
        self.arm(time, now);
        self.resync().await;
    }

    async fn fire(&mut self, time: ReminderTime, at: NaiveDateTime) {
        if let Some(timer) = self.timers.get_mut(&time) {
            timer.fire(at);
        }
        self.last_fired.insert(time, at);

        let body = self.notification.body_for(&time);
        let result = self.emitter.emit(&self.notification.title, &body).await;
        if result != EmitResult::Shown {
            log::warn!("[FIRE] {time} was not shown: {result:?}");
        }
    }

    fn armed(&self) -> Vec<(ReminderTime, NaiveDateTime)> {
        let mut armed: Vec<_> = self
            .timers
            .iter()
            .filter_map(|(time, timer)| timer.armed_at().map(|at| (*time, at)))
            .collect();
        armed.sort();
        armed
    }

    fn wall_now(&self) -> NaiveDateTime {
        self.policy.wall_clock(self.clock.now())
    }
}
