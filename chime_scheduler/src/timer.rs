use std::time::Duration;

use chime_models::{chrono::NaiveDateTime, reminder_time::ReminderTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceState {
    Armed(NaiveDateTime),
    Fired(NaiveDateTime),
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum OccurrenceEvent {
    Arm(NaiveDateTime),
    Elapsed(NaiveDateTime),
    Cancel,
}

pub(crate) fn transition(
    time: &ReminderTime,
    current: OccurrenceState,
    event: OccurrenceEvent,
) -> OccurrenceState {
    match (current, event) {
        (OccurrenceState::Fired(_) | OccurrenceState::Cancelled, OccurrenceEvent::Arm(at)) => {
            OccurrenceState::Armed(at)
        }
        (OccurrenceState::Armed(armed_at), OccurrenceEvent::Elapsed(at)) if armed_at == at => {
            OccurrenceState::Fired(at)
        }
        (OccurrenceState::Armed(_) | OccurrenceState::Fired(_), OccurrenceEvent::Cancel) => {
            OccurrenceState::Cancelled
        }
        (state, event) => {
            log::warn!(
                "Received unknown state and event combination for occurrence. [state = {:?}, event = {:?}, time = {}]",
                state,
                event,
                time
            );

            state
        }
    }
}

/// A pending single-shot sleep. `seq` tells a live wake-up apart from one
/// that was cancelled after it had already sent its message.
pub(crate) struct Wakeup {
    seq: u64,
    cancellation_token: CancellationToken,
    task: JoinHandle<()>,
}

impl Wakeup {
    pub(crate) fn spawn<F>(seq: u64, delay: Duration, on_elapsed: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = task_cancellation_token.cancelled() => {}
                _ = tokio::time::sleep(delay) => on_elapsed(),
            }
        });

        Self {
            seq,
            cancellation_token,
            task,
        }
    }

    fn cancel(self) {
        self.cancellation_token.cancel();
        self.task.abort();
    }
}

/// The one live timer of a reminder time.
pub(crate) struct ArmedTimer {
    time: ReminderTime,
    state: OccurrenceState,
    wakeup: Option<Wakeup>,
}

impl ArmedTimer {
    pub(crate) fn new(time: ReminderTime, at: NaiveDateTime, wakeup: Wakeup) -> Self {
        Self {
            time,
            state: OccurrenceState::Armed(at),
            wakeup: Some(wakeup),
        }
    }

    pub(crate) fn state(&self) -> OccurrenceState {
        self.state
    }

    pub(crate) fn armed_at(&self) -> Option<NaiveDateTime> {
        match self.state {
            OccurrenceState::Armed(at) => Some(at),
            _ => None,
        }
    }

    pub(crate) fn is_current(&self, seq: u64, at: NaiveDateTime) -> bool {
        self.state == OccurrenceState::Armed(at)
            && self.wakeup.as_ref().is_some_and(|wakeup| wakeup.seq == seq)
    }

    pub(crate) fn fire(&mut self, at: NaiveDateTime) {
        self.wakeup = None;
        self.apply(OccurrenceEvent::Elapsed(at));
    }

    pub(crate) fn rearm(&mut self, at: NaiveDateTime, wakeup: Wakeup) {
        if let Some(previous) = self.wakeup.replace(wakeup) {
            previous.cancel();
        }
        self.apply(OccurrenceEvent::Arm(at));
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(wakeup) = self.wakeup.take() {
            wakeup.cancel();
        }
        self.apply(OccurrenceEvent::Cancel);
    }

    fn apply(&mut self, event: OccurrenceEvent) {
        self.state = transition(&self.time, self.state, event);
    }
}
