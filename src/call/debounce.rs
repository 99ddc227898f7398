use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use super::event::{CallEvent, EventSink};

/// Timer driver for pending turns
///
/// Holds at most one timer. Scheduling a new turn aborts the previous timer
/// before starting the next one, so a burst of final transcripts produces a
/// single `DebounceFired` once the line has been quiet for `window`. A timer
/// that already fired before being aborted is filtered out by the machine
/// through its generation number.
pub struct TurnDebouncer {
    window: Duration,
    events: EventSink,
    timer: Option<JoinHandle<()>>,
}

impl TurnDebouncer {
    pub fn new(window: Duration, events: EventSink) -> Self {
        Self {
            window,
            events,
            timer: None,
        }
    }

    /// Cancel any pending timer and start a new one for `text`
    pub fn schedule(&mut self, call_id: Uuid, generation: u64, text: String) {
        self.cancel();

        let events = self.events.clone();
        let window = self.window;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            events.send(CallEvent::DebounceFired {
                call_id,
                generation,
                text,
            });
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            if !timer.is_finished() {
                debug!("Cancelling pending turn timer");
            }
            timer.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for TurnDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
