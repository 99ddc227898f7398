use anyhow::{bail, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::CallConfig;
use super::debounce::TurnDebouncer;
use super::event::{CallEvent, EventSink};
use super::machine::{CallMachine, Effect};
use super::state::CallSnapshot;
use crate::dialogue::DialogueClient;
use crate::error::CallError;
use crate::speech::{SpeechCapture, SpeechPlayback, SpeechRecognizer, SpeechSynthesizer};

/// Drives a `CallMachine` against real capabilities
///
/// Runs as a single task: events are handled one at a time, and each
/// event's effects are applied before the next event is read, so call
/// state never changes underneath a handler. Network round trips run in
/// their own tasks and report back through the inbox.
pub struct CallOrchestrator {
    machine: CallMachine,
    capture: SpeechCapture,
    playback: SpeechPlayback,
    dialogue: Arc<dyn DialogueClient>,
    debouncer: TurnDebouncer,
    events: EventSink,
    inbox: mpsc::UnboundedReceiver<CallEvent>,
    snapshot_tx: watch::Sender<CallSnapshot>,
}

impl CallOrchestrator {
    /// Spawn the orchestrator task and return a handle to control it
    pub fn spawn(
        config: CallConfig,
        recognizer: Box<dyn SpeechRecognizer>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        dialogue: Arc<dyn DialogueClient>,
    ) -> (CallHandle, JoinHandle<()>) {
        let (events, inbox) = EventSink::channel();
        let machine = CallMachine::new(config.clone());
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());

        let orchestrator = Self {
            capture: SpeechCapture::new(recognizer, events.clone(), config.max_capture_restarts),
            playback: SpeechPlayback::new(synthesizer, events.clone()),
            debouncer: TurnDebouncer::new(config.debounce_window(), events.clone()),
            machine,
            dialogue,
            events: events.clone(),
            inbox,
            snapshot_tx,
        };

        let task = tokio::spawn(orchestrator.run());

        (
            CallHandle {
                events,
                snapshot: snapshot_rx,
            },
            task,
        )
    }

    async fn run(mut self) {
        info!("Call orchestrator started");

        while let Some(event) = self.inbox.recv().await {
            let shutdown = matches!(event, CallEvent::Shutdown);

            if matches!(event, CallEvent::Segment(_)) {
                self.capture.note_segment();
            }

            self.dispatch(event).await;

            self.snapshot_tx.send_replace(self.machine.snapshot());

            if shutdown {
                break;
            }
        }

        self.debouncer.cancel();
        self.playback.cancel_all().await;
        self.capture.stop().await;

        info!("Call orchestrator stopped");
    }

    /// Handle one event and apply its effects in order
    ///
    /// An effect that fails with a follow-up event abandons the rest of the
    /// transition, and the follow-up is handled before the next inbox event.
    async fn dispatch(&mut self, event: CallEvent) {
        let mut next = Some(event);

        while let Some(event) = next.take() {
            for effect in self.machine.handle(event) {
                if let Some(followup) = self.apply(effect).await {
                    next = Some(followup);
                    break;
                }
            }
        }
    }

    async fn apply(&mut self, effect: Effect) -> Option<CallEvent> {
        debug!("Applying {:?}", effect);

        match effect {
            Effect::StartCapture { call_id } => {
                if let Err(e) = self.capture.start().await {
                    return Some(CallEvent::CaptureFailed {
                        call_id,
                        error: CallError::Capture(format!("{:#}", e)),
                    });
                }
            }

            Effect::StopCapture => self.capture.stop().await,

            Effect::RestartCapture => {
                self.capture.restart().await;
            }

            Effect::RequestStart { call_id } => {
                let dialogue = Arc::clone(&self.dialogue);
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = dialogue.call_start().await;
                    events.send(CallEvent::CallStarted { call_id, result });
                });
            }

            Effect::SendTurn { call_id, utterance } => {
                let dialogue = Arc::clone(&self.dialogue);
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = dialogue.send_turn(utterance.as_str()).await;
                    if let Err(e) = &result {
                        warn!("Dialogue turn failed: {}", e);
                    }
                    events.send(CallEvent::TurnReplied { call_id, result });
                });
            }

            Effect::Speak(request) => self.playback.speak(request).await,

            Effect::CancelSpeech => self.playback.cancel_all().await,

            Effect::ScheduleTurn {
                call_id,
                generation,
                text,
            } => self.debouncer.schedule(call_id, generation, text),

            Effect::CancelTurn => self.debouncer.cancel(),
        }

        None
    }
}

/// Control handle for a running orchestrator
#[derive(Clone)]
pub struct CallHandle {
    events: EventSink,
    snapshot: watch::Receiver<CallSnapshot>,
}

impl CallHandle {
    /// Handle for a host whose speech capabilities could not be created
    ///
    /// No orchestrator runs behind it: the snapshot reports the error and
    /// every start request is refused.
    pub fn unavailable(config: CallConfig, error: CallError) -> Self {
        let (events, _) = EventSink::channel();
        let (_, snapshot) = watch::channel(CallMachine::unavailable(config, error).snapshot());

        Self { events, snapshot }
    }

    /// Place a new call; rejected while one is in progress
    pub fn start_call(&self) -> Result<()> {
        let snapshot = self.snapshot();
        if snapshot.is_active {
            bail!("A call is already in progress");
        }

        if !snapshot.can_start {
            bail!(
                "Calls are unavailable: {}",
                snapshot.last_error.unwrap_or_default()
            );
        }

        if !self.events.send(CallEvent::StartRequested) {
            bail!("Call orchestrator is not running");
        }

        Ok(())
    }

    /// Tear down the current call; no-op when no call is active
    pub fn stop_call(&self) -> Result<()> {
        if !self.events.send(CallEvent::StopRequested) {
            bail!("Call orchestrator is not running");
        }

        Ok(())
    }

    pub fn shutdown(&self) {
        self.events.send(CallEvent::Shutdown);
    }

    pub fn snapshot(&self) -> CallSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    pub fn watch(&self) -> watch::Receiver<CallSnapshot> {
        self.snapshot.clone()
    }

    /// Sender for feeding events from outside, e.g. a custom capability
    pub fn events(&self) -> EventSink {
        self.events.clone()
    }
}
