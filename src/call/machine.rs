//! Call state machine
//!
//! `CallMachine::handle` is a pure transition function: it takes one
//! `CallEvent`, updates the call state and returns the side effects the
//! orchestrator must perform. It never touches audio, timers or the network,
//! so every transition can be exercised without real capabilities.

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::CallConfig;
use super::event::CallEvent;
use super::state::{CallSession, CallSnapshot, CallStatus, PendingTurn, Utterance};
use crate::dialogue::{DialogueReply, StartReply};
use crate::error::CallError;
use crate::speech::{SpeechRequest, TranscriptSegment};

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartCapture { call_id: Uuid },
    StopCapture,
    RestartCapture,
    RequestStart { call_id: Uuid },
    SendTurn { call_id: Uuid, utterance: Utterance },
    Speak(SpeechRequest),
    CancelSpeech,
    ScheduleTurn {
        call_id: Uuid,
        generation: u64,
        text: String,
    },
    CancelTurn,
}

pub struct CallMachine {
    config: CallConfig,
    status: CallStatus,
    session: Option<CallSession>,

    /// Set by playback start, cleared by playback end or barge-in
    speaking: bool,

    /// Utterance the speaking flag refers to
    current_utterance: Option<u64>,
    next_utterance: u64,

    /// Monotonic across calls so a stale timer can never match
    next_generation: u64,

    last_heard: Option<String>,
    last_error: Option<String>,

    /// Speech capabilities could not be created; calls can never start
    unavailable: bool,
}

impl CallMachine {
    pub fn new(config: CallConfig) -> Self {
        Self {
            config,
            status: CallStatus::Idle,
            session: None,
            speaking: false,
            current_utterance: None,
            next_utterance: 0,
            next_generation: 0,
            last_heard: None,
            last_error: None,
            unavailable: false,
        }
    }

    /// Machine for a host without working speech capabilities
    pub fn unavailable(config: CallConfig, error: CallError) -> Self {
        Self {
            status: CallStatus::Error,
            last_error: Some(error.to_string()),
            unavailable: true,
            ..Self::new(config)
        }
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_active)
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn session(&self) -> Option<&CallSession> {
        self.session.as_ref()
    }

    pub fn snapshot(&self) -> CallSnapshot {
        let is_active = self.is_active();
        CallSnapshot {
            call_id: self.session.as_ref().map(|s| s.call_id),
            status: self.status,
            is_active,
            can_start: !is_active && !self.unavailable,
            speaking: self.speaking,
            last_heard: self.last_heard.clone(),
            outcome: self.session.as_ref().and_then(|s| s.outcome.clone()),
            last_error: self.last_error.clone(),
            turns: self.session.as_ref().map_or(0, |s| s.turns),
            started_at: self.session.as_ref().map(|s| s.started_at),
        }
    }

    /// Apply one event and return the effects to execute, in order
    pub fn handle(&mut self, event: CallEvent) -> Vec<Effect> {
        let from = self.status;

        let effects = match event {
            CallEvent::StartRequested => self.on_start_requested(),
            CallEvent::StopRequested => self.on_stop_requested(),
            CallEvent::CallStarted { call_id, result } => self.on_call_started(call_id, result),
            CallEvent::CaptureFailed { call_id, error } => self.on_capture_failed(call_id, error),
            CallEvent::Segment(segment) => self.on_segment(segment),
            CallEvent::DebounceFired {
                call_id,
                generation,
                text,
            } => self.on_debounce_fired(call_id, generation, text),
            CallEvent::TurnReplied { call_id, result } => self.on_turn_replied(call_id, result),
            CallEvent::SpeechStarted { utterance } => {
                if self.current_utterance == Some(utterance) {
                    self.speaking = true;
                }
                Vec::new()
            }
            CallEvent::SpeechEnded { utterance } => {
                if self.current_utterance == Some(utterance) {
                    self.speaking = false;
                    self.current_utterance = None;
                }
                Vec::new()
            }
            CallEvent::CaptureEnded => self.on_capture_ended(),
            CallEvent::Shutdown => self.on_stop_requested(),
        };

        if from != self.status {
            info!(from = %from, to = %self.status, "Call status changed");
        }

        effects
    }

    fn on_start_requested(&mut self) -> Vec<Effect> {
        if self.unavailable {
            warn!("Speech capabilities unavailable, ignoring start request");
            return Vec::new();
        }

        if self.is_active() {
            warn!("Call already in progress, ignoring start request");
            return Vec::new();
        }

        let session = CallSession::new();
        let call_id = session.call_id;
        info!("Starting call {}", call_id);

        self.session = Some(session);
        self.status = CallStatus::Connecting;
        self.last_heard = None;
        self.last_error = None;

        vec![
            Effect::StartCapture { call_id },
            Effect::RequestStart { call_id },
        ]
    }

    fn on_stop_requested(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.as_mut().filter(|s| s.is_active) else {
            debug!("No active call to stop");
            return Vec::new();
        };

        info!("Stopping call {}", session.call_id);
        session.is_active = false;
        session.pending = None;
        session.turn_in_flight = false;

        // Status drops to Idle once capture reports it has ended
        let mut effects = vec![Effect::CancelTurn];
        effects.extend(self.cancel_speech());
        effects.push(Effect::StopCapture);
        effects
    }

    fn on_call_started(&mut self, call_id: Uuid, result: Result<StartReply, CallError>) -> Vec<Effect> {
        if !self.is_current(call_id) || self.status != CallStatus::Connecting {
            debug!("Discarding start reply for call {}", call_id);
            return Vec::new();
        }

        match result {
            Ok(reply) => {
                self.status = CallStatus::Listening;
                self.speak(reply.reply).into_iter().collect()
            }
            Err(e) => {
                warn!("Call start failed: {}", e);
                self.fail(e)
            }
        }
    }

    fn on_capture_failed(&mut self, call_id: Uuid, error: CallError) -> Vec<Effect> {
        if !self.is_current(call_id) {
            return Vec::new();
        }

        warn!("Speech capture failed to start: {}", error);
        self.fail(error)
    }

    fn on_segment(&mut self, segment: TranscriptSegment) -> Vec<Effect> {
        let mut effects = Vec::new();

        if self.speaking {
            info!("Barge-in: user spoke over playback, cancelling speech");
            effects.extend(self.cancel_speech());
        }

        let active_call = self
            .session
            .as_ref()
            .filter(|s| s.is_active)
            .map(|s| s.call_id);

        let Some(call_id) = active_call else {
            return effects;
        };

        self.last_heard = Some(segment.text.clone());

        if segment.is_final {
            let generation = self.next_generation;
            self.next_generation += 1;

            if let Some(session) = self.session.as_mut() {
                session.pending = Some(PendingTurn {
                    generation,
                    text: segment.text.clone(),
                });
            }

            effects.push(Effect::ScheduleTurn {
                call_id,
                generation,
                text: segment.text,
            });
        }

        effects
    }

    fn on_debounce_fired(&mut self, call_id: Uuid, generation: u64, text: String) -> Vec<Effect> {
        let status = self.status;
        let Some(session) = self.session.as_mut().filter(|s| s.call_id == call_id) else {
            return Vec::new();
        };

        let current = session
            .pending
            .as_ref()
            .is_some_and(|p| p.generation == generation);
        if !current {
            debug!("Ignoring superseded turn (generation {})", generation);
            return Vec::new();
        }
        session.pending = None;

        if !session.is_active {
            return Vec::new();
        }

        if status != CallStatus::Listening || session.turn_in_flight {
            debug!("Dropping turn committed while {}: {:?}", status, text);
            return Vec::new();
        }

        session.turn_in_flight = true;
        session.turns += 1;
        self.status = CallStatus::Thinking;

        info!("Committing turn: {:?}", text);
        vec![Effect::SendTurn {
            call_id,
            utterance: Utterance::new(text),
        }]
    }

    fn on_turn_replied(&mut self, call_id: Uuid, result: Result<DialogueReply, CallError>) -> Vec<Effect> {
        let status = self.status;
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.call_id == call_id && s.is_active)
        else {
            debug!("Discarding turn reply for inactive call {}", call_id);
            return Vec::new();
        };

        if status != CallStatus::Thinking {
            debug!("Discarding turn reply received while {}", status);
            return Vec::new();
        }

        session.turn_in_flight = false;

        match result {
            Ok(reply) if reply.end => {
                info!("Dialogue service ended call {}", call_id);
                session.is_active = false;
                session.pending = None;
                session.outcome = reply.final_outcome;
                self.status = CallStatus::CallEnded;

                let closing = self.config.closing_line.clone();
                let mut effects = vec![Effect::CancelTurn, Effect::StopCapture];
                effects.extend(self.speak(closing));
                effects
            }
            Ok(reply) => {
                self.status = CallStatus::Listening;
                self.speak(reply.reply).into_iter().collect()
            }
            Err(e) => {
                warn!("Turn failed, back to listening: {}", e);
                self.last_error = Some(e.to_string());
                self.status = CallStatus::Listening;
                Vec::new()
            }
        }
    }

    fn on_capture_ended(&mut self) -> Vec<Effect> {
        if self.is_active() {
            return vec![Effect::RestartCapture];
        }

        if self.status.is_in_call() {
            self.status = CallStatus::Idle;
        }

        Vec::new()
    }

    /// Call start failure: session inactive, surfaced as Error
    fn fail(&mut self, error: CallError) -> Vec<Effect> {
        if let Some(session) = self.session.as_mut() {
            session.is_active = false;
            session.pending = None;
            session.turn_in_flight = false;
        }
        self.status = CallStatus::Error;
        self.last_error = Some(error.to_string());

        vec![Effect::CancelTurn, Effect::StopCapture]
    }

    fn is_current(&self, call_id: Uuid) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.call_id == call_id && s.is_active)
    }

    fn speak(&mut self, text: String) -> Option<Effect> {
        if text.trim().is_empty() {
            return None;
        }

        let id = self.next_utterance;
        self.next_utterance += 1;

        // The previous utterance is cancelled by playback before this one starts
        self.speaking = false;
        self.current_utterance = Some(id);

        Some(Effect::Speak(SpeechRequest {
            id,
            text,
            rate: self.config.speech_rate,
        }))
    }

    // Also cancels an utterance that was requested but has not started yet
    fn cancel_speech(&mut self) -> Option<Effect> {
        let was_playing = self.speaking || self.current_utterance.is_some();
        self.speaking = false;
        self.current_utterance = None;
        was_playing.then_some(Effect::CancelSpeech)
    }
}
