// Scripted capabilities for driving the orchestrator without audio or network
#![allow(dead_code)]

use anyhow::Result;
use loqa_caller::{
    CallConfig, CallError, CallHandle, CallOrchestrator, CallSnapshot, DialogueClient,
    DialogueReply, EventSink, SpeechRecognizer, SpeechRequest, SpeechSynthesizer, StartReply,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const OPENING: &str =
    "Hi, this is Ash calling briefly about cloud cost optimization. Am I speaking with the business owner?";

// ============================================================================
// Microphone
// ============================================================================

#[derive(Default)]
pub struct MicState {
    pub events: Option<EventSink>,
    pub listening: bool,
    pub starts: usize,
    pub stops: usize,
    pub start_error: Option<String>,
}

/// Test side of the scripted recognizer
#[derive(Clone, Default)]
pub struct Mic {
    pub state: Arc<Mutex<MicState>>,
}

impl Mic {
    pub fn say(&self, text: &str, is_final: bool) {
        let state = self.state.lock().unwrap();
        let events = state.events.as_ref().expect("capture was never started");
        events.segment(text, is_final);
    }

    /// Simulate the device dropping out
    pub fn drop_capture(&self) {
        let mut state = self.state.lock().unwrap();
        state.listening = false;
        if let Some(events) = &state.events {
            events.capture_ended();
        }
    }

    /// Make every later start fail, e.g. no input device
    pub fn fail_starts(&self, reason: &str) {
        self.state.lock().unwrap().start_error = Some(reason.to_string());
    }

    pub fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }
}

pub struct ScriptedRecognizer {
    mic: Mic,
}

#[async_trait::async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn start(&mut self, events: EventSink) -> Result<()> {
        let mut state = self.mic.state.lock().unwrap();
        state.starts += 1;
        if let Some(reason) = &state.start_error {
            anyhow::bail!("{}", reason);
        }
        state.listening = true;
        state.events = Some(events);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let mut state = self.mic.state.lock().unwrap();
        state.stops += 1;
        state.listening = false;
        Ok(())
    }

    fn is_listening(&self) -> bool {
        self.mic.state.lock().unwrap().listening
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Speaker
// ============================================================================

#[derive(Default)]
pub struct SpeakerState {
    pub spoken: Vec<String>,
    pub cancels: usize,
    pub current: Option<u64>,
    pub events: Option<EventSink>,
}

/// Test side of the scripted synthesizer
#[derive(Clone, Default)]
pub struct Speaker {
    pub state: Arc<Mutex<SpeakerState>>,
}

impl Speaker {
    pub fn spoken(&self) -> Vec<String> {
        self.state.lock().unwrap().spoken.clone()
    }

    pub fn cancels(&self) -> usize {
        self.state.lock().unwrap().cancels
    }

    /// Finish the current utterance
    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        if let (Some(id), Some(events)) = (state.current.take(), &state.events) {
            events.speech_ended(id);
        }
    }
}

/// Starts speaking immediately and keeps speaking until cancelled or finished
pub struct ScriptedSynthesizer {
    speaker: Speaker,
}

#[async_trait::async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn speak(&mut self, request: SpeechRequest, events: EventSink) -> Result<()> {
        let mut state = self.speaker.state.lock().unwrap();
        state.spoken.push(request.text.clone());
        state.current = Some(request.id);
        events.speech_started(request.id);
        state.events = Some(events);
        Ok(())
    }

    async fn cancel(&mut self) -> Result<()> {
        let mut state = self.speaker.state.lock().unwrap();
        state.cancels += 1;
        state.current = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Dialogue service
// ============================================================================

pub struct ScriptedDialogue {
    start: Mutex<VecDeque<Result<StartReply, CallError>>>,
    turns: Mutex<VecDeque<Result<DialogueReply, CallError>>>,
    sent: Mutex<Vec<(String, Instant)>>,
    start_requests: Mutex<usize>,
    turn_delay: Duration,
}

impl ScriptedDialogue {
    pub fn new() -> Self {
        Self {
            start: Mutex::new(VecDeque::new()),
            turns: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            start_requests: Mutex::new(0),
            turn_delay: Duration::ZERO,
        }
    }

    pub fn start_reply(self, result: Result<StartReply, CallError>) -> Self {
        self.start.lock().unwrap().push_back(result);
        self
    }

    pub fn turn(self, result: Result<DialogueReply, CallError>) -> Self {
        self.turns.lock().unwrap().push_back(result);
        self
    }

    pub fn turn_delay(mut self, delay: Duration) -> Self {
        self.turn_delay = delay;
        self
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn start_requests(&self) -> usize {
        *self.start_requests.lock().unwrap()
    }

    pub fn sent_at(&self) -> Vec<Instant> {
        self.sent.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait::async_trait]
impl DialogueClient for ScriptedDialogue {
    async fn call_start(&self) -> Result<StartReply, CallError> {
        *self.start_requests.lock().unwrap() += 1;
        let scripted = self.start.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(StartReply {
                reply: OPENING.to_string(),
            })
        })
    }

    async fn send_turn(&self, text: &str) -> Result<DialogueReply, CallError> {
        self.sent
            .lock()
            .unwrap()
            .push((text.to_string(), Instant::now()));

        if !self.turn_delay.is_zero() {
            tokio::time::sleep(self.turn_delay).await;
        }

        let scripted = self.turns.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(DialogueReply::reply("Go on.")))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub call: CallHandle,
    pub mic: Mic,
    pub speaker: Speaker,
    pub dialogue: Arc<ScriptedDialogue>,
    pub task: JoinHandle<()>,
}

pub fn harness(dialogue: ScriptedDialogue) -> Harness {
    let mic = Mic::default();
    let speaker = Speaker::default();
    let dialogue = Arc::new(dialogue);

    let (call, task) = CallOrchestrator::spawn(
        CallConfig::default(),
        Box::new(ScriptedRecognizer { mic: mic.clone() }),
        Box::new(ScriptedSynthesizer {
            speaker: speaker.clone(),
        }),
        dialogue.clone(),
    );

    Harness {
        call,
        mic,
        speaker,
        dialogue,
        task,
    }
}

/// Wait until a published snapshot satisfies `predicate`
pub async fn wait_for(
    call: &CallHandle,
    predicate: impl FnMut(&CallSnapshot) -> bool,
) -> Result<CallSnapshot> {
    let mut rx = call.watch();
    let snapshot = tokio::time::timeout(Duration::from_secs(30), rx.wait_for(predicate))
        .await??
        .clone();
    Ok(snapshot)
}

/// Let the orchestrator drain its inbox
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
