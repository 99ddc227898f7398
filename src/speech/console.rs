//! Terminal-backed speech capabilities
//!
//! Stand-ins for a real microphone and speaker: typed lines are treated as
//! final transcripts and replies are printed with a simulated speaking
//! duration, so barge-in can still be exercised by typing over a reply.

use anyhow::{bail, Result};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::capture::SpeechRecognizer;
use super::playback::{SpeechRequest, SpeechSynthesizer};
use crate::call::EventSink;

/// Approximate time to speak one word at rate 1.0
const WORD_DURATION_MS: u64 = 350;

type LineSource = Box<dyn AsyncBufRead + Unpin + Send>;

/// Reads stdin lines as final segments
///
/// One reader task owns stdin for the life of the recognizer; start and stop
/// only switch where its lines are forwarded. Lines typed while stopped are
/// dropped.
pub struct StdinRecognizer {
    /// Taken when the reader task is spawned on first start
    source: Mutex<Option<LineSource>>,
    target: watch::Sender<Option<EventSink>>,
    reader: Option<JoinHandle<()>>,
}

impl StdinRecognizer {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    pub fn from_reader(reader: impl AsyncBufRead + Unpin + Send + 'static) -> Self {
        let (target, _) = watch::channel(None);
        Self {
            source: Mutex::new(Some(Box::new(reader))),
            target,
            reader: None,
        }
    }

    fn spawn_reader(
        source: LineSource,
        target: watch::Receiver<Option<EventSink>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut lines = source.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let text = line.trim();
                        if text.is_empty() {
                            continue;
                        }
                        match target.borrow().as_ref() {
                            Some(events) => {
                                events.segment(text, true);
                            }
                            None => debug!("Not listening, dropping input: {:?}", text),
                        }
                    }
                    Ok(None) => {
                        info!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        debug!("stdin read failed: {}", e);
                        break;
                    }
                }
            }

            if let Some(events) = target.borrow().as_ref() {
                events.capture_ended();
            }
        })
    }

    fn reader_closed(&self) -> bool {
        self.reader.as_ref().is_some_and(|r| r.is_finished())
    }
}

impl Default for StdinRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for StdinRecognizer {
    async fn start(&mut self, events: EventSink) -> Result<()> {
        if self.reader_closed() {
            bail!("stdin is closed");
        }

        info!("Listening on stdin (one line per utterance)");
        self.target.send_replace(Some(events));

        if self.reader.is_none() {
            let source = self.source.get_mut().ok().and_then(Option::take);
            let Some(source) = source else {
                bail!("stdin reader unavailable");
            };
            self.reader = Some(Self::spawn_reader(source, self.target.subscribe()));
        }

        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.target.send_replace(None);
        Ok(())
    }

    fn is_listening(&self) -> bool {
        self.target.borrow().is_some() && !self.reader_closed()
    }

    fn name(&self) -> &str {
        "stdin"
    }
}

/// Prints replies and reports start/end after a simulated duration
pub struct ConsoleSynthesizer {
    task: Option<(u64, JoinHandle<()>)>,
    events: Option<EventSink>,
}

impl ConsoleSynthesizer {
    pub fn new() -> Self {
        Self {
            task: None,
            events: None,
        }
    }

    fn speaking_time(text: &str, rate: f32) -> Duration {
        let words = text.split_whitespace().count() as f64;
        let rate = if rate > 0.0 { rate as f64 } else { 1.0 };
        Duration::from_millis((words * WORD_DURATION_MS as f64 / rate) as u64)
    }
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    async fn speak(&mut self, request: SpeechRequest, events: EventSink) -> Result<()> {
        self.cancel().await?;

        println!("Agent: {}", request.text);

        let duration = Self::speaking_time(&request.text, request.rate);
        let id = request.id;
        let task_events = events.clone();

        events.speech_started(id);
        self.events = Some(events);
        self.task = Some((
            id,
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                task_events.speech_ended(id);
            }),
        ));

        Ok(())
    }

    async fn cancel(&mut self) -> Result<()> {
        if let Some((id, task)) = self.task.take() {
            if !task.is_finished() {
                task.abort();
                println!("Agent: [interrupted]");
                if let Some(events) = &self.events {
                    events.speech_ended(id);
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
