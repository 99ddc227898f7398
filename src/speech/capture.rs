use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::call::EventSink;

/// One recognition hypothesis from the speech-to-text capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Most recent hypothesis for the utterance being recognized
    pub text: String,

    /// Whether the recognizer considers this hypothesis stable
    pub is_final: bool,

    /// When this segment was received
    pub received_at: DateTime<Utc>,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, is_final: bool) -> Self {
        Self {
            text: text.into(),
            is_final,
            received_at: Utc::now(),
        }
    }
}

/// Continuous speech-to-text capability
///
/// Implementations:
/// - NATS: transcripts published by an external STT service
/// - Console: lines typed on stdin, each one a final segment
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Begin continuous recognition
    ///
    /// Every hypothesis is posted through `events` as a segment. If recognition
    /// stops on its own (device error, provider timeout, end of input) the
    /// recognizer posts `capture_ended`. A call to `stop` must not post it;
    /// `SpeechCapture` reports voluntary stops itself.
    async fn start(&mut self, events: EventSink) -> Result<()>;

    /// Stop recognition
    async fn stop(&mut self) -> Result<()>;

    /// Check if recognition is currently running
    fn is_listening(&self) -> bool;

    /// Get recognizer name for logging
    fn name(&self) -> &str;
}

/// Supervised lifecycle around a `SpeechRecognizer`
///
/// Restarts the recognizer after an unexpected drop while a call wants
/// capture, bounded by a budget of consecutive restarts. Any segment resets
/// the budget. A restart that fails is logged and not retried.
pub struct SpeechCapture {
    recognizer: Box<dyn SpeechRecognizer>,
    events: EventSink,
    max_restarts: u32,
    restarts: u32,

    /// Capture is wanted by the current call
    wanted: bool,
}

impl SpeechCapture {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>, events: EventSink, max_restarts: u32) -> Self {
        Self {
            recognizer,
            events,
            max_restarts,
            restarts: 0,
            wanted: false,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        info!("Starting speech capture ({})", self.recognizer.name());

        self.wanted = true;
        self.restarts = 0;

        if self.recognizer.is_listening() {
            debug!("Recognizer already listening");
            return Ok(());
        }

        if let Err(e) = self.recognizer.start(self.events.clone()).await {
            self.wanted = false;
            return Err(e);
        }

        Ok(())
    }

    /// Stop listening and suppress restarts. Reports `CaptureEnded` once.
    pub async fn stop(&mut self) {
        if !self.wanted {
            debug!("Speech capture not active");
            return;
        }

        info!("Stopping speech capture ({})", self.recognizer.name());
        self.wanted = false;

        if let Err(e) = self.recognizer.stop().await {
            warn!("Failed to stop recognizer: {}", e);
        }

        self.events.capture_ended();
    }

    /// Restart after an unexpected drop. Returns whether the recognizer is running.
    pub async fn restart(&mut self) -> bool {
        if !self.wanted {
            debug!("Capture not wanted, skipping restart");
            return false;
        }

        if self.recognizer.is_listening() {
            return true;
        }

        if self.restarts >= self.max_restarts {
            warn!(
                "Speech capture dropped {} times in a row, giving up on restarts",
                self.restarts
            );
            return false;
        }

        self.restarts += 1;
        info!(
            "Restarting speech capture (attempt {}/{})",
            self.restarts, self.max_restarts
        );

        match self.recognizer.start(self.events.clone()).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Speech capture restart failed: {}", e);
                false
            }
        }
    }

    /// Recognizer is producing output again
    pub fn note_segment(&mut self) {
        self.restarts = 0;
    }

    pub fn is_wanted(&self) -> bool {
        self.wanted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::CallEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Recognizer that drops immediately and optionally refuses to start
    struct FlakyRecognizer {
        starts: Arc<AtomicUsize>,
        fail_after: usize,
    }

    #[async_trait::async_trait]
    impl SpeechRecognizer for FlakyRecognizer {
        async fn start(&mut self, _events: EventSink) -> Result<()> {
            let n = self.starts.fetch_add(1, Ordering::SeqCst);
            if n >= self.fail_after {
                anyhow::bail!("device busy");
            }
            Ok(())
        }

        async fn stop(&mut self) -> Result<()> {
            Ok(())
        }

        fn is_listening(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn capture(fail_after: usize, max_restarts: u32) -> (SpeechCapture, Arc<AtomicUsize>, tokio::sync::mpsc::UnboundedReceiver<CallEvent>) {
        let starts = Arc::new(AtomicUsize::new(0));
        let (events, rx) = EventSink::channel();
        let recognizer = FlakyRecognizer {
            starts: Arc::clone(&starts),
            fail_after,
        };
        (SpeechCapture::new(Box::new(recognizer), events, max_restarts), starts, rx)
    }

    #[tokio::test]
    async fn test_restart_budget_is_bounded() {
        let (mut capture, starts, _rx) = capture(usize::MAX, 2);
        capture.start().await.unwrap();

        assert!(capture.restart().await);
        assert!(capture.restart().await);
        assert!(!capture.restart().await);
        assert_eq!(starts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_segment_resets_budget() {
        let (mut capture, starts, _rx) = capture(usize::MAX, 1);
        capture.start().await.unwrap();

        assert!(capture.restart().await);
        capture.note_segment();
        assert!(capture.restart().await);
        assert_eq!(starts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_restart_is_swallowed() {
        let (mut capture, starts, _rx) = capture(1, 3);
        capture.start().await.unwrap();

        assert!(!capture.restart().await);
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert!(capture.is_wanted());
    }

    #[tokio::test]
    async fn test_no_restart_after_stop() {
        let (mut capture, starts, mut rx) = capture(usize::MAX, 3);
        capture.start().await.unwrap();
        capture.stop().await;

        assert!(matches!(rx.try_recv(), Ok(CallEvent::CaptureEnded)));
        assert!(!capture.restart().await);
        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_twice_reports_once() {
        let (mut capture, _starts, mut rx) = capture(usize::MAX, 3);
        capture.start().await.unwrap();
        capture.stop().await;
        capture.stop().await;

        assert!(matches!(rx.try_recv(), Ok(CallEvent::CaptureEnded)));
        assert!(rx.try_recv().is_err());
    }
}
