//! Call orchestration
//!
//! This module ties the speech capabilities and the dialogue service into a
//! turn-taking call:
//! - `CallMachine`: pure state machine (`Idle → Connecting → Listening → Thinking → …`)
//! - `TurnDebouncer`: silence window before a final transcript is committed
//! - `CallOrchestrator`: single-task actor executing the machine's effects
//! - `CallHandle`: start/stop/observe a running orchestrator

mod config;
mod debounce;
mod event;
mod machine;
mod orchestrator;
mod state;

pub use config::CallConfig;
pub use debounce::TurnDebouncer;
pub use event::{CallEvent, EventSink};
pub use machine::{CallMachine, Effect};
pub use orchestrator::{CallHandle, CallOrchestrator};
pub use state::{CallSession, CallSnapshot, CallStatus, PendingTurn, Utterance};
