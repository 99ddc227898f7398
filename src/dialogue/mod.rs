//! Client for the remote dialogue service
//!
//! - POST /start            → { reply }
//! - POST /next { text }    → { reply, end, final? }

mod client;
mod messages;

pub use client::{DialogueClient, HttpDialogueClient};
pub use messages::{DialogueReply, StartReply, TurnRequest};
