//! HTTP control surface for the call
//!
//! - POST /call/start - Place a call (409 while one is in progress)
//! - POST /call/stop - Tear down the current call
//! - GET /call - Status, last heard text and outcome
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
