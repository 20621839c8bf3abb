//! Chat front-end for the deck-building agent.
//!
//! This crate turns the agent's completion stream into a terminal
//! transcript:
//! - **Trace model** (`trace`) - typed view of completion events (answer
//!   chunks and orchestration trace snapshots) decoded from loosely-typed
//!   JSON
//! - **Rendering** (`render`) - pattern-matches trace event shapes into
//!   labeled display blocks
//! - **Session** (`session`) - session id, role-tagged history, last prompt
//! - **Gateway** (`gateway`) - `AgentGateway` trait plus the HTTP and no-op
//!   implementations
//! - **Runner** (`runner`) - the prompt loop wiring the pieces together
//!
//! # Architecture
//!
//! ```text
//! stdin prompt → AgentGateway → CompletionEvent* → TraceRenderer → blocks
//!                     ↓
//!               ChatSession transcript
//! ```
//!
//! Gateway failures surface as non-fatal notices; the session transcript is
//! never corrupted by a failed attempt, so retrying is always safe.

pub mod gateway;
pub mod render;
pub mod runner;
pub mod session;
pub mod trace;

pub use gateway::{AgentGateway, GatewayError, HttpAgentGateway, NoopAgentGateway};
pub use render::{DisplayBlock, TraceRenderer};
pub use runner::ChatRunner;
pub use session::{ChatMessage, ChatSession, Role};
pub use trace::CompletionEvent;
