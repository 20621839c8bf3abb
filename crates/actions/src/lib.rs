//! Action handlers invoked by the conversational agent.
//!
//! Each handler is a straight line: extract parameters from the action
//! event, perform one collaborator call, wrap the payload in the fixed
//! response envelope. Collaborators sit behind traits so handlers stay
//! testable without cloud access:
//!
//! - [`CreateDeck`] - parse topic/content into a deck, serialize it to
//!   PPTX, upload, answer with a presigned link
//! - [`SendMail`] - publish a notification carrying the link
//! - [`SearchWeb`] - run a web search and answer with a text summary
//!
//! The [`ActionRegistry`] routes an incoming event to its handler by the
//! event's `function` field.

pub mod create_deck;
pub mod notify;
pub mod registry;
pub mod search;
pub mod search_web;
pub mod send_mail;
pub mod storage;

pub use create_deck::CreateDeck;
pub use notify::{Notifier, SnsNotifier};
pub use registry::{ActionHandler, ActionRegistry};
pub use search::{DuckDuckGoClient, SearchHit, SearchProvider};
pub use search_web::SearchWeb;
pub use send_mail::SendMail;
pub use storage::{ObjectStore, S3ObjectStore};
