//! The email-triage pipeline.
//!
//! A fixed five-step sequence — classify → summarize → memory → reply →
//! decision — composed as plain sequential functions. No graph abstraction:
//! there are no branches, retries, or parallel paths to model.

pub mod classify;
pub mod decision;
pub mod driver;
mod parse;
pub mod reply;
pub mod state;
pub mod summarize;

pub use driver::EmailProcessor;
pub use state::{Classification, Intent, ProcessingState, ReplyDraft};
