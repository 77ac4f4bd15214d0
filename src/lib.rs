//! Mail Triage — linear email-triage pipeline.
//!
//! Classify → summarize → recall memory → draft reply → escalation decision,
//! each LLM-backed step behind a narrow provider trait with a documented
//! fallback so a single bad response never aborts the pipeline.

pub mod config;
pub mod email;
pub mod error;
pub mod llm;
pub mod memory;
pub mod pipeline;
