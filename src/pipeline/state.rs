//! Shared types threaded through the pipeline.

use serde::{Deserialize, Serialize};

use crate::email::EmailMessage;

// ── Intent ──────────────────────────────────────────────────────────

/// Classified intent of an inbound email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Complaint,
    Request,
    Feedback,
    Inquiry,
}

impl Intent {
    /// Wire/log label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complaint => "complaint",
            Self::Request => "request",
            Self::Feedback => "feedback",
            Self::Inquiry => "inquiry",
        }
    }

    /// Parse a classification label, case-insensitively.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "complaint" => Some(Self::Complaint),
            "request" => Some(Self::Request),
            "feedback" => Some(Self::Feedback),
            "inquiry" => Some(Self::Inquiry),
            _ => None,
        }
    }

    /// Steering tone for the reply prompt. Fixed lookup table — the label is
    /// passed to the LLM as an instruction, not derived by local logic.
    pub fn reply_tone(&self) -> &'static str {
        match self {
            Self::Complaint => "empathetic and solution-oriented",
            Self::Request => "helpful and efficient",
            Self::Feedback => "appreciative and engaging",
            Self::Inquiry => "informative and clear",
        }
    }
}

// ── Step results ────────────────────────────────────────────────────

/// Result of the classification step.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: Intent,
    /// Free-text tone label (e.g. "frustrated", "neutral", "angry").
    pub tone: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
}

impl Classification {
    /// Safe default when the external call fails or is unparsable: treat the
    /// email as an inquiry with zero confidence, so complaints mis-read as
    /// something else still land on the cautious side downstream.
    pub fn fallback() -> Self {
        Self {
            intent: Intent::Inquiry,
            tone: "neutral".to_string(),
            confidence: 0.0,
        }
    }
}

/// A drafted reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyDraft {
    pub subject: String,
    pub body: String,
}

// ── Processing state ────────────────────────────────────────────────

/// The accumulator threaded through the pipeline for one email.
///
/// Created at pipeline start, filled field by field, consumed into the
/// final output, then discarded — only the derived `InteractionRecord`
/// persists. `escalate` stays `None` until the decision step runs.
#[derive(Debug, Clone)]
pub struct ProcessingState {
    pub email: EmailMessage,
    pub classification: Option<Classification>,
    pub summary: Option<String>,
    pub memory_context: Option<String>,
    pub reply: Option<ReplyDraft>,
    /// Set by the reply step when its fallback template was used; forces
    /// escalation regardless of the decision rule.
    pub reply_fallback_used: bool,
    pub escalate: Option<bool>,
}

impl ProcessingState {
    pub fn new(email: EmailMessage) -> Self {
        Self {
            email,
            classification: None,
            summary: None,
            memory_context: None,
            reply: None,
            reply_fallback_used: false,
            escalate: None,
        }
    }
}
