//! Email input/output shapes and pre-pipeline validation.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::pipeline::state::Intent;

/// An inbound email. Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Sender address.
    pub from: String,
    /// Recipient address (the mailbox being triaged). Optional on input.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Message body.
    pub body: String,
}

impl EmailMessage {
    /// Validate required fields before the email enters the pipeline.
    ///
    /// Malformed input is the one fatal condition for a single email —
    /// everything downstream recovers via fallbacks.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.from.trim().is_empty() {
            return Err(PipelineError::MissingField("from"));
        }
        if self.body.trim().is_empty() {
            return Err(PipelineError::MissingField("body"));
        }
        Ok(())
    }
}

/// Final output of the triage pipeline for one email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageOutput {
    /// Reply subject.
    pub subject: String,
    /// Reply body.
    pub body: String,
    /// Reply recipient (the original sender).
    pub to: String,
    /// Reply sender (the triaged mailbox).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,
    /// Classified intent.
    pub intent: Intent,
    /// Whether a human should take over.
    pub escalate: bool,
    /// Classification confidence in [0, 1].
    pub confidence: f32,
    /// 2–3 sentence summary of the inbound email.
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_minimal_input() {
        let email: EmailMessage = serde_json::from_str(
            r#"{"from": "customer@example.com", "subject": "Payment failed", "body": "Hi, my payment isn't working..."}"#,
        )
        .unwrap();
        assert!(email.validate().is_ok());
        assert!(email.to.is_empty());
    }

    #[test]
    fn validate_rejects_missing_from() {
        let email = EmailMessage {
            from: "  ".into(),
            to: String::new(),
            subject: "Hello".into(),
            body: "content".into(),
        };
        assert!(matches!(
            email.validate(),
            Err(PipelineError::MissingField("from"))
        ));
    }

    #[test]
    fn validate_rejects_empty_body() {
        let email = EmailMessage {
            from: "alice@example.com".into(),
            to: String::new(),
            subject: "Hello".into(),
            body: String::new(),
        };
        assert!(matches!(
            email.validate(),
            Err(PipelineError::MissingField("body"))
        ));
    }

    #[test]
    fn validate_allows_empty_subject() {
        let email = EmailMessage {
            from: "alice@example.com".into(),
            to: String::new(),
            subject: String::new(),
            body: "Where is my order?".into(),
        };
        assert!(email.validate().is_ok());
    }

    #[test]
    fn missing_body_fails_deserialization() {
        let result: Result<EmailMessage, _> =
            serde_json::from_str(r#"{"from": "a@b.com", "subject": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn triage_output_serializes_expected_fields() {
        let output = TriageOutput {
            subject: "Re: Payment failed".into(),
            body: "We're on it.".into(),
            to: "customer@example.com".into(),
            from: "support@example.com".into(),
            intent: Intent::Complaint,
            escalate: false,
            confidence: 0.9,
            summary: "Customer reports a failed payment.".into(),
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["intent"], "complaint");
        assert_eq!(json["escalate"], false);
        assert_eq!(json["to"], "customer@example.com");
        assert!(json["confidence"].is_f64());
    }

    #[test]
    fn triage_output_omits_empty_from() {
        let output = TriageOutput {
            subject: "Re: Hi".into(),
            body: "Hello".into(),
            to: "a@b.com".into(),
            from: String::new(),
            intent: Intent::Inquiry,
            escalate: false,
            confidence: 1.0,
            summary: "s".into(),
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(!json.contains("\"from\""));
    }
}
