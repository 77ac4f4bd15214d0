//! Pipeline driver — runs the fixed five-step sequence for one email.
//!
//! classify → summarize → memory → reply → decision, threading one
//! `ProcessingState`. Every email goes through every step; a step's
//! unrecoverable failure is absorbed by its documented fallback, so the
//! pipeline never aborts mid-flight for a single bad LLM response.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::TriageConfig;
use crate::email::{EmailMessage, TriageOutput};
use crate::error::PipelineError;
use crate::llm::LlmProvider;
use crate::memory::{InteractionRecord, MemoryStore};
use crate::pipeline::state::ProcessingState;
use crate::pipeline::{classify, decision, reply, summarize};

/// Orchestrates the triage pipeline for one email at a time.
pub struct EmailProcessor {
    llm: Arc<dyn LlmProvider>,
    memory: Arc<MemoryStore>,
    config: TriageConfig,
}

impl EmailProcessor {
    pub fn new(llm: Arc<dyn LlmProvider>, memory: Arc<MemoryStore>, config: TriageConfig) -> Self {
        Self {
            llm,
            memory,
            config,
        }
    }

    /// Process a single email through the full pipeline.
    ///
    /// The only error is malformed input, rejected before pipeline entry.
    pub async fn process(&self, email: EmailMessage) -> Result<TriageOutput, PipelineError> {
        email.validate()?;

        info!(
            sender = %email.from,
            subject = %email.subject,
            "Processing inbound email"
        );

        let mut state = ProcessingState::new(email);

        // Step 1: classify intent, tone, confidence.
        let classification = classify::classify(self.llm.as_ref(), &state.email).await;
        info!(
            intent = classification.intent.as_str(),
            tone = %classification.tone,
            confidence = classification.confidence,
            "Classified email"
        );

        // Step 2: summarize.
        let summary = summarize::summarize(self.llm.as_ref(), &state.email, &classification).await;

        // Step 3: recall conversation memory. Pure local lookup.
        let history = self.memory.load(&state.email.from).await;
        let memory_context = MemoryStore::format_context(&history);

        // Step 4: draft a reply with the intent-keyed steering tone.
        let outcome = reply::generate_reply(
            self.llm.as_ref(),
            &state.email,
            &classification,
            &summary,
            &memory_context,
        )
        .await;

        // Step 5: escalation decision. A template reply always routes to a
        // human regardless of the rule.
        let rule_escalate = decision::should_escalate(&classification, &self.config);

        state.classification = Some(classification);
        state.summary = Some(summary);
        state.memory_context = Some(memory_context);
        state.reply_fallback_used = outcome.fallback_used;
        state.reply = Some(outcome.draft);
        state.escalate = Some(rule_escalate || state.reply_fallback_used);

        self.finish(state).await
    }

    /// Process a batch of emails independently. One email's failure never
    /// halts processing of the rest.
    pub async fn process_batch(&self, emails: Vec<EmailMessage>) -> Vec<TriageOutput> {
        let count = emails.len();
        info!(count, "Processing email batch");

        let mut results = Vec::with_capacity(count);
        for email in emails {
            let sender = email.from.clone();
            match self.process(email).await {
                Ok(output) => results.push(output),
                Err(e) => {
                    error!(sender = %sender, error = %e, "Failed to process email in batch");
                }
            }
        }

        info!(
            processed = results.len(),
            total = count,
            "Batch processing complete"
        );
        results
    }

    /// Persist the interaction record and consume the state into the final
    /// output.
    async fn finish(&self, state: ProcessingState) -> Result<TriageOutput, PipelineError> {
        let classification = state
            .classification
            .ok_or_else(|| PipelineError::InvalidInput("classification step did not run".into()))?;
        let reply = state
            .reply
            .ok_or_else(|| PipelineError::InvalidInput("reply step did not run".into()))?;
        let summary = state.summary.unwrap_or_default();
        let escalate = state.escalate.unwrap_or(true);

        let record = InteractionRecord {
            sender: state.email.from.clone(),
            subject: state.email.subject.clone(),
            body: state.email.body.clone(),
            intent: classification.intent,
            summary: summary.clone(),
            reply: reply.body.clone(),
            timestamp: Utc::now(),
        };

        // Store failures are logged, never fatal — the reply still goes out.
        if let Err(e) = self.memory.save(&state.email.from, record).await {
            warn!(sender = %state.email.from, error = %e, "Failed to persist interaction record");
        }

        info!(
            sender = %state.email.from,
            intent = classification.intent.as_str(),
            escalate,
            "Email processed"
        );

        Ok(TriageOutput {
            subject: reply.subject,
            body: reply.body,
            to: state.email.from,
            from: state.email.to,
            intent: classification.intent,
            escalate,
            confidence: classification.confidence,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::error::LlmError;
    use crate::llm::{CompletionRequest, CompletionResponse, FinishReason};
    use crate::pipeline::state::Intent;

    /// Mock provider that pops one scripted result per call, in pipeline
    /// order: classify, summarize, reply.
    struct ScriptedLlm {
        responses: Mutex<VecDeque<Result<String, ()>>>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<Result<String, ()>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().collect()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedLlm {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(()));
            match next {
                Ok(content) => Ok(CompletionResponse {
                    content,
                    input_tokens: 10,
                    output_tokens: 10,
                    finish_reason: FinishReason::Stop,
                }),
                Err(()) => Err(LlmError::RequestFailed {
                    provider: "scripted".into(),
                    reason: "simulated outage".into(),
                }),
            }
        }
    }

    fn happy_path_script(intent: &str, confidence: f32) -> Vec<Result<String, ()>> {
        vec![
            Ok(format!(
                r#"{{"intent": "{intent}", "tone": "frustrated", "confidence": {confidence}}}"#
            )),
            Ok("Customer reports a failed payment and wants it fixed.".into()),
            Ok(r#"{"subject": "Re: Payment failed", "body": "We're sorry — looking into it now."}"#
                .into()),
        ]
    }

    fn sample_email() -> EmailMessage {
        EmailMessage {
            from: "customer@example.com".into(),
            to: "support@example.com".into(),
            subject: "Payment failed".into(),
            body: "Hi, my payment isn't working...".into(),
        }
    }

    fn processor_in(dir: &tempfile::TempDir, llm: Arc<dyn LlmProvider>) -> EmailProcessor {
        let config = TriageConfig {
            memory_path: dir.path().join("memory.json"),
            ..TriageConfig::default()
        };
        let memory = Arc::new(MemoryStore::new(&config.memory_path, config.max_history));
        EmailProcessor::new(llm, memory, config)
    }

    #[tokio::test]
    async fn confident_complaint_is_not_escalated() {
        // intent=complaint, confidence=0.9 → the AND rule does not fire.
        let dir = tempfile::tempdir().unwrap();
        let processor = processor_in(&dir, ScriptedLlm::new(happy_path_script("complaint", 0.9)));

        let output = processor.process(sample_email()).await.unwrap();
        assert_eq!(output.intent, Intent::Complaint);
        assert!(!output.escalate);
        assert_eq!(output.subject, "Re: Payment failed");
        assert_eq!(output.to, "customer@example.com");
        assert_eq!(output.from, "support@example.com");
    }

    #[tokio::test]
    async fn low_confidence_complaint_is_escalated() {
        let dir = tempfile::tempdir().unwrap();
        let processor = processor_in(&dir, ScriptedLlm::new(happy_path_script("complaint", 0.79)));

        let output = processor.process(sample_email()).await.unwrap();
        assert!(output.escalate);
    }

    #[tokio::test]
    async fn reply_failure_forces_escalation_and_still_completes() {
        let dir = tempfile::tempdir().unwrap();
        let script = vec![
            Ok(r#"{"intent": "request", "tone": "neutral", "confidence": 0.95}"#.into()),
            Ok("Customer asks for an invoice copy.".into()),
            Err(()), // reply generation outage
        ];
        let processor = processor_in(&dir, ScriptedLlm::new(script));

        let output = processor.process(sample_email()).await.unwrap();
        assert!(output.escalate);
        assert!(!output.subject.is_empty());
        assert!(!output.body.is_empty());
    }

    #[tokio::test]
    async fn total_llm_outage_still_produces_output() {
        let dir = tempfile::tempdir().unwrap();
        let processor = processor_in(&dir, ScriptedLlm::new(vec![Err(()), Err(()), Err(())]));

        let output = processor.process(sample_email()).await.unwrap();
        // Classification fallback: inquiry at zero confidence.
        assert_eq!(output.intent, Intent::Inquiry);
        assert_eq!(output.confidence, 0.0);
        // Summary fallback: truncated body.
        assert!(output.summary.starts_with("Hi, my payment"));
        // Template reply forces escalation.
        assert!(output.escalate);
        assert!(!output.body.is_empty());
    }

    #[tokio::test]
    async fn processed_email_is_recorded_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let config = TriageConfig {
            memory_path: dir.path().join("memory.json"),
            ..TriageConfig::default()
        };
        let memory = Arc::new(MemoryStore::new(&config.memory_path, config.max_history));
        let processor = EmailProcessor::new(
            ScriptedLlm::new(happy_path_script("complaint", 0.9)),
            Arc::clone(&memory),
            config,
        );

        processor.process(sample_email()).await.unwrap();

        let history = memory.load("customer@example.com").await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].intent, Intent::Complaint);
        assert_eq!(history[0].subject, "Payment failed");
        assert!(history[0].summary.contains("failed payment"));
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_before_pipeline_entry() {
        let dir = tempfile::tempdir().unwrap();
        // No scripted responses: the LLM must never be called.
        let processor = processor_in(&dir, ScriptedLlm::new(vec![]));

        let email = EmailMessage {
            from: String::new(),
            to: String::new(),
            subject: "Hi".into(),
            body: "Hello".into(),
        };
        assert!(matches!(
            processor.process(email).await,
            Err(PipelineError::MissingField("from"))
        ));
    }

    #[tokio::test]
    async fn batch_skips_bad_emails_and_processes_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let processor = processor_in(&dir, ScriptedLlm::new(happy_path_script("inquiry", 0.9)));

        let bad = EmailMessage {
            from: "broken@example.com".into(),
            to: String::new(),
            subject: "x".into(),
            body: String::new(),
        };
        let outputs = processor.process_batch(vec![bad, sample_email()]).await;
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].to, "customer@example.com");
    }
}
