//! Reply generation step — drafts a context-aware reply.
//!
//! The steering tone comes from the intent lookup table on `Intent` and is
//! passed into the prompt as an instruction. On external failure a generic
//! template reply is returned with a flag that forces human escalation.

use tracing::{debug, warn};

use crate::email::EmailMessage;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::parse::extract_json_object;
use crate::pipeline::state::{Classification, ReplyDraft};

const REPLY_MAX_TOKENS: u32 = 1024;
const REPLY_TEMPERATURE: f32 = 0.3;

const FALLBACK_BODY: &str =
    "Thank you for your email. We have received your message and will get back to you shortly.";

/// Outcome of the reply step.
#[derive(Debug, Clone)]
pub struct ReplyOutcome {
    pub draft: ReplyDraft,
    /// True when the generic template was used — a signal that a human
    /// should take over.
    pub fallback_used: bool,
}

/// Draft a reply. Never fails: external or parse failure yields the generic
/// template with `fallback_used` set.
pub async fn generate_reply(
    llm: &dyn LlmProvider,
    email: &EmailMessage,
    classification: &Classification,
    summary: &str,
    memory_context: &str,
) -> ReplyOutcome {
    let request = CompletionRequest::new(vec![
        ChatMessage::system(build_system_prompt()),
        ChatMessage::user(build_user_prompt(email, classification, summary, memory_context)),
    ])
    .with_temperature(REPLY_TEMPERATURE)
    .with_max_tokens(REPLY_MAX_TOKENS);

    let raw = match llm.complete(request).await {
        Ok(response) => {
            debug!(
                input_tokens = response.input_tokens,
                output_tokens = response.output_tokens,
                "Reply generation call complete"
            );
            response.content
        }
        Err(e) => {
            warn!(error = %e, "Reply generation call failed — using template");
            return fallback_outcome(email);
        }
    };

    match parse_reply(&raw) {
        Ok(draft) => ReplyOutcome {
            draft,
            fallback_used: false,
        },
        Err(e) => {
            warn!(
                raw_response = %raw,
                error = %e,
                "Failed to parse reply response — using template"
            );
            fallback_outcome(email)
        }
    }
}

fn fallback_outcome(email: &EmailMessage) -> ReplyOutcome {
    ReplyOutcome {
        draft: ReplyDraft {
            subject: fallback_subject(&email.subject),
            body: FALLBACK_BODY.to_string(),
        },
        fallback_used: true,
    }
}

fn fallback_subject(original: &str) -> String {
    if original.trim().is_empty() {
        "Re: Your message".to_string()
    } else {
        format!("Re: {original}")
    }
}

fn build_system_prompt() -> String {
    "You are a professional support agent. Write a polite and context-aware \
     reply to the customer email described below.\n\n\
     Guidelines:\n\
     - Match the requested tone\n\
     - Address the customer by name if possible\n\
     - Be specific and helpful\n\
     - Include relevant details from the conversation history\n\
     - Keep it professional but warm\n\n\
     Respond with ONLY a JSON object:\n\
     {\"subject\": \"Re: Original Subject\", \"body\": \"Your polite reply here...\"}"
        .to_string()
}

fn build_user_prompt(
    email: &EmailMessage,
    classification: &Classification,
    summary: &str,
    memory_context: &str,
) -> String {
    format!(
        "INTENT: {}\n\
         TONE TO USE: {}\n\
         EMAIL SUMMARY: {}\n\
         CUSTOMER'S TONE: {}\n\
         CONVERSATION HISTORY:\n{}\n\n\
         Original Email Subject: {}",
        classification.intent.as_str(),
        classification.intent.reply_tone(),
        summary,
        classification.tone,
        memory_context,
        email.subject,
    )
}

fn parse_reply(raw: &str) -> Result<ReplyDraft, String> {
    let json_str = extract_json_object(raw);
    let draft: ReplyDraft =
        serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {e}"))?;
    if draft.subject.trim().is_empty() || draft.body.trim().is_empty() {
        return Err("reply requires non-empty subject and body".to_string());
    }
    Ok(draft)
}
