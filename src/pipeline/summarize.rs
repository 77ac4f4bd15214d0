//! Summarization step — a 2–3 sentence summary of the email.

use tracing::{debug, warn};

use crate::email::EmailMessage;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::state::Classification;

const SUMMARIZE_MAX_TOKENS: u32 = 256;
const SUMMARIZE_TEMPERATURE: f32 = 0.1;

/// Fallback summary length when the external call fails.
const FALLBACK_BODY_CHARS: usize = 300;

/// Summarize an inbound email. Never fails: on external failure the summary
/// falls back to a truncated copy of the body.
pub async fn summarize(
    llm: &dyn LlmProvider,
    email: &EmailMessage,
    classification: &Classification,
) -> String {
    let request = CompletionRequest::new(vec![
        ChatMessage::system(build_system_prompt()),
        ChatMessage::user(build_user_prompt(email, classification)),
    ])
    .with_temperature(SUMMARIZE_TEMPERATURE)
    .with_max_tokens(SUMMARIZE_MAX_TOKENS);

    match llm.complete(request).await {
        Ok(response) if !response.content.trim().is_empty() => {
            debug!(
                input_tokens = response.input_tokens,
                output_tokens = response.output_tokens,
                "Summarization call complete"
            );
            response.content.trim().to_string()
        }
        Ok(_) => {
            warn!("Summarization returned empty content — using truncated body");
            fallback_summary(email)
        }
        Err(e) => {
            warn!(error = %e, "Summarization call failed — using truncated body");
            fallback_summary(email)
        }
    }
}

fn build_system_prompt() -> String {
    "Summarize the email briefly in 2-3 sentences, focusing on:\n\
     1. The sender's main point or request\n\
     2. The emotional tone and urgency\n\
     3. Key details that need attention\n\n\
     Provide only the summary text, no additional commentary."
        .to_string()
}

fn build_user_prompt(email: &EmailMessage, classification: &Classification) -> String {
    let body_preview: String = email.body.chars().take(2000).collect();
    format!(
        "Email:\n{body_preview}\n\nTone: {}\nIntent: {}",
        classification.tone,
        classification.intent.as_str(),
    )
}

fn fallback_summary(email: &EmailMessage) -> String {
    email.body.chars().take(FALLBACK_BODY_CHARS).collect()
}
