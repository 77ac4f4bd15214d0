//! Classification step — intent, tone, and confidence from the email body.
//!
//! The actual decision logic is delegated to the LLM; local code builds a
//! deterministic prompt, parses the structured response, and falls back to a
//! safe default when the response is missing fields or unparsable.

use tracing::{debug, warn};

use crate::email::EmailMessage;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::parse::extract_json_object;
use crate::pipeline::state::{Classification, Intent};

/// Kept tight — this runs on every email.
const CLASSIFY_MAX_TOKENS: u32 = 256;

/// Deterministic-ish.
const CLASSIFY_TEMPERATURE: f32 = 0.1;

/// Classify an inbound email. Never fails: any external or parse failure
/// yields the documented fallback (`inquiry`, neutral, confidence 0.0).
pub async fn classify(llm: &dyn LlmProvider, email: &EmailMessage) -> Classification {
    let request = CompletionRequest::new(vec![
        ChatMessage::system(build_system_prompt()),
        ChatMessage::user(build_user_prompt(email)),
    ])
    .with_temperature(CLASSIFY_TEMPERATURE)
    .with_max_tokens(CLASSIFY_MAX_TOKENS);

    let raw = match llm.complete(request).await {
        Ok(response) => {
            debug!(
                input_tokens = response.input_tokens,
                output_tokens = response.output_tokens,
                "Classification call complete"
            );
            response.content
        }
        Err(e) => {
            warn!(error = %e, "Classification call failed — using fallback");
            return Classification::fallback();
        }
    };

    match parse_classification(&raw) {
        Ok(classification) => classification,
        Err(e) => {
            warn!(
                raw_response = %raw,
                error = %e,
                "Failed to parse classification response — using fallback"
            );
            Classification::fallback()
        }
    }
}

fn build_system_prompt() -> String {
    "You classify customer emails.\n\n\
     Classify the intent as one of: complaint, request, feedback, inquiry.\n\
     Also analyze the tone (e.g. angry, frustrated, neutral, happy, urgent) and \
     provide a confidence score between 0 and 1.\n\n\
     Respond with ONLY a JSON object:\n\
     {\"intent\": \"complaint|request|feedback|inquiry\", \"tone\": \"...\", \"confidence\": 0.95}"
        .to_string()
}

fn build_user_prompt(email: &EmailMessage) -> String {
    // Truncated for token efficiency
    let body_preview: String = email.body.chars().take(2000).collect();
    format!("Email:\n{body_preview}")
}

/// Parsed shape of the classification response.
#[derive(Debug, serde::Deserialize)]
struct ClassifyResponse {
    intent: String,
    #[serde(default)]
    tone: String,
    confidence: f32,
}

fn parse_classification(raw: &str) -> Result<Classification, String> {
    let json_str = extract_json_object(raw);
    let response: ClassifyResponse =
        serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {e}"))?;

    let intent = Intent::parse(&response.intent)
        .ok_or_else(|| format!("unknown intent label: '{}'", response.intent))?;

    Ok(Classification {
        intent,
        tone: if response.tone.is_empty() {
            "neutral".to_string()
        } else {
            response.tone
        },
        confidence: response.confidence.clamp(0.0, 1.0),
    })
}
