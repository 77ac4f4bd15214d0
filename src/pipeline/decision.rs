//! Escalation decision — pure, total function of the classification.
//!
//! No external call and no error conditions. Thresholds come from
//! configuration, not the rule itself.

use crate::config::TriageConfig;
use crate::pipeline::state::{Classification, Intent};

/// Tone labels that signal anger or urgency. Matched as substrings of the
/// lowercased free-text tone, so "very angry" and "urgent!" both count.
const URGENT_TONE_MARKERS: [&str; 2] = ["angry", "urgent"];

/// Decide whether a human should take over.
///
/// Escalates when the classifier saw a complaint but wasn't confident about
/// it, or when the tone signals anger/urgency and confidence is below the
/// (lower) urgency threshold. At-threshold confidence does not escalate.
pub fn should_escalate(classification: &Classification, config: &TriageConfig) -> bool {
    if classification.intent == Intent::Complaint
        && classification.confidence < config.complaint_confidence_threshold
    {
        return true;
    }

    let tone = classification.tone.to_lowercase();
    if URGENT_TONE_MARKERS.iter().any(|m| tone.contains(m))
        && classification.confidence < config.urgency_confidence_threshold
    {
        return true;
    }

    false
}
