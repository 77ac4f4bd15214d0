//! JSON-file-backed conversation memory, keyed by sender address.
//!
//! The whole mapping is read and rewritten on each update. A missing or
//! unreadable file is treated as an empty store — the store self-heals on
//! the next save rather than failing the pipeline.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::MemoryError;
use crate::pipeline::state::Intent;

/// Rendered in place of history for first-contact senders.
const EMPTY_HISTORY_CONTEXT: &str = "No previous conversation history.";

/// A point-in-time snapshot of one processed email. Never mutated after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRecord {
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub intent: Intent,
    pub summary: String,
    pub reply: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-sender bounded history persisted to a single JSON file.
pub struct MemoryStore {
    path: PathBuf,
    max_history: usize,
    // The file is rewritten wholesale on every save, so all read-modify-write
    // cycles are serialized behind one lock. This subsumes per-sender
    // serialization: concurrent saves for different senders would otherwise
    // lose each other's writes at the file level.
    file_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>, max_history: usize) -> Self {
        Self {
            path: path.into(),
            max_history,
            file_lock: Mutex::new(()),
        }
    }

    /// Load the persisted history for one sender, oldest first.
    ///
    /// Unknown senders get an empty history; so does an unreadable or
    /// corrupt backing file (logged, never fatal).
    pub async fn load(&self, sender: &str) -> Vec<InteractionRecord> {
        let _guard = self.file_lock.lock().await;
        let mut all = self.read_all();
        all.remove(sender).unwrap_or_default()
    }

    /// Append a record to the sender's history, truncate to the most recent
    /// `max_history` entries, and persist the whole mapping.
    pub async fn save(&self, sender: &str, record: InteractionRecord) -> Result<(), MemoryError> {
        let _guard = self.file_lock.lock().await;
        let mut all = self.read_all();

        let history = all.entry(sender.to_string()).or_default();
        history.push(record);
        if history.len() > self.max_history {
            let excess = history.len() - self.max_history;
            history.drain(..excess);
        }

        let json = serde_json::to_string_pretty(&all)?;
        std::fs::write(&self.path, json).map_err(|source| MemoryError::Write {
            path: self.path.display().to_string(),
            source,
        })?;

        tracing::debug!(sender, path = %self.path.display(), "Saved interaction record");
        Ok(())
    }

    /// Render a history into a short block suitable for embedding in a
    /// prompt. Deterministic and order-stable: chronological, one numbered
    /// entry per record.
    pub fn format_context(history: &[InteractionRecord]) -> String {
        if history.is_empty() {
            return EMPTY_HISTORY_CONTEXT.to_string();
        }

        let mut parts = vec!["Previous conversation history:".to_string()];
        for (i, record) in history.iter().enumerate() {
            parts.push(format!(
                "{}. On {}, customer wrote about \"{}\" ({}): {}",
                i + 1,
                record.timestamp.format("%Y-%m-%d"),
                record.subject,
                record.intent.as_str(),
                record.summary,
            ));
            if !record.reply.is_empty() {
                let reply_preview: String = record.reply.chars().take(200).collect();
                parts.push(format!("   We replied: {reply_preview}"));
            }
        }
        parts.join("\n")
    }

    fn read_all(&self) -> HashMap<String, Vec<InteractionRecord>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Memory file unreadable — treating as empty store"
                );
                return HashMap::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(all) => all,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Memory file corrupt — treating as empty store"
                );
                HashMap::new()
            }
        }
    }
}
