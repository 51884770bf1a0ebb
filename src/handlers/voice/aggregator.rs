//! Turn-scoped transcript aggregation.
//!
//! Finalized recognition fragments arrive piecemeal while the client is
//! speaking; the aggregator concatenates them into the single utterance that
//! is handed to the agent when the turn ends. Fragments never survive a turn:
//! the buffer is drained at dispatch and discarded on cancel or teardown.

/// Accumulates finalized recognition fragments for the current turn.
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    fragments: Vec<String>,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one finalized fragment.
    ///
    /// The fragment is trimmed; fragments that are empty after trimming are
    /// skipped so they cannot introduce stray separators.
    pub fn push(&mut self, text: &str) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.fragments.push(trimmed.to_string());
        }
    }

    /// Drain the buffer and return the aggregated utterance.
    ///
    /// Fragments are joined with a single space. Returns an empty string when
    /// no fragments were collected this turn.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.fragments).join(" ")
    }

    /// Discard all buffered fragments without producing an utterance.
    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    /// Whether any fragments are buffered for the current turn.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of fragments buffered for the current turn.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }
}
