//! Selection recording and compound-phrase learning.
//!
//! Every selection bumps its (context, word) score. Consecutive selections
//! are also buffered; when the composition is committed with two or more
//! buffered segments, their concatenation is learned as one phrase with a
//! heavier weight than a single selection. A phrase the user rejects is
//! removed and never learned again by this recorder.

#[cfg(test)]
mod tests;

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use tracing::{debug, debug_span};

use crate::frequency::FrequencyStore;
use crate::settings::{FrequencySettings, LearningSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSegment {
    pub word: String,
    pub context: String,
}

/// A compound written to the store by [`SelectionRecorder::on_commit_complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedPhrase {
    pub word: String,
    pub context: String,
    pub segments: usize,
    /// Score of the compound after the increment.
    pub score: u64,
}

pub struct SelectionRecorder {
    learning: LearningSettings,
    unit: u64,
    compound_weight: u64,
    pending: VecDeque<PendingSegment>,
    /// Total chars of the buffered words.
    pending_chars: usize,
    last_consecutive_ms: Option<u64>,
    clock: Instant,
    /// (context, word) of phrases the user rejected.
    rejected: HashSet<(String, String)>,
}

impl SelectionRecorder {
    pub fn new(learning: LearningSettings, frequency: &FrequencySettings) -> Self {
        Self {
            learning,
            unit: frequency.selection_unit,
            compound_weight: frequency.compound_weight,
            pending: VecDeque::new(),
            pending_chars: 0,
            last_consecutive_ms: None,
            clock: Instant::now(),
            rejected: HashSet::new(),
        }
    }

    /// Count a standalone selection. The pending buffer is left untouched.
    pub fn record_selection(&self, store: &FrequencyStore, word: &str, context: &str) {
        if word.is_empty() {
            return;
        }
        let _span = debug_span!("record_selection", word, context).entered();
        store.increment(context, word, self.unit);
    }

    pub fn record_consecutive(&mut self, store: &FrequencyStore, word: &str, context: &str) {
        let now_ms = self.clock.elapsed().as_millis() as u64;
        self.record_consecutive_at(store, word, context, now_ms);
    }

    /// Count a selection and buffer it as the next segment of a phrase.
    /// `now_ms` is a monotonic millisecond timestamp.
    pub fn record_consecutive_at(
        &mut self,
        store: &FrequencyStore,
        word: &str,
        context: &str,
        now_ms: u64,
    ) {
        if word.is_empty() {
            return;
        }
        let _span = debug_span!("record_consecutive", word, context).entered();
        store.increment(context, word, self.unit);
        if !self.learning.enabled {
            return;
        }

        let max_gap = self.learning.max_gap_ms;
        if let Some(last) = self.last_consecutive_ms {
            if max_gap > 0 && now_ms.saturating_sub(last) > max_gap {
                debug!(gap_ms = now_ms.saturating_sub(last), "selection gap, new run");
                self.clear_pending();
            }
        }
        self.last_consecutive_ms = Some(now_ms);

        self.pending_chars += word.chars().count();
        self.pending.push_back(PendingSegment {
            word: word.to_string(),
            context: context.to_string(),
        });
        self.evict_overflow();
    }

    /// Explicit non-consecutive signal: forget the buffered run.
    pub fn break_sequence(&mut self) {
        self.clear_pending();
    }

    /// Learn the buffered run as a phrase if it has at least two segments,
    /// then clear the buffer.
    pub fn on_commit_complete(&mut self, store: &FrequencyStore) -> Option<LearnedPhrase> {
        let _span = debug_span!("on_commit_complete", segments = self.pending.len()).entered();
        if self.pending.len() < 2 {
            self.clear_pending();
            return None;
        }

        let mut word = String::new();
        let mut context = String::new();
        for seg in &self.pending {
            word.push_str(&seg.word);
            context.push_str(&seg.context);
        }
        let segments = self.pending.len();
        self.clear_pending();

        if self.is_rejected(&word, &context) {
            debug!(word = %word, context = %context, "rejected phrase not learned");
            return None;
        }
        store.increment(&context, &word, self.compound_weight);
        let score = store.get(&context, &word);
        debug!(word = %word, context = %context, segments, score, "phrase learned");
        Some(LearnedPhrase {
            word,
            context,
            segments,
            score,
        })
    }

    /// Remove a learned phrase and keep it from being learned again.
    /// Returns whether the store held an entry for it.
    pub fn reject_phrase(&mut self, store: &FrequencyStore, word: &str, context: &str) -> bool {
        if word.is_empty() {
            return false;
        }
        self.rejected.insert((context.to_string(), word.to_string()));
        let removed = store.remove(context, word);
        debug!(word, context, removed, "phrase rejected");
        removed
    }

    pub fn is_rejected(&self, word: &str, context: &str) -> bool {
        self.rejected.contains(&(context.to_string(), word.to_string()))
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingSegment> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Sliding window: drop the oldest segments, never the newest.
    fn evict_overflow(&mut self) {
        while self.pending.len() > 1
            && (self.pending.len() > self.learning.max_segments
                || self.pending_chars > self.learning.max_compound_chars)
        {
            if let Some(old) = self.pending.pop_front() {
                self.pending_chars -= old.word.chars().count();
            }
        }
    }

    fn clear_pending(&mut self) {
        self.pending.clear();
        self.pending_chars = 0;
        self.last_consecutive_ms = None;
    }
}
