//! Re-ranking of engine candidates by learned frequency.
//!
//! The engine's list is stable-sorted by learned score (descending, ties
//! keep engine order). Learned words the engine did not produce may be
//! injected; they compete on score but lose every tie to an engine
//! candidate, and they only ever take capacity left over by the engine's
//! own candidates.


use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, debug_span};

use crate::frequency::FrequencyStore;
use crate::settings::MergeSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateOrigin {
    /// Produced by the conversion engine.
    Engine,
    /// Injected from the frequency store.
    Learned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedCandidate {
    pub word: String,
    /// Learned score used for ranking (0 when below `min_score`).
    pub score: u64,
    pub origin: CandidateOrigin,
}

pub struct CandidateMerger {
    settings: MergeSettings,
}

impl CandidateMerger {
    pub fn new(settings: MergeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MergeSettings {
        &self.settings
    }

    /// Merge and return the words only. `capacity: None` means unbounded.
    pub fn merge<S: AsRef<str>>(
        &self,
        store: &FrequencyStore,
        candidates: &[S],
        context: &str,
        capacity: Option<usize>,
    ) -> Vec<String> {
        self.merge_scored(store, candidates, context, capacity)
            .into_iter()
            .map(|c| c.word)
            .collect()
    }

    pub fn merge_scored<S: AsRef<str>>(
        &self,
        store: &FrequencyStore,
        candidates: &[S],
        context: &str,
        capacity: Option<usize>,
    ) -> Vec<MergedCandidate> {
        let _span = debug_span!("merge", context, n = candidates.len()).entered();
        let capacity = capacity.unwrap_or(usize::MAX);
        let min_score = self.settings.min_score;
        let effective = |score: u64| if score >= min_score { score } else { 0 };

        // (score, position, candidate); position breaks ties.
        let mut ranked: Vec<(u64, usize, MergedCandidate)> = store
            .scores(context, candidates)
            .into_iter()
            .zip(candidates)
            .enumerate()
            .map(|(i, (score, word))| {
                let score = effective(score);
                let candidate = MergedCandidate {
                    word: word.as_ref().to_string(),
                    score,
                    origin: CandidateOrigin::Engine,
                };
                (score, i, candidate)
            })
            .collect();

        let budget = self
            .settings
            .max_injected
            .min(capacity.saturating_sub(candidates.len()));
        if budget > 0 {
            let present: HashSet<&str> = candidates.iter().map(|c| c.as_ref()).collect();
            let injected: Vec<(String, u64)> = store
                .top_for_context(context, self.settings.max_injected)
                .into_iter()
                .filter(|(word, score)| *score >= min_score && !present.contains(word.as_str()))
                .take(budget)
                .collect();
            let base = ranked.len();
            for (k, (word, score)) in injected.into_iter().enumerate() {
                ranked.push((
                    score,
                    base + k,
                    MergedCandidate {
                        word,
                        score,
                        origin: CandidateOrigin::Learned,
                    },
                ));
            }
        }

        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        if ranked.len() > capacity {
            debug!(
                dropped = ranked.len() - capacity,
                capacity, "merge output truncated"
            );
            ranked.truncate(capacity);
        }

        ranked.into_iter().map(|(_, _, c)| c).collect()
    }
}
