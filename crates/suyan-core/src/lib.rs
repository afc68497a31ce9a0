//! Learning layer for a pinyin input method: per-user selection
//! frequencies, candidate re-ranking and compound-phrase learning.

pub mod frequency;
pub mod learning;
pub mod merge;
pub mod settings;

pub use frequency::{FrequencyEntry, FrequencyRecord, FrequencyStore, ImportMode, StoreError};
pub use learning::{LearnedPhrase, SelectionRecorder};
pub use merge::{CandidateMerger, CandidateOrigin, MergedCandidate};
pub use settings::Settings;
