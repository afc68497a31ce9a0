use super::*;
use crate::settings::Settings;

fn recorder() -> SelectionRecorder {
    let s = Settings::default();
    SelectionRecorder::new(s.learning, &s.frequency)
}

fn recorder_with(f: impl FnOnce(&mut LearningSettings)) -> SelectionRecorder {
    let s = Settings::default();
    let mut learning = s.learning;
    f(&mut learning);
    SelectionRecorder::new(learning, &s.frequency)
}

fn unit() -> u64 {
    Settings::default().frequency.selection_unit
}

#[test]
fn test_record_selection_counts() {
    let store = FrequencyStore::in_memory();
    let r = recorder();
    for _ in 0..4 {
        r.record_selection(&store, "你", "ni");
    }
    assert!(store.get("ni", "你") >= 4 * unit());
}

#[test]
fn test_record_selection_does_not_buffer() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder();
    r.record_consecutive_at(&store, "你", "ni", 0);
    r.record_selection(&store, "好", "hao");
    assert_eq!(r.pending_len(), 1);
    assert!(r.on_commit_complete(&store).is_none());
}

#[test]
fn test_consecutive_pair_learns_compound() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder();
    r.record_consecutive_at(&store, "你", "ni", 0);
    r.record_consecutive_at(&store, "好", "hao", 100);
    let learned = r.on_commit_complete(&store).unwrap();

    assert_eq!(learned.word, "你好");
    assert_eq!(learned.context, "nihao");
    assert_eq!(learned.segments, 2);
    assert!(store.get("nihao", "你好") > unit());
    assert_eq!(r.pending_len(), 0);
    // Segments were counted individually as well.
    assert_eq!(store.get("ni", "你"), unit());
    assert_eq!(store.get("hao", "好"), unit());
}

#[test]
fn test_single_consecutive_selection_learns_nothing() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder();
    r.record_consecutive_at(&store, "你", "ni", 0);
    assert!(r.on_commit_complete(&store).is_none());
    assert_eq!(store.len(), 1);
    assert_eq!(r.pending_len(), 0);
}

#[test]
fn test_commit_on_empty_buffer() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder();
    assert!(r.on_commit_complete(&store).is_none());
    assert!(store.is_empty());
}

#[test]
fn test_repeated_phrase_accumulates() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder();
    for round in 0..2 {
        r.record_consecutive_at(&store, "你", "ni", round * 10_000);
        r.record_consecutive_at(&store, "好", "hao", round * 10_000 + 10);
        r.on_commit_complete(&store);
    }
    let weight = Settings::default().frequency.compound_weight;
    assert_eq!(store.get("nihao", "你好"), 2 * weight);
}

#[test]
fn test_three_segments() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder();
    r.record_consecutive_at(&store, "中华", "zhonghua", 0);
    r.record_consecutive_at(&store, "人民", "renmin", 10);
    r.record_consecutive_at(&store, "共和国", "gongheguo", 20);
    let learned = r.on_commit_complete(&store).unwrap();
    assert_eq!(learned.word, "中华人民共和国");
    assert_eq!(learned.context, "zhonghuarenmingongheguo");
    assert_eq!(learned.segments, 3);
}

#[test]
fn test_segment_window_evicts_oldest() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder_with(|l| {
        l.max_segments = 2;
        l.max_compound_chars = 100;
    });
    r.record_consecutive_at(&store, "一", "yi", 0);
    r.record_consecutive_at(&store, "二", "er", 1);
    r.record_consecutive_at(&store, "三", "san", 2);
    let pending: Vec<&str> = r.pending().map(|s| s.word.as_str()).collect();
    assert_eq!(pending, vec!["二", "三"]);
    let learned = r.on_commit_complete(&store).unwrap();
    assert_eq!(learned.word, "二三");
    assert_eq!(learned.context, "ersan");
}

#[test]
fn test_char_window_evicts_oldest() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder_with(|l| {
        l.max_segments = 10;
        l.max_compound_chars = 4;
    });
    r.record_consecutive_at(&store, "中华", "zhonghua", 0);
    r.record_consecutive_at(&store, "人民", "renmin", 1);
    assert_eq!(r.pending_len(), 2);
    r.record_consecutive_at(&store, "共和国", "gongheguo", 2);
    let pending: Vec<&str> = r.pending().map(|s| s.word.as_str()).collect();
    assert_eq!(pending, vec!["共和国"]);
}

#[test]
fn test_oversized_segment_is_kept() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder_with(|l| l.max_compound_chars = 2);
    r.record_consecutive_at(&store, "中华人民共和国", "zhonghuarenmingongheguo", 0);
    assert_eq!(r.pending_len(), 1);
}

#[test]
fn test_gap_starts_new_run() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder_with(|l| l.max_gap_ms = 1000);
    r.record_consecutive_at(&store, "你", "ni", 0);
    r.record_consecutive_at(&store, "好", "hao", 5000);
    assert_eq!(r.pending_len(), 1);
    assert!(r.on_commit_complete(&store).is_none());
    assert_eq!(store.get("nihao", "你好"), 0);
}

#[test]
fn test_zero_gap_disables_rule() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder_with(|l| l.max_gap_ms = 0);
    r.record_consecutive_at(&store, "你", "ni", 0);
    r.record_consecutive_at(&store, "好", "hao", 3_600_000);
    assert_eq!(r.pending_len(), 2);
}

#[test]
fn test_break_sequence_clears() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder();
    r.record_consecutive_at(&store, "你", "ni", 0);
    r.break_sequence();
    r.record_consecutive_at(&store, "好", "hao", 10);
    assert!(r.on_commit_complete(&store).is_none());
}

#[test]
fn test_learning_disabled_still_counts() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder_with(|l| l.enabled = false);
    r.record_consecutive_at(&store, "你", "ni", 0);
    r.record_consecutive_at(&store, "好", "hao", 10);
    assert_eq!(r.pending_len(), 0);
    assert!(r.on_commit_complete(&store).is_none());
    assert_eq!(store.get("ni", "你"), unit());
}

#[test]
fn test_empty_word_ignored() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder();
    r.record_selection(&store, "", "ni");
    r.record_consecutive_at(&store, "", "ni", 0);
    assert!(store.is_empty());
    assert_eq!(r.pending_len(), 0);
}

#[test]
fn test_unavailable_store_keeps_buffer_logic() {
    let store = FrequencyStore::unavailable();
    let mut r = recorder();
    r.record_consecutive_at(&store, "你", "ni", 0);
    r.record_consecutive_at(&store, "好", "hao", 10);
    let learned = r.on_commit_complete(&store).unwrap();
    assert_eq!(learned.score, 0);
    assert_eq!(r.pending_len(), 0);
}

#[test]
fn test_rejected_phrase_is_not_relearned() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder();
    r.record_consecutive_at(&store, "你", "ni", 0);
    r.record_consecutive_at(&store, "好", "hao", 10);
    assert!(r.on_commit_complete(&store).is_some());

    assert!(r.reject_phrase(&store, "你好", "nihao"));
    assert_eq!(store.get("nihao", "你好"), 0);
    assert!(r.is_rejected("你好", "nihao"));

    r.record_consecutive_at(&store, "你", "ni", 10_000);
    r.record_consecutive_at(&store, "好", "hao", 10_010);
    assert!(r.on_commit_complete(&store).is_none());
    assert_eq!(store.get("nihao", "你好"), 0);
    assert_eq!(r.pending_len(), 0);
    // Segments keep counting on their own.
    assert_eq!(store.get("ni", "你"), 2 * unit());
}

#[test]
fn test_reject_is_scoped_to_context() {
    let store = FrequencyStore::in_memory();
    let mut r = recorder();
    // Nothing learned yet: still blocks future learning.
    assert!(!r.reject_phrase(&store, "你好", "nihao"));
    assert!(!r.is_rejected("你好", "nihao2"));

    r.record_consecutive_at(&store, "你", "ni", 0);
    r.record_consecutive_at(&store, "好", "hao", 10);
    assert!(r.on_commit_complete(&store).is_none());

    r.record_consecutive_at(&store, "你", "ni", 10_000);
    r.record_consecutive_at(&store, "们", "men", 10_010);
    assert_eq!(r.on_commit_complete(&store).unwrap().word, "你们");
    assert!(!r.reject_phrase(&store, "", "nimen"));
}
