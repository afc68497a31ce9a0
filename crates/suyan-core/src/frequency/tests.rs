use std::fs;
use std::io::Cursor;
use std::path::Path;

use super::wal::{FrequencyWal, WalEntry};
use super::*;
use crate::settings::Settings;

fn freq_settings() -> FrequencySettings {
    Settings::default().frequency
}

fn entry(seq: u64, context: &str, word: &str, amount: u64) -> WalEntry {
    WalEntry {
        seq,
        context: context.into(),
        word: word.into(),
        amount,
        timestamp: 1_700_000_000,
    }
}

// --- FrequencyTable ---

#[test]
fn test_absent_is_zero() {
    let t = FrequencyTable::new();
    assert_eq!(t.get("nihao", "你好"), 0);
    assert!(t.entry("nihao", "你好").is_none());
}

#[test]
fn test_increment_creates_then_accumulates() {
    let mut t = FrequencyTable::new();
    assert_eq!(t.increment_at("nihao", "你好", 1, 100), 1);
    assert_eq!(t.increment_at("nihao", "你好", 2, 200), 3);
    let e = t.entry("nihao", "你好").unwrap();
    assert_eq!(e.score, 3);
    assert_eq!(e.last_used, 200);
    assert_eq!(t.len(), 1);
}

#[test]
fn test_increment_saturates() {
    let mut t = FrequencyTable::new();
    t.set_at("a", "x", u64::MAX - 1, 0);
    assert_eq!(t.increment_at("a", "x", 5, 0), u64::MAX);
}

#[test]
fn test_contexts_are_independent() {
    let mut t = FrequencyTable::new();
    t.increment_at("shi", "是", 4, 0);
    t.increment_at("shi", "时", 1, 0);
    t.increment_at("si", "是", 9, 0);
    assert_eq!(t.get("shi", "是"), 4);
    assert_eq!(t.get("si", "是"), 9);
    assert_eq!(t.len(), 3);
}

#[test]
fn test_top_for_context_order() {
    let mut t = FrequencyTable::new();
    t.increment_at("shi", "时", 2, 0);
    t.increment_at("shi", "是", 5, 0);
    t.increment_at("shi", "事", 2, 0);
    let top = t.top_for_context("shi", 10);
    assert_eq!(
        top,
        vec![
            ("是".to_string(), 5),
            ("事".to_string(), 2),
            ("时".to_string(), 2),
        ]
    );
    assert_eq!(t.top_for_context("shi", 1).len(), 1);
    assert!(t.top_for_context("none", 5).is_empty());
}

#[test]
fn test_high_frequency_across_contexts() {
    let mut t = FrequencyTable::new();
    t.increment_at("a", "x", 10, 0);
    t.increment_at("b", "y", 3, 0);
    t.increment_at("c", "z", 7, 0);
    let high = t.high_frequency(5, 10);
    let words: Vec<&str> = high.iter().map(|r| r.word.as_str()).collect();
    assert_eq!(words, vec!["x", "z"]);
}

#[test]
fn test_remove_and_clear() {
    let mut t = FrequencyTable::new();
    t.increment_at("a", "x", 1, 0);
    t.increment_at("a", "y", 1, 0);
    assert!(t.remove("a", "x"));
    assert!(!t.remove("a", "x"));
    assert!(!t.remove("missing", "x"));
    assert_eq!(t.len(), 1);
    t.clear();
    assert!(t.is_empty());
}

#[test]
fn test_prune_below() {
    let mut t = FrequencyTable::new();
    t.increment_at("a", "x", 1, 0);
    t.increment_at("a", "y", 5, 0);
    t.increment_at("b", "z", 2, 0);
    assert_eq!(t.prune_below(3), 2);
    assert_eq!(t.len(), 1);
    assert_eq!(t.get("a", "y"), 5);
}

#[test]
fn test_prune_unused() {
    let mut t = FrequencyTable::new();
    let now = 1_700_000_000;
    t.increment_at("a", "old", 9, now - 90 * 86_400);
    t.increment_at("a", "new", 1, now - 86_400);
    assert_eq!(t.prune_unused(30 * 86_400, now), 1);
    assert_eq!(t.get("a", "old"), 0);
    assert_eq!(t.get("a", "new"), 1);
}

// --- Checkpoint file ---

#[test]
fn test_serialize_roundtrip_keeps_seq() {
    let mut t = FrequencyTable::new();
    t.increment_at("nihao", "你好", 3, 42);
    t.seq = 17;
    let t2 = FrequencyTable::from_bytes(&t.to_bytes().unwrap()).unwrap();
    assert_eq!(t2.entry("nihao", "你好").unwrap().score, 3);
    assert_eq!(t2.entry("nihao", "你好").unwrap().last_used, 42);
    assert_eq!(t2.seq(), 17);
}

#[test]
fn test_from_bytes_rejects_garbage() {
    assert!(FrequencyTable::from_bytes(b"SYF").is_err());
    assert!(FrequencyTable::from_bytes(b"XXXX\x01rest").is_err());
    assert!(FrequencyTable::from_bytes(b"SYFQ\x09").is_err());
}

#[test]
fn test_open_nonexistent() {
    let t = FrequencyTable::open(Path::new("/nonexistent/path/user_frequency.syfq")).unwrap();
    assert!(t.is_empty());
}

#[test]
fn test_save_to_invalid_path() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, b"x").unwrap();
    let t = FrequencyTable::new();
    assert!(t.save(&blocker.join("nested.syfq")).is_err());
}

// --- Journal ---

#[test]
fn test_wal_path_appends_suffix() {
    let wal = FrequencyWal::new(Path::new("/tmp/user_frequency.syfq"));
    assert_eq!(wal.wal_path(), Path::new("/tmp/user_frequency.syfq.wal"));
}

#[test]
fn test_wal_append_and_replay() {
    let dir = tempfile::tempdir().unwrap();
    let cp = dir.path().join("freq.syfq");

    let mut wal = FrequencyWal::new(&cp);
    wal.append(&entry(1, "ni", "你", 1)).unwrap();
    wal.append(&entry(2, "ni", "你", 1)).unwrap();
    wal.append(&entry(3, "hao", "好", 1)).unwrap();
    assert_eq!(wal.entry_count(), 3);

    let mut t = FrequencyTable::new();
    let mut wal2 = FrequencyWal::new(&cp);
    assert_eq!(wal2.replay(&mut t).unwrap(), 3);
    assert_eq!(t.get("ni", "你"), 2);
    assert_eq!(t.get("hao", "好"), 1);
    assert_eq!(t.seq(), 3);
}

#[test]
fn test_wal_replay_skips_checkpointed_entries() {
    let dir = tempfile::tempdir().unwrap();
    let cp = dir.path().join("freq.syfq");

    let mut wal = FrequencyWal::new(&cp);
    wal.append(&entry(4, "ni", "你", 1)).unwrap();
    wal.append(&entry(5, "ni", "你", 1)).unwrap();
    wal.append(&entry(6, "ni", "你", 1)).unwrap();

    let mut t = FrequencyTable::new();
    t.increment_at("ni", "你", 10, 0);
    t.seq = 5;
    t.save(&cp).unwrap();

    let mut t = FrequencyTable::open(&cp).unwrap();
    let mut wal2 = FrequencyWal::new(&cp);
    assert_eq!(wal2.replay(&mut t).unwrap(), 1);
    assert_eq!(t.get("ni", "你"), 11);
    assert_eq!(wal2.entry_count(), 3);
}

#[test]
fn test_wal_compaction() {
    let dir = tempfile::tempdir().unwrap();
    let cp = dir.path().join("freq.syfq");

    let mut t = FrequencyTable::new();
    let mut wal = FrequencyWal::new(&cp);
    wal.append(&entry(1, "ni", "你", 1)).unwrap();
    t.apply_journal(&entry(1, "ni", "你", 1));
    assert!(wal.needs_compact(1));

    t.save(&cp).unwrap();
    wal.truncate_wal().unwrap();
    assert_eq!(wal.entry_count(), 0);
    assert_eq!(fs::read(wal.wal_path()).unwrap().len(), 0);

    let mut t2 = FrequencyTable::open(&cp).unwrap();
    let mut wal2 = FrequencyWal::new(&cp);
    assert_eq!(wal2.replay(&mut t2).unwrap(), 0);
    assert_eq!(t2.get("ni", "你"), 1);
}

#[test]
fn test_wal_truncated_frame() {
    let dir = tempfile::tempdir().unwrap();
    let cp = dir.path().join("freq.syfq");

    let mut wal = FrequencyWal::new(&cp);
    wal.append(&entry(1, "ni", "你", 1)).unwrap();
    wal.append(&entry(2, "hao", "好", 1)).unwrap();

    let data = fs::read(wal.wal_path()).unwrap();
    fs::write(wal.wal_path(), &data[..data.len() - 5]).unwrap();

    let mut t = FrequencyTable::new();
    let mut wal2 = FrequencyWal::new(&cp);
    assert_eq!(wal2.replay(&mut t).unwrap(), 1);
    assert_eq!(t.get("ni", "你"), 1);
    assert_eq!(t.get("hao", "好"), 0);
}

#[test]
fn test_wal_corrupt_crc() {
    let dir = tempfile::tempdir().unwrap();
    let cp = dir.path().join("freq.syfq");

    let mut wal = FrequencyWal::new(&cp);
    wal.append(&entry(1, "ni", "你", 1)).unwrap();
    wal.append(&entry(2, "hao", "好", 1)).unwrap();

    // Flip the last payload byte of the second frame.
    let mut data = fs::read(wal.wal_path()).unwrap();
    let last = data.len() - 1;
    data[last] ^= 0xFF;
    fs::write(wal.wal_path(), &data).unwrap();

    let mut t = FrequencyTable::new();
    let mut wal2 = FrequencyWal::new(&cp);
    assert_eq!(wal2.replay(&mut t).unwrap(), 1);
    assert_eq!(t.get("hao", "好"), 0);
}

// --- FrequencyStore ---

#[test]
fn test_store_in_memory() {
    let store = FrequencyStore::in_memory();
    assert!(store.is_available());
    assert!(store.path().is_none());
    store.increment("nihao", "你好", 1);
    store.increment("nihao", "你好", 1);
    assert_eq!(store.get("nihao", "你好"), 2);
    assert_eq!(store.len(), 1);
    store.flush().unwrap();
}

#[test]
fn test_store_unavailable_degrades() {
    let store = FrequencyStore::unavailable();
    assert!(!store.is_available());
    store.increment("nihao", "你好", 5);
    assert_eq!(store.get("nihao", "你好"), 0);
    assert!(store.top_for_context("nihao", 5).is_empty());
    assert!(!store.remove("nihao", "你好"));
    assert!(store.is_empty());
    assert!(matches!(store.flush(), Err(StoreError::Unavailable)));
    assert!(matches!(
        store.export_tsv(Vec::new()),
        Err(StoreError::Unavailable)
    ));
}

#[test]
fn test_store_durable_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_frequency.syfq");

    let store = FrequencyStore::open(&path, &freq_settings()).unwrap();
    assert_eq!(store.path(), Some(path.as_path()));
    store.increment("ni", "你", 1);
    store.increment("nihao", "你好", 3);
    store.close().unwrap();

    let store = FrequencyStore::open(&path, &freq_settings()).unwrap();
    assert_eq!(store.get("ni", "你"), 1);
    assert_eq!(store.get("nihao", "你好"), 3);
}

#[test]
fn test_store_drop_writes_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_frequency.syfq");
    {
        let store = FrequencyStore::open(&path, &freq_settings()).unwrap();
        store.increment("hao", "好", 2);
    }
    let t = FrequencyTable::open(&path).unwrap();
    assert_eq!(t.get("hao", "好"), 2);
    assert_eq!(fs::read(FrequencyWal::new(&path).wal_path()).unwrap().len(), 0);
}

#[test]
fn test_store_untouched_close_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_frequency.syfq");
    let store = FrequencyStore::open(&path, &freq_settings()).unwrap();
    assert_eq!(store.get("ni", "你"), 0);
    store.close().unwrap();
    assert!(!path.exists());
}

#[test]
fn test_store_flush_is_visible_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_frequency.syfq");
    let store = FrequencyStore::open(&path, &freq_settings()).unwrap();
    store.increment("ni", "你", 4);
    store.flush().unwrap();

    let t = FrequencyTable::open(&path).unwrap();
    assert_eq!(t.get("ni", "你"), 4);
    assert_eq!(t.seq(), 1);
}

#[test]
fn test_store_compacts_at_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_frequency.syfq");
    let mut settings = freq_settings();
    settings.journal_compact_threshold = 3;

    let store = FrequencyStore::open(&path, &settings).unwrap();
    for _ in 0..3 {
        store.increment("ni", "你", 1);
    }
    // The checkpoint request queues behind the three appends.
    store.flush().unwrap();
    assert_eq!(FrequencyTable::open(&path).unwrap().get("ni", "你"), 3);
    store.close().unwrap();

    let reopened = FrequencyStore::open(&path, &settings).unwrap();
    assert_eq!(reopened.get("ni", "你"), 3);
}

#[test]
fn test_store_concurrent_increments_survive_journal_replay() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 250;
    let total = THREADS * PER_THREAD;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_frequency.syfq");
    let mut settings = freq_settings();
    settings.journal_compact_threshold = usize::MAX;

    let store = FrequencyStore::open(&path, &settings).unwrap();
    std::thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..PER_THREAD {
                    store.increment_at("hao", "好", 1, 1_700_000_000);
                }
            });
        }
    });
    assert_eq!(store.get("hao", "好"), total as u64);

    // Replay the journal alone, as a restart after a crash would, once the
    // flusher has written every frame.
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
    let (table, frames) = loop {
        let mut table = FrequencyTable::new();
        let mut wal = FrequencyWal::new(&path);
        wal.replay(&mut table).unwrap();
        if wal.entry_count() == total || std::time::Instant::now() > deadline {
            break (table, wal.entry_count());
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    };
    assert_eq!(frames, total);
    assert!(!path.exists());
    assert_eq!(table.get("hao", "好"), total as u64);
    assert_eq!(table.seq(), total as u64);
    store.close().unwrap();
}

#[test]
fn test_store_corrupt_checkpoint_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_frequency.syfq");
    fs::write(&path, b"definitely not a checkpoint").unwrap();
    let err = FrequencyStore::open(&path, &freq_settings()).err().unwrap();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[test]
fn test_store_admin_ops_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_frequency.syfq");
    let store = FrequencyStore::open(&path, &freq_settings()).unwrap();
    store.increment("a", "x", 1);
    store.increment("a", "y", 8);
    store.set("b", "z", 20);
    assert!(store.remove("a", "x"));
    assert_eq!(store.prune_below(10), 1);
    store.close().unwrap();

    let store = FrequencyStore::open(&path, &freq_settings()).unwrap();
    assert_eq!(store.get("a", "x"), 0);
    assert_eq!(store.get("a", "y"), 0);
    assert_eq!(store.get("b", "z"), 20);
    store.clear();
    assert!(store.is_empty());
}

// --- TSV exchange ---

#[test]
fn test_export_format() {
    let store = FrequencyStore::in_memory();
    store.increment("nihao", "你好", 12);
    store.increment("ni", "你", 3);
    let mut out = Vec::new();
    assert_eq!(store.export_tsv(&mut out).unwrap(), 2);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "# SuYan User Word Frequency Export");
    assert_eq!(lines[1], "# Format: word\tcontext\tscore");
    assert_eq!(lines[2], "你好\tnihao\t12");
    assert_eq!(lines[3], "你\tni\t3");
}

#[test]
fn test_import_merge_keeps_larger() {
    let store = FrequencyStore::in_memory();
    store.increment("ni", "你", 5);
    store.increment("hao", "好", 1);
    let tsv = "# header\n\n你\tni\t2\n好\thao\t7\nbroken line\n坏\tbad\tNaN\n";
    let n = store.import_tsv(Cursor::new(tsv), ImportMode::Merge).unwrap();
    assert_eq!(n, 2);
    assert_eq!(store.get("ni", "你"), 5);
    assert_eq!(store.get("hao", "好"), 7);
}

#[test]
fn test_import_replace_clears_first() {
    let store = FrequencyStore::in_memory();
    store.increment("ni", "你", 5);
    let n = store
        .import_tsv(Cursor::new("好\thao\t2\r\n"), ImportMode::Replace)
        .unwrap();
    assert_eq!(n, 1);
    assert_eq!(store.get("ni", "你"), 0);
    assert_eq!(store.get("hao", "好"), 2);
}

#[test]
fn test_export_import_roundtrip_between_stores() {
    let a = FrequencyStore::in_memory();
    a.increment("shi", "是", 4);
    a.increment("shijian", "时间", 6);
    let mut buf = Vec::new();
    a.export_tsv(&mut buf).unwrap();

    let b = FrequencyStore::in_memory();
    b.import_tsv(Cursor::new(buf), ImportMode::Merge).unwrap();
    assert_eq!(b.get("shi", "是"), 4);
    assert_eq!(b.get("shijian", "时间"), 6);
}
