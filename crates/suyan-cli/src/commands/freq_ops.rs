use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use suyan_core::frequency::now_epoch;
use suyan_core::{FrequencyRecord, FrequencyStore, ImportMode, Settings};

use super::die;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

pub fn default_store_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    format!("{home}/Library/Rime/user_frequency.syfq")
}

fn open(path: &Path) -> FrequencyStore {
    die!(
        FrequencyStore::open(path, &Settings::default().frequency),
        "Error opening frequency store: {}"
    )
}

/// Write a final checkpoint so the change is on disk before exit.
fn close(store: FrequencyStore) {
    die!(store.close(), "Error saving frequency store: {}");
}

pub fn format_records(records: &[FrequencyRecord]) -> String {
    let mut out = String::new();
    for r in records {
        out.push_str(&format!("{}\t{}\t{}\n", r.context, r.word, r.score));
    }
    out
}

pub fn list(path: &Path, context: Option<&str>) {
    let store = open(path);
    let records: Vec<FrequencyRecord> = store
        .snapshot()
        .into_iter()
        .filter(|r| context.map_or(true, |c| r.context == c))
        .collect();
    if records.is_empty() {
        println!("(empty)");
    } else {
        print!("{}", format_records(&records));
        println!("---");
        println!("{} entries", records.len());
    }
}

pub fn top(path: &Path, context: &str, n: usize) {
    let store = open(path);
    let top = store.top_for_context(context, n);
    if top.is_empty() {
        println!("(no learned words for {context})");
        return;
    }
    for (i, (word, score)) in top.iter().enumerate() {
        println!("#{:>2}: {word}\t{score}", i + 1);
    }
}

pub fn get(path: &Path, context: &str, word: &str) {
    let store = open(path);
    match store.entry(context, word) {
        Some(entry) => println!(
            "{context}\t{word}\tscore={}\tlast_used={}",
            entry.score, entry.last_used
        ),
        None => println!("Not found: {context} → {word}"),
    }
}

pub fn set(path: &Path, context: &str, word: &str, score: u64) {
    let store = open(path);
    store.set(context, word, score);
    close(store);
    println!("Set: {context} → {word} = {score}");
}

pub fn remove(path: &Path, context: &str, word: &str) {
    let store = open(path);
    if store.remove(context, word) {
        close(store);
        println!("Removed: {context} → {word}");
    } else {
        println!("Not found: {context} → {word}");
    }
}

/// `out == "-"` writes to stdout.
pub fn export(path: &Path, out: &str) {
    let store = open(path);
    if out == "-" {
        die!(store.export_tsv(io::stdout().lock()), "Error writing: {}");
        return;
    }
    let file = die!(File::create(out), "Error creating {out}: {}");
    let mut writer = BufWriter::new(file);
    let n = die!(store.export_tsv(&mut writer), "Error exporting: {}");
    die!(writer.flush(), "Error writing {out}: {}");
    println!("Exported {n} entries to {out}");
}

pub fn import(path: &Path, input: &str, replace: bool) {
    let store = open(path);
    let file = die!(File::open(input), "Error opening {input}: {}");
    let mode = if replace {
        ImportMode::Replace
    } else {
        ImportMode::Merge
    };
    let n = die!(
        store.import_tsv(BufReader::new(file), mode),
        "Error importing: {}"
    );
    let total = store.len();
    close(store);
    println!("Imported {n} entries ({total} total)");
}

pub fn prune(path: &Path, below: Option<u64>, unused_days: Option<u64>) {
    if below.is_none() && unused_days.is_none() {
        eprintln!("Nothing to prune: pass --below and/or --unused-days");
        std::process::exit(2);
    }
    let store = open(path);
    let mut removed = 0;
    if let Some(min_score) = below {
        removed += store.prune_below(min_score);
    }
    if let Some(days) = unused_days {
        removed += store.prune_unused(days.saturating_mul(SECS_PER_DAY), now_epoch());
    }
    close(store);
    println!("Pruned {removed} entries");
}

pub fn clear(path: &Path) {
    let store = open(path);
    let n = store.len();
    store.clear();
    close(store);
    println!("Cleared {n} entries");
}
