use std::fs;
use std::path::Path;

use serde::Serialize;
use suyan_core::settings::parse_settings_toml;
use suyan_core::{CandidateMerger, FrequencyStore, MergedCandidate, Settings};

use super::die;

#[derive(Serialize)]
struct MergeReport<'a> {
    context: &'a str,
    capacity: Option<usize>,
    candidates: &'a [MergedCandidate],
}

pub fn render(
    context: &str,
    capacity: Option<usize>,
    merged: &[MergedCandidate],
    json: bool,
) -> Result<String, serde_json::Error> {
    if json {
        let report = MergeReport {
            context,
            capacity,
            candidates: merged,
        };
        return serde_json::to_string_pretty(&report);
    }
    let mut out = String::new();
    for (i, c) in merged.iter().enumerate() {
        let origin = match c.origin {
            suyan_core::CandidateOrigin::Engine => "",
            suyan_core::CandidateOrigin::Learned => " (learned)",
        };
        out.push_str(&format!("#{:>2}: {}\t{}{}\n", i + 1, c.word, c.score, origin));
    }
    Ok(out)
}

/// Show how `candidates` would be re-ranked for `context`.
pub fn merge(
    path: &Path,
    context: &str,
    candidates: &[String],
    capacity: Option<usize>,
    settings_file: Option<&str>,
    json: bool,
) {
    let settings = match settings_file {
        Some(file) => {
            let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
            die!(parse_settings_toml(&content), "Error: {}")
        }
        None => Settings::default(),
    };
    let store = die!(
        FrequencyStore::open(path, &settings.frequency),
        "Error opening frequency store: {}"
    );
    let merger = CandidateMerger::new(settings.merge);
    let merged = merger.merge_scored(&store, candidates, context, capacity);
    let text = die!(render(context, capacity, &merged, json), "Error: {}");
    print!("{text}");
    if json {
        println!();
    }
}
