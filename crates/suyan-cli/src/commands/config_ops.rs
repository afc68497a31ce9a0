use std::fs;

use super::die;

pub fn settings_export() {
    print!("{}", suyan_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        suyan_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: frequency.compound_weight={}, merge.max_injected={}, learning.max_segments={}",
        s.frequency.compound_weight, s.merge.max_injected, s.learning.max_segments
    );
}
