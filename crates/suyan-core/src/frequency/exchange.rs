//! Tab-separated export/import of learned frequencies.
//!
//! ```text
//! # SuYan User Word Frequency Export
//! # Format: word<TAB>context<TAB>score
//! 你好	nihao	12
//! ```

use std::io::{self, BufRead, Write};

use super::{now_epoch, FrequencyRecord, FrequencyTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep the larger of the existing and imported score.
    Merge,
    /// Clear the table before importing.
    Replace,
}

pub(super) fn write_tsv<W: Write>(records: &[FrequencyRecord], mut writer: W) -> io::Result<usize> {
    writeln!(writer, "# SuYan User Word Frequency Export")?;
    writeln!(writer, "# Format: word\tcontext\tscore")?;
    for rec in records {
        writeln!(writer, "{}\t{}\t{}", rec.word, rec.context, rec.score)?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Parse export lines. Comments, blank lines and malformed lines are skipped.
pub(super) fn read_tsv<R: BufRead>(reader: R) -> io::Result<Vec<FrequencyRecord>> {
    let now = now_epoch();
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(word), Some(context), Some(score)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let Ok(score) = score.trim().parse::<u64>() else {
            continue;
        };
        if word.is_empty() {
            continue;
        }
        records.push(FrequencyRecord {
            context: context.to_string(),
            word: word.to_string(),
            score,
            last_used: now,
        });
    }
    Ok(records)
}

pub(super) fn import_records(
    table: &mut FrequencyTable,
    records: Vec<FrequencyRecord>,
    mode: ImportMode,
) -> usize {
    if mode == ImportMode::Replace {
        table.clear();
    }
    let count = records.len();
    for rec in records {
        let existing = table.get(&rec.context, &rec.word);
        if mode == ImportMode::Replace || rec.score > existing {
            table.set_at(&rec.context, &rec.word, rec.score, rec.last_used);
        }
    }
    count
}
