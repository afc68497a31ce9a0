//! Append-only journal of frequency increments.
//!
//! Every increment becomes one small frame
//! `[len: u32 LE][crc32: u32 LE][bincode payload]`. A checkpoint writes the
//! whole table (including the last applied sequence number) and truncates
//! the journal; frames whose sequence number the checkpoint already covers
//! are skipped on replay.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::FrequencyTable;

const FRAME_HEADER: usize = 8;

/// A single journal entry: the arguments of one `increment_at` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub context: String,
    pub word: String,
    pub amount: u64,
    pub timestamp: u64,
}

/// Journal state that lives alongside a checkpoint file.
pub struct FrequencyWal {
    checkpoint_path: PathBuf,
    /// `<checkpoint>.wal`
    wal_path: PathBuf,
    /// Kept open in append mode between frames.
    file: Option<File>,
    /// Frames written or replayed since the last truncation.
    entry_count: usize,
}

impl FrequencyWal {
    pub fn new(checkpoint_path: &Path) -> Self {
        let mut wal_name = checkpoint_path.as_os_str().to_owned();
        wal_name.push(".wal");
        Self {
            checkpoint_path: checkpoint_path.to_path_buf(),
            wal_path: PathBuf::from(wal_name),
            file: None,
            entry_count: 0,
        }
    }

    /// Replay the journal into `table`. Stops at the first torn or corrupt
    /// frame. Returns the number of entries applied.
    pub fn replay(&mut self, table: &mut FrequencyTable) -> io::Result<usize> {
        let data = match fs::read(&self.wal_path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.entry_count = 0;
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let mut frames = 0;
        let mut applied = 0;
        let mut pos = 0;
        while pos + FRAME_HEADER <= data.len() {
            let length = read_u32(&data[pos..pos + 4]) as usize;
            let expected_crc = read_u32(&data[pos + 4..pos + 8]);

            if length == 0 || pos + FRAME_HEADER + length > data.len() {
                break; // torn frame
            }

            let payload = &data[pos + FRAME_HEADER..pos + FRAME_HEADER + length];
            if crc32fast::hash(payload) != expected_crc {
                break;
            }

            let Ok(entry) = bincode::deserialize::<WalEntry>(payload) else {
                break;
            };
            if table.apply_journal(&entry) {
                applied += 1;
            }
            frames += 1;
            pos += FRAME_HEADER + length;
        }

        self.entry_count = frames;
        Ok(applied)
    }

    pub fn append(&mut self, entry: &WalEntry) -> io::Result<()> {
        let payload = bincode::serialize(entry).map_err(io::Error::other)?;
        let length = u32::try_from(payload.len()).map_err(io::Error::other)?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(FRAME_HEADER + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);
        self.open_file()?.write_all(&frame)?;

        self.entry_count += 1;
        Ok(())
    }

    fn open_file(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.wal_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.wal_path)?;
            self.file = Some(f);
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("journal file not open"))
    }

    pub fn needs_compact(&self, threshold: usize) -> bool {
        self.entry_count >= threshold
    }

    /// Truncate the journal. Call only after a checkpoint has been written.
    pub fn truncate_wal(&mut self) -> io::Result<()> {
        self.file = None;
        File::create(&self.wal_path)?;
        self.entry_count = 0;
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
