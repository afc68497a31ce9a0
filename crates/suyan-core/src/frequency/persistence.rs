use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{FrequencyEntry, FrequencyRecord, FrequencyTable};

const MAGIC: &[u8; 4] = b"SYFQ";
const VERSION: u8 = 1;

/// Flat serialization format for bincode.
#[derive(Serialize, Deserialize)]
struct FrequencyData {
    seq: u64,
    records: Vec<FrequencyRecord>,
}

impl FrequencyTable {
    /// Serialize to bytes (SYFQ format).
    pub fn to_bytes(&self) -> Result<Vec<u8>, io::Error> {
        let data = FrequencyData {
            seq: self.seq,
            records: self.records(),
        };
        let body = bincode::serialize(&data).map_err(io::Error::other)?;

        let mut buf = Vec::with_capacity(5 + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Deserialize from bytes (SYFQ format).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, io::Error> {
        if bytes.len() < 5 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "too short"));
        }
        if &bytes[0..4] != MAGIC {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad magic"));
        }
        if bytes[4] != VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unsupported version",
            ));
        }
        let data: FrequencyData = bincode::deserialize(&bytes[5..])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut table = FrequencyTable::new();
        table.seq = data.seq;
        for rec in data.records {
            table.entries.entry(rec.context).or_default().insert(
                rec.word,
                FrequencyEntry {
                    score: rec.score,
                    last_used: rec.last_used,
                },
            );
        }
        Ok(table)
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), io::Error> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Open from file, returning an empty table if the file doesn't exist.
    pub fn open(path: &Path) -> Result<Self, io::Error> {
        match fs::read(path) {
            Ok(bytes) => Self::from_bytes(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e),
        }
    }
}
