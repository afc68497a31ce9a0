use std::io;
use std::sync::{mpsc, Arc, RwLock};
use std::thread;

use tracing::{debug, debug_span, warn};

use super::wal::{FrequencyWal, WalEntry};
use super::FrequencyTable;

enum FlushCommand {
    Append(WalEntry),
    Checkpoint(Option<mpsc::Sender<io::Result<()>>>),
}

/// Background thread owning the journal file and the checkpoint writes.
pub(super) struct Flusher {
    tx: Option<mpsc::Sender<FlushCommand>>,
    handle: Option<thread::JoinHandle<io::Result<()>>>,
}

impl Flusher {
    pub fn spawn(
        table: Arc<RwLock<FrequencyTable>>,
        wal: FrequencyWal,
        checkpoint_seq: u64,
        compact_threshold: usize,
    ) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<FlushCommand>();
        let handle = thread::Builder::new()
            .name("suyan-flush".into())
            .spawn(move || flush_worker(rx, table, wal, checkpoint_seq, compact_threshold))?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn append(&self, entry: WalEntry) {
        self.send(FlushCommand::Append(entry));
    }

    pub fn request_checkpoint(&self) {
        self.send(FlushCommand::Checkpoint(None));
    }

    pub fn checkpoint_blocking(&self) -> io::Result<()> {
        let (ack_tx, ack_rx) = mpsc::channel();
        let Some(tx) = &self.tx else {
            return Err(io::Error::other("flusher stopped"));
        };
        tx.send(FlushCommand::Checkpoint(Some(ack_tx)))
            .map_err(|_| io::Error::other("flusher stopped"))?;
        ack_rx
            .recv()
            .map_err(|_| io::Error::other("flusher stopped"))?
    }

    /// Close the channel and wait for the final checkpoint.
    pub fn shutdown(&mut self) -> io::Result<()> {
        self.tx = None;
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| io::Error::other("flusher thread panicked"))?,
            None => Ok(()),
        }
    }

    fn send(&self, command: FlushCommand) {
        let sent = self.tx.as_ref().is_some_and(|tx| tx.send(command).is_ok());
        if !sent {
            warn!("flusher stopped, journal record lost");
        }
    }
}

impl Drop for Flusher {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "final checkpoint failed");
        }
    }
}

fn flush_worker(
    rx: mpsc::Receiver<FlushCommand>,
    table: Arc<RwLock<FrequencyTable>>,
    mut wal: FrequencyWal,
    mut checkpoint_seq: u64,
    compact_threshold: usize,
) -> io::Result<()> {
    // Replayed journal frames are folded into the final checkpoint.
    let mut dirty = wal.entry_count() > 0;
    while let Ok(command) = rx.recv() {
        match command {
            FlushCommand::Append(entry) => {
                if entry.seq <= checkpoint_seq {
                    continue;
                }
                dirty = true;
                if let Err(e) = wal.append(&entry) {
                    warn!(error = %e, "journal append failed");
                    continue;
                }
                if wal.needs_compact(compact_threshold) {
                    match checkpoint(&table, &mut wal) {
                        Ok(seq) => {
                            checkpoint_seq = seq;
                            dirty = false;
                        }
                        Err(e) => warn!(error = %e, "compaction failed"),
                    }
                }
            }
            FlushCommand::Checkpoint(ack) => {
                let result = checkpoint(&table, &mut wal).map(|seq| {
                    checkpoint_seq = seq;
                    dirty = false;
                });
                match ack {
                    Some(ack) => {
                        let _ = ack.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            warn!(error = %e, "checkpoint failed");
                        }
                    }
                }
            }
        }
    }
    if !dirty {
        return Ok(());
    }
    checkpoint(&table, &mut wal).map(|_| ())
}

/// Write the full table and truncate the journal. Returns the sequence
/// number the checkpoint covers.
fn checkpoint(table: &RwLock<FrequencyTable>, wal: &mut FrequencyWal) -> io::Result<u64> {
    let _span = debug_span!("checkpoint").entered();
    let snapshot = table
        .read()
        .map_err(|_| io::Error::other("frequency table lock poisoned"))?
        .clone();
    snapshot.save(wal.checkpoint_path())?;
    wal.truncate_wal()?;
    debug!(entries = snapshot.len(), seq = snapshot.seq(), "checkpoint written");
    Ok(snapshot.seq())
}
