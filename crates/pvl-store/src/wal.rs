use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pvl_types::{Actor, Batch, LedgerEntry};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{poisoned, StoreError, StoreResult};

/// A single durable state change.
///
/// Records only ever add facts: no record type rewrites an existing ledger
/// entry, and the in-memory tables are exactly the replay of the log.
///
/// On-disk framing:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized WalRecord)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalRecord {
    /// A new actor joined the directory.
    ActorRegistered(Actor),
    /// Display metadata of an existing actor changed.
    ActorUpdated(Actor),
    /// A batch and its genesis entry, committed together.
    BatchCreated { batch: Batch, genesis: LedgerEntry },
    /// A transition entry; the batch status follows from its action.
    EntryAppended { entry: LedgerEntry },
}

/// Flush/sync strategy for the WAL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `fsync` after every write (safest, highest latency).
    EveryWrite,
    /// Flush to the OS and rely on page-cache write-back.
    #[default]
    OsDefault,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

struct WalWriter {
    writer: BufWriter<File>,
    offset: u64,
    /// Set when a failed append could not be rolled back.
    failed: bool,
}

/// Crash-recoverable, append-only write-ahead log.
///
/// Records are serialized with bincode, framed with a length prefix and a
/// CRC32 checksum, and written to a single file. On open the file is read
/// front-to-back. A bad frame at the very end is a torn write and is cut off
/// so later appends start on a frame boundary. A bad frame followed by any
/// well-formed frame is corruption: `open` fails and the file is left as is.
pub struct WriteAheadLog {
    path: PathBuf,
    writer: Mutex<WalWriter>,
    sync_mode: SyncMode,
}

impl WriteAheadLog {
    /// Open (or create) the log at `path` and return every recoverable record.
    pub fn open(path: &Path, sync_mode: SyncMode) -> StoreResult<(Self, Vec<WalRecord>)> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)?;

        let bytes = fs::read(path)?;
        let (records, valid_len) = Self::scan(&bytes)?;
        let file_len = bytes.len() as u64;
        if valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len,
                file_len,
                "discarding torn WAL tail"
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        let file = OpenOptions::new().append(true).open(path)?;
        let wal = Self {
            path: path.to_path_buf(),
            writer: Mutex::new(WalWriter {
                writer: BufWriter::new(file),
                offset: valid_len,
                failed: false,
            }),
            sync_mode,
        };
        debug!(path = %path.display(), recovered = records.len(), "WAL opened");
        Ok((wal, records))
    }

    /// Append a single record. Returns the byte offset of the record.
    ///
    /// A failed write is rolled back to the previous frame boundary. If the
    /// rollback itself fails, every later append returns `Unavailable`.
    pub fn append(&self, record: &WalRecord) -> StoreResult<u64> {
        let payload =
            bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len())
            .map_err(|_| StoreError::Serialization("record exceeds 4 GiB".into()))?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);

        let mut w = self.writer.lock().map_err(poisoned)?;
        if w.failed {
            return Err(StoreError::Unavailable(format!(
                "WAL {} failed an earlier write",
                self.path.display()
            )));
        }
        let record_offset = w.offset;

        if let Err(err) = self.write_frame(&mut w.writer, &frame) {
            warn!(offset = record_offset, error = %err, "WAL append failed; rolling back");
            if let Err(rollback) = self.rollback(&mut w) {
                error!(error = %rollback, "WAL rollback failed; refusing further writes");
                w.failed = true;
            }
            return Err(err.into());
        }

        w.offset += frame.len() as u64;

        debug!(offset = record_offset, len = payload.len(), "WAL append");
        Ok(record_offset)
    }

    /// Current write offset.
    pub fn offset(&self) -> StoreResult<u64> {
        Ok(self.writer.lock().map_err(poisoned)?.offset)
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_frame(&self, writer: &mut BufWriter<File>, frame: &[u8]) -> io::Result<()> {
        writer.write_all(frame)?;
        writer.flush()?;
        if self.sync_mode == SyncMode::EveryWrite {
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }

    /// Drop buffered bytes and cut the file back to the last frame boundary.
    fn rollback(&self, w: &mut WalWriter) -> io::Result<()> {
        let fresh = BufWriter::new(OpenOptions::new().append(true).open(&self.path)?);
        let stale = std::mem::replace(&mut w.writer, fresh);
        // Discard the buffer without flushing it.
        let (file, _) = stale.into_parts();
        drop(file);

        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.set_len(w.offset)?;
        file.sync_all()
    }

    /// Decode every record and return the length of the well-framed prefix.
    fn scan(bytes: &[u8]) -> StoreResult<(Vec<WalRecord>, u64)> {
        let mut records = Vec::new();
        let mut offset = 0usize;

        while offset < bytes.len() {
            let Some(payload) = frame_at(bytes, offset) else {
                if let Some(next) = next_frame_after(bytes, offset) {
                    return Err(StoreError::Corrupt(format!(
                        "bad WAL frame at byte {offset} followed by a valid frame at byte {next}"
                    )));
                }
                warn!(offset, len = bytes.len(), "incomplete WAL frame at end of log");
                break;
            };

            let record = bincode::deserialize::<WalRecord>(payload).map_err(|e| {
                StoreError::Corrupt(format!("undecodable WAL record at byte {offset}: {e}"))
            })?;
            records.push(record);
            offset += HEADER_SIZE + payload.len();
        }

        Ok((records, offset as u64))
    }
}

/// Payload of the frame starting at `offset`, if the frame is complete and
/// its checksum matches.
fn frame_at(bytes: &[u8], offset: usize) -> Option<&[u8]> {
    let header = bytes.get(offset..offset.checked_add(HEADER_SIZE)?)?;
    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if length == 0 {
        return None;
    }
    let start = offset + HEADER_SIZE;
    let payload = bytes.get(start..start.checked_add(length)?)?;
    (crc32fast::hash(payload) == expected_crc).then_some(payload)
}

/// First position after a bad frame at `bad` where a valid frame starts.
fn next_frame_after(bytes: &[u8], bad: usize) -> Option<usize> {
    (bad + 1..bytes.len()).find(|&p| frame_at(bytes, p).is_some())
}
