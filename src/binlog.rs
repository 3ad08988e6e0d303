// Thin adapter over `mysql_common`'s binlog event codec, pointed at a local
// relay-log file instead of a network replication stream.
//
// The replica's relay log is byte-for-byte the same wire format as a
// master's binary log: each event is a 19-byte common header (timestamp,
// type, server id, total length, next position, flags) followed by a
// type-specific body. `EventStreamReader` only knows how to decode a
// buffer of those bytes into a typed `Event` - framing the bytes off disk
// is this module's job, the same way a replication client frames them off
// a packet from the network.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use mysql_common::binlog::consts::{BinlogVersion, EventType};
use mysql_common::binlog::events::{Event, QueryEvent, RotateEvent};
use mysql_common::binlog::EventStreamReader;

/// A write-statement event or relay-log rotation, owned end to end from
/// the reader through to the worker that executes (or discards) it.
#[derive(Debug, Clone)]
pub enum EventRecord {
    Query {
        query: String,
        db: String,
        server_id: u32,
        timestamp: u32,
        header_pos: u64,
        event_length: u32,
    },
    Rotate {
        next_file: String,
        next_pos: u64,
        server_id: u32,
    },
    Other,
}

/// Metadata the reader needs about an event independent of its payload.
pub struct EventMeta {
    pub current_pos: u64,
    pub next_pos: u64,
    pub timestamp: u32,
    pub server_id: u32,
}

pub enum ReadOutcome {
    Event(EventRecord, EventMeta),
    Eof,
}

const EVENT_HEADER_LEN: usize = 19;

/// A relay-log file opened at a given byte offset, ready to stream events.
pub struct RelayLogFile {
    file: BufReader<File>,
    reader: EventStreamReader,
    pos: u64,
}

/// First four bytes of every binlog/relay-log file: the fixed magic number.
const BINLOG_MAGIC_LEN: u64 = 4;

fn read_raw_event(file: &mut BufReader<File>) -> io::Result<Option<Vec<u8>>> {
    let mut header = [0u8; EVENT_HEADER_LEN];
    match file.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let event_length = u32::from_le_bytes(header[9..13].try_into().unwrap()) as usize;
    if event_length < EVENT_HEADER_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "event length smaller than common header"));
    }

    let mut buf = vec![0u8; event_length];
    buf[..EVENT_HEADER_LEN].copy_from_slice(&header);
    file.read_exact(&mut buf[EVENT_HEADER_LEN..])?;
    Ok(Some(buf))
}

impl RelayLogFile {
    /// Opens `path` and seeks to `start_pos`, matching the original's
    /// `connect_binlog_file` + `set_position`. Up to 10 retries spaced
    /// ~1ms apart absorb the open racing a relay-log rotation in progress.
    pub fn open(path: &Path, start_pos: u64) -> Result<Self> {
        let mut last_err = None;
        for _ in 0..10 {
            match File::open(path) {
                Ok(mut file) => {
                    file.seek(SeekFrom::Start(start_pos))
                        .with_context(|| format!("seeking {} to {start_pos}", path.display()))?;
                    return Ok(Self {
                        file: BufReader::new(file),
                        reader: EventStreamReader::new(BinlogVersion::Version4),
                        pos: start_pos,
                    });
                }
                Err(e) => {
                    last_err = Some(e);
                    std::thread::sleep(std::time::Duration::from_micros(1000));
                }
            }
        }
        Err(last_err.unwrap()).with_context(|| format!("opening relay log {}", path.display()))
    }

    /// Opens `path` at the very start of the stream and reads the first
    /// event (the format-description event) purely to learn the local
    /// server id, per spec.md step "On the very first iteration of the
    /// program's lifetime only".
    pub fn discover_local_server_id(path: &Path) -> Result<u32> {
        let mut rlf = Self::open(path, BINLOG_MAGIC_LEN)?;
        match rlf.read_next()? {
            ReadOutcome::Event(_, meta) => Ok(meta.server_id),
            ReadOutcome::Eof => Err(anyhow!("relay log is empty, cannot determine server id")),
        }
    }

    /// Blocking-style read of the next event. Returns `Eof` when the
    /// underlying file has no more complete events buffered (the reader is
    /// expected to sleep briefly and retry - this function does not sleep
    /// itself).
    pub fn read_next(&mut self) -> Result<ReadOutcome> {
        let Some(raw) = read_raw_event(&mut self.file).context("reading relay log event bytes")? else {
            return Ok(ReadOutcome::Eof);
        };

        let event: Event = self
            .reader
            .read(&raw)
            .map_err(|e| anyhow!("decoding binlog event: {e:?}"))?;
        let header = event.header();

        let current_pos = self.pos;
        let event_size = header.event_size();
        self.pos = current_pos + u64::from(event_size);

        let meta = EventMeta {
            current_pos,
            next_pos: self.pos,
            timestamp: header.timestamp(),
            server_id: header.server_id(),
        };

        let event_type = header
            .event_type()
            .map_err(|code| anyhow!("unknown binlog event type {code}"))?;

        let record = match event_type {
            EventType::QUERY_EVENT => {
                let q: QueryEvent = event.read_event().context("decoding QueryEvent")?;
                EventRecord::Query {
                    query: q.query().into_owned(),
                    db: q.schema().into_owned(),
                    server_id: meta.server_id,
                    timestamp: meta.timestamp,
                    header_pos: current_pos,
                    event_length: event_size,
                }
            }
            EventType::ROTATE_EVENT => {
                let r: RotateEvent = event.read_event().context("decoding RotateEvent")?;
                EventRecord::Rotate {
                    next_file: r.name().into_owned(),
                    next_pos: r.position(),
                    server_id: meta.server_id,
                }
            }
            _ => EventRecord::Other,
        };

        Ok(ReadOutcome::Event(record, meta))
    }
}

#[cfg(test)]
mod tests {
    // `RelayLogFile` needs a real on-disk relay log to exercise end to end;
    // the framing helper is covered directly below, and event-classification
    // logic is covered indirectly via `reader`/`worker` tests that construct
    // `EventRecord` values directly.

    use super::*;

    fn make_event_bytes(event_length: u32, body: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; EVENT_HEADER_LEN];
        buf[9..13].copy_from_slice(&event_length.to_le_bytes());
        buf.extend_from_slice(body);
        buf
    }

    #[test]
    fn reads_eof_on_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        File::create(&path).unwrap();
        let mut file = BufReader::new(File::open(&path).unwrap());
        assert!(read_raw_event(&mut file).unwrap().is_none());
    }

    #[test]
    fn frames_one_full_event_from_header_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one-event");
        let body = vec![0xAB; 11];
        let event_length = (EVENT_HEADER_LEN + body.len()) as u32;
        let raw = make_event_bytes(event_length, &body);
        std::fs::write(&path, &raw).unwrap();

        let mut file = BufReader::new(File::open(&path).unwrap());
        let framed = read_raw_event(&mut file).unwrap().unwrap();
        assert_eq!(framed.len(), event_length as usize);
        assert!(read_raw_event(&mut file).unwrap().is_none());
    }

    #[test]
    fn rejects_event_length_shorter_than_header() {
        let mut buf = vec![0u8; EVENT_HEADER_LEN];
        buf[9..13].copy_from_slice(&10u32.to_le_bytes());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad");
        std::fs::write(&path, &buf).unwrap();

        let mut file = BufReader::new(File::open(&path).unwrap());
        assert!(read_raw_event(&mut file).is_err());
    }
}
