// Applier position + liveness, and the polling loop that keeps them fresh.
//
// Mirrors `read_current_relay_info` / `rli_reader_thread` from the original
// tool: a tight 10ms loop re-reads the position file every tick, and every
// 200th tick (~2s) polls `SHOW SLAVE STATUS` for liveness.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use mysql::Conn;
use tracing::{error, info, warn};

use crate::db;

/// The applier's current relay-log file and byte offset within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub relay_file_path: PathBuf,
    pub byte_offset: u64,
}

/// Mutex-guarded Position, written only by the tracker (spec.md's
/// "Position" data model entry).
pub struct SharedPosition {
    inner: Mutex<Position>,
}

impl SharedPosition {
    pub fn new(initial: Position) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    pub fn snapshot(&self) -> Position {
        self.inner.lock().unwrap().clone()
    }

    fn set(&self, position: Position) {
        *self.inner.lock().unwrap() = position;
    }
}

/// Parses the applier's position file: the first line starting with `.` or
/// `/` is the relay-log file (joined under `datadir` if relative), and the
/// very next line is the decimal byte offset. All other lines are ignored.
/// Pure and independently testable, matching `read_current_relay_info`.
pub fn parse_position_file(contents: &str, datadir: &Path) -> Option<Position> {
    let mut lines = contents.lines();
    while let Some(line) = lines.next() {
        let relay_file_path = if let Some(rest) = line.strip_prefix("./") {
            datadir.join(rest)
        } else if line.starts_with('/') {
            PathBuf::from(line)
        } else {
            continue;
        };

        let offset_line = lines.next()?;
        let byte_offset: u64 = offset_line.trim().parse().ok()?;
        return Some(Position {
            relay_file_path,
            byte_offset,
        });
    }
    None
}

fn read_position_file(path: &Path, datadir: &Path) -> Result<Position> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading applier position file {}", path.display()))?;
    parse_position_file(&contents, datadir)
        .with_context(|| format!("position file {} has no recognizable position", path.display()))
}

/// Runs the tracker loop until `shutdown` is observed. `admin_conn` is used
/// only for the periodic `SHOW SLAVE STATUS` poll; its loss is fatal and
/// flips `shutdown`.
pub fn run_tracker(
    position_file: PathBuf,
    datadir: PathBuf,
    shared_position: Arc<SharedPosition>,
    sql_thread_running: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    mut admin_conn: Conn,
) {
    let mut tick: u64 = 0;
    loop {
        match read_position_file(&position_file, &datadir) {
            Ok(position) => shared_position.set(position),
            Err(e) => error!(error = %e, "failed to read applier position file"),
        }

        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        std::thread::sleep(Duration::from_millis(10));
        tick += 1;

        if tick % 200 == 0 {
            match db::fetch_slave_sql_running(&mut admin_conn) {
                Ok(Some(running)) => {
                    let was_running = sql_thread_running.swap(running, Ordering::SeqCst);
                    if was_running && !running {
                        warn!("SQL thread is not running, pausing prefetch until it resumes");
                    } else if !was_running && running {
                        info!("SQL thread resumed, resuming prefetch");
                    }
                }
                Ok(None) => {
                    warn!("SHOW SLAVE STATUS returned no row, no replication channel configured");
                }
                Err(e) => {
                    error!(error = %e, "fatal error polling SHOW SLAVE STATUS, shutting down");
                    shutdown.store(true, Ordering::SeqCst);
                    break;
                }
            }
        }
    }
    info!("applier-position tracker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_relative_relay_file() {
        let contents = "# info file\n./relay-bin.000042\n1234\n";
        let pos = parse_position_file(contents, Path::new("/var/lib/mysql")).unwrap();
        assert_eq!(pos.relay_file_path, PathBuf::from("/var/lib/mysql/relay-bin.000042"));
        assert_eq!(pos.byte_offset, 1234);
    }

    #[test]
    fn parses_absolute_relay_file() {
        let contents = "/data/mysql/relay-bin.000007\n987654\n";
        let pos = parse_position_file(contents, Path::new("/unused")).unwrap();
        assert_eq!(pos.relay_file_path, PathBuf::from("/data/mysql/relay-bin.000007"));
        assert_eq!(pos.byte_offset, 987654);
    }

    #[test]
    fn ignores_unrelated_leading_lines() {
        let contents = "master-bin.000001\n100\n./relay-bin.000002\n200\n";
        let pos = parse_position_file(contents, Path::new("/d")).unwrap();
        assert_eq!(pos.relay_file_path, PathBuf::from("/d/relay-bin.000002"));
        assert_eq!(pos.byte_offset, 200);
    }

    #[test]
    fn malformed_file_yields_none() {
        assert!(parse_position_file("nothing useful here\n", Path::new("/d")).is_none());
    }

    #[test]
    fn shared_position_roundtrips() {
        let shared = SharedPosition::new(Position {
            relay_file_path: PathBuf::from("/a"),
            byte_offset: 0,
        });
        shared.set(Position {
            relay_file_path: PathBuf::from("/b"),
            byte_offset: 42,
        });
        let snap = shared.snapshot();
        assert_eq!(snap.byte_offset, 42);
        assert_eq!(snap.relay_file_path, PathBuf::from("/b"));
    }
}
