// Status publisher: periodic human-readable snapshot, atomically replaced.
// See spec.md §4.6. `render` is pure and independently testable; `publish`
// does the temp-file-plus-rename dance so readers never observe a torn
// write.

use std::io::Write as _;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::error;

use crate::stats::StatsCounters;
use crate::world::World;

pub struct StatusSnapshot {
    pub relay_file_path: String,
    pub relay_log_pos: u64,
    pub applier_timestamp: u32,
    pub prefetch_timestamp: u32,
    pub prefetch_position: u64,
    pub sql_thread_running: bool,
    pub shutdown: bool,
    pub stats: StatsCounters,
}

fn compose_snapshot(world: &World) -> StatusSnapshot {
    let position = world.shared_position.snapshot();
    StatusSnapshot {
        relay_file_path: position.relay_file_path.display().to_string(),
        relay_log_pos: position.byte_offset,
        applier_timestamp: world.applier_timestamp.load(Ordering::SeqCst),
        prefetch_timestamp: world.prefetch_timestamp.load(Ordering::SeqCst),
        prefetch_position: world.prefetch_position.load(Ordering::SeqCst),
        sql_thread_running: world.sql_thread_running.load(Ordering::SeqCst),
        shutdown: world.shutdown.load(Ordering::SeqCst),
        stats: world.stats.snapshot(),
    }
}

fn bool_str(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

pub fn render(snapshot: &StatusSnapshot) -> String {
    let s = &snapshot.stats;
    format!(
        "Status:\n\
         \x20 Relay log file: {}\n\
         \x20 Relay log (SQL thread) position: {}\n\
         \x20 SQL thread timestamp: {}\n\
         \x20 Prefetch event timestamp: {}\n\
         \x20 Prefetch event position: {}\n\
         \x20 Is SQL thread running: {}\n\
         \x20 Shutdown program: {}\n\
         Statistics:\n\
         \x20 Parsed binlog events: {}\n\
         \x20 Skipped binlog events by offset: {}\n\
         \x20 Unrelated binlog events: {}\n\
         \x20 Queries discarded in front: {}\n\
         \x20 Queries pushed to workers: {}\n\
         \x20 Queries popped by workers: {}\n\
         \x20 Old queries popped by workers: {}\n\
         \x20 Queries discarded by workers (cleared): {}\n\
         \x20 Queries converted to select: {}\n\
         \x20 Executed SELECT queries: {}\n\
         \x20 Error SELECT queries: {}\n\
         \x20 Number of times read-ahead limit was hit: {}\n\
         \x20 Number of times end of relay log was reached: {}\n",
        snapshot.relay_file_path,
        snapshot.relay_log_pos,
        snapshot.applier_timestamp,
        snapshot.prefetch_timestamp,
        snapshot.prefetch_position,
        bool_str(snapshot.sql_thread_running),
        bool_str(snapshot.shutdown),
        s.parsed_events,
        s.skipped_by_offset,
        s.unrelated_events,
        s.discarded_in_front,
        s.pushed,
        s.popped,
        s.old_discarded,
        s.cleared,
        s.converted,
        s.executed,
        s.errored,
        s.reached_ahead,
        s.reached_eof,
    )
}

fn publish(target: &Path, contents: &str) -> Result<()> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::Builder::new()
        .prefix("replication_booster.")
        .tempfile_in(dir)
        .context("creating temporary status file")?;
    tmp.write_all(contents.as_bytes()).context("writing status file contents")?;
    tmp.flush().context("flushing status file contents")?;
    tmp.persist(target)
        .map_err(|e| e.error)
        .with_context(|| format!("renaming status file into place at {}", target.display()))?;
    Ok(())
}

pub fn run_publisher(world: Arc<World>) {
    if world.options.status_update_freq_secs == 0 {
        return;
    }
    let freq = Duration::from_secs(world.options.status_update_freq_secs);
    let poll = Duration::from_millis(100);

    loop {
        // Sleep in small slices so shutdown is noticed promptly; once we
        // decide to write, the write itself is not interrupted.
        let mut waited = Duration::ZERO;
        while waited < freq {
            if world.shutdown.load(Ordering::SeqCst) {
                break;
            }
            let step = poll.min(freq - waited);
            std::thread::sleep(step);
            waited += step;
        }

        let snapshot = compose_snapshot(&world);
        if let Err(e) = publish(&world.options.status_file, &render(&snapshot)) {
            error!(error = %e, "failed to publish status file");
        }

        if world.shutdown.load(Ordering::SeqCst) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> StatusSnapshot {
        StatusSnapshot {
            relay_file_path: "/data/mysql/relay-bin.000001".into(),
            relay_log_pos: 4321,
            applier_timestamp: 1000,
            prefetch_timestamp: 1002,
            prefetch_position: 9999,
            sql_thread_running: true,
            shutdown: false,
            stats: StatsCounters {
                parsed_events: 10,
                ..Default::default()
            },
        }
    }

    #[test]
    fn render_contains_stable_labels_and_values() {
        let text = render(&sample_snapshot());
        assert!(text.contains("Status:"));
        assert!(text.contains("Statistics:"));
        assert!(text.contains("Relay log file: /data/mysql/relay-bin.000001"));
        assert!(text.contains("Is SQL thread running: true"));
        assert!(text.contains("Parsed binlog events: 10"));
    }

    #[test]
    fn publish_is_atomic_and_readable_afterwards() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("status.log");

        publish(&target, "first\n").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "first\n");

        publish(&target, "second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "second\n");
    }
}
