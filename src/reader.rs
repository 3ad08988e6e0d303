// The relay-log reader: one thread, one loop, the heart of the daemon.
// Each outer iteration binds to a relay-log file and reads forward until
// reached-ahead, EOF, shutdown, or the applier stopping. See spec.md §4.4.

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::binlog::{EventRecord, ReadOutcome, RelayLogFile};
use crate::queue::WorkItem;
use crate::rewrite;
use crate::world::World;

fn resolve_rotate_path(current_file: &Path, next_file: &str) -> PathBuf {
    let next = Path::new(next_file);
    if next.is_absolute() {
        next.to_path_buf()
    } else {
        current_file
            .parent()
            .map(|dir| dir.join(next))
            .unwrap_or_else(|| next.to_path_buf())
    }
}

pub fn run_reader(world: Arc<World>) {
    let initial = world.shared_position.snapshot();
    let local_server_id = match RelayLogFile::discover_local_server_id(&initial.relay_file_path) {
        Ok(id) => id,
        Err(e) => {
            error!(error = %e, "could not determine local server id, shutting down");
            world.shutdown.store(true, Ordering::SeqCst);
            return;
        }
    };
    info!(local_server_id, "relay-log reader starting");

    let mut pending_rotate: Option<(PathBuf, u64)> = None;
    let mut pushed_count: u64 = 0;

    loop {
        if world.shutdown.load(Ordering::SeqCst) {
            break;
        }

        let (path, start_pos) = match pending_rotate.take() {
            Some((path, pos)) => (path, pos),
            None => {
                let snap = world.shared_position.snapshot();
                (snap.relay_file_path, snap.byte_offset)
            }
        };

        let mut relay = match RelayLogFile::open(&path, start_pos) {
            Ok(relay) => relay,
            Err(e) => {
                error!(error = %e, path = %path.display(), "failed to open relay log, will retry next iteration");
                std::thread::sleep(Duration::from_millis(100));
                continue;
            }
        };

        let mut events_handled: u64 = 0;
        let mut start_of_batch = true;

        loop {
            if world.shutdown.load(Ordering::SeqCst) || !world.sql_thread_running.load(Ordering::SeqCst) {
                break;
            }

            match relay.read_next() {
                Ok(ReadOutcome::Eof) => {
                    world.stats.add_reached_eof(1);
                    std::thread::sleep(Duration::from_micros(100));
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "failed to decode relay log event, treating as unrelated");
                    world.stats.add_unrelated_events(1);
                }
                Ok(ReadOutcome::Event(record, meta)) => {
                    world.stats.add_parsed_events(1);
                    world.prefetch_position.store(meta.current_pos, Ordering::SeqCst);
                    world.prefetch_timestamp.store(meta.timestamp, Ordering::SeqCst);

                    if start_of_batch {
                        world.applier_timestamp.store(meta.timestamp, Ordering::SeqCst);
                        start_of_batch = false;
                    }

                    let applier_ts = world.applier_timestamp.load(Ordering::SeqCst);
                    let read_ahead_seconds = world.options.seconds_prefetch as u32;
                    if meta.timestamp >= applier_ts.saturating_add(read_ahead_seconds) {
                        world.stats.add_reached_ahead(1);
                        std::thread::sleep(Duration::from_millis(world.options.millis_sleep_at_limit));
                        break;
                    }

                    events_handled += 1;
                    if events_handled <= world.options.offset_events {
                        world.stats.add_skipped_by_offset(1);
                        continue;
                    }

                    match record {
                        EventRecord::Query { ref query, .. } => {
                            if !rewrite::is_convert_candidate(query) {
                                world.stats.add_discarded_in_front(1);
                                continue;
                            }
                            let idx = (pushed_count % world.queues.len() as u64) as usize;
                            world.queues[idx].push(WorkItem {
                                source_pos: meta.current_pos,
                                query_event: record,
                                is_shutdown: false,
                            });
                            pushed_count += 1;
                            world.stats.add_pushed(1);
                        }
                        EventRecord::Rotate {
                            ref next_file,
                            next_pos,
                            server_id,
                        } => {
                            if server_id == local_server_id {
                                pending_rotate = Some((resolve_rotate_path(&path, next_file), next_pos));
                            } else {
                                world.stats.add_unrelated_events(1);
                            }
                        }
                        EventRecord::Other => {
                            world.stats.add_unrelated_events(1);
                        }
                    }
                }
            }
        }

        drop(relay);
        let cleared: u64 = world.queues.iter().map(|q| q.clear() as u64).sum();
        world.stats.add_cleared(cleared);

        while !world.shutdown.load(Ordering::SeqCst) && !world.sql_thread_running.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    info!("relay-log reader stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_rotate_path_against_current_directory() {
        let current = Path::new("/data/mysql/relay-bin.000041");
        let resolved = resolve_rotate_path(current, "relay-bin.000042");
        assert_eq!(resolved, PathBuf::from("/data/mysql/relay-bin.000042"));
    }

    #[test]
    fn absolute_rotate_path_is_used_verbatim() {
        let current = Path::new("/data/mysql/relay-bin.000041");
        let resolved = resolve_rotate_path(current, "/other/relay-bin.000001");
        assert_eq!(resolved, PathBuf::from("/other/relay-bin.000001"));
    }
}
