// One worker: one queue, one long-lived connection, one local stats/db-name
// cache. See spec.md §4.5.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use mysql::prelude::Queryable;
use mysql::Conn;
use tracing::{debug, error, warn};

use crate::binlog::EventRecord;
use crate::db;
use crate::queue::Queue;
use crate::rewrite::{self, RewriteResult};
use crate::stats::WorkerStats;
use crate::world::World;

pub fn run_worker(worker_id: usize, world: Arc<World>, queue: Arc<Queue>, db_config: db::DbConfig) {
    let mut conn = match db::connect(&db_config) {
        Ok(conn) => conn,
        Err(e) => {
            error!(worker_id, error = %e, "worker could not connect, exiting");
            return;
        }
    };

    let mut local = WorkerStats::default();
    let mut current_db: Option<String> = None;

    loop {
        world.stats.merge_worker(&mut local);

        let item = queue.wait_and_pop();
        if item.is_shutdown {
            break;
        }
        local.popped += 1;

        let applier_pos = world.shared_position.snapshot().byte_offset;
        if item.source_pos <= applier_pos {
            local.old_discarded += 1;
            continue;
        }

        let EventRecord::Query { query, db: item_db, .. } = item.query_event else {
            continue;
        };

        let rewritten = match rewrite::rewrite(&query) {
            RewriteResult::Skip => continue,
            RewriteResult::Select(select) => select,
        };
        local.converted += 1;

        if current_db.as_deref() != Some(item_db.as_str()) {
            if let Err(e) = conn.query_drop(format!("USE `{item_db}`")) {
                error!(worker_id, db = %item_db, error = %e, "worker could not switch database, exiting");
                return;
            }
            current_db = Some(item_db);
        }

        match execute_and_drain(&mut conn, &rewritten) {
            Ok(()) => local.executed += 1,
            Err(e) => {
                warn!(worker_id, query = %rewritten, error = %e, "prefetch select failed");
                local.errored += 1;
            }
        }

        if world.shutdown.load(Ordering::SeqCst) {
            break;
        }
    }

    world.stats.merge_worker(&mut local);
    debug!(worker_id, "worker stopped");
}

fn execute_and_drain(conn: &mut Conn, query: &str) -> mysql::Result<()> {
    let result = conn.query_iter(query)?;
    for row in result {
        row?;
    }
    Ok(())
}
