// Replication Booster - a sidecar daemon that accelerates a MySQL
// replica's serial apply thread by prefetching the pages and indexes it
// will soon touch: read the relay log ahead of the applier, rewrite each
// buffered UPDATE/DELETE into an equivalent read-only SELECT, and execute
// those SELECTs through a pool of connections to warm the buffer pool.

mod binlog;
mod cli;
mod config;
mod db;
mod logging;
mod net;
mod position;
mod queue;
mod reader;
mod rewrite;
mod signals;
mod startup;
mod stats;
mod status;
mod worker;
mod world;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use cli::Cli;
use config::Options;
use world::World;

fn main() -> Result<()> {
    let cli = parse_cli_or_exit();
    let options = Options::from_cli(cli);

    logging::init();
    startup::log_startup(&options);

    match net::is_local_host(&options.host) {
        Ok(true) => {}
        Ok(false) => bail!("host {} is not a local interface address, refusing to start", options.host),
        Err(e) => return Err(e).context("checking whether host is local"),
    }

    let mut admin_conn = db::connect(&options.admin).context("connecting admin client")?;
    let datadir = db::fetch_datadir(&mut admin_conn).context("fetching @@global.datadir")?;
    let server_version =
        db::fetch_server_version_numeric(&mut admin_conn).context("fetching @@global.version")?;
    let position_file = db::fetch_relay_log_info_path(&mut admin_conn, &datadir, server_version)
        .context("resolving applier position file path")?;

    let initial_position = read_initial_position(&position_file, &datadir)?;

    let world = Arc::new(World::new(options, initial_position));

    signals::install(world.shutdown.clone()).context("installing signal handlers")?;

    let tracker_handle = {
        let world = world.clone();
        let position_file = position_file.clone();
        let datadir = std::path::PathBuf::from(&datadir);
        let tracker_conn =
            db::connect(&world.options.admin).context("connecting tracker admin client")?;
        std::thread::spawn(move || {
            position::run_tracker(
                position_file,
                datadir,
                world.shared_position.clone(),
                world.sql_thread_running.clone(),
                world.shutdown.clone(),
                tracker_conn,
            );
        })
    };

    let reader_handle = {
        let world = world.clone();
        std::thread::spawn(move || reader::run_reader(world))
    };

    let status_handle = {
        let world = world.clone();
        std::thread::spawn(move || status::run_publisher(world))
    };

    let worker_handles: Vec<_> = world
        .queues
        .iter()
        .enumerate()
        .map(|(worker_id, queue)| {
            let world = world.clone();
            let queue = queue.clone();
            let db_config = world.options.slave.clone();
            std::thread::spawn(move || worker::run_worker(worker_id, world, queue, db_config))
        })
        .collect();

    while !world.shutdown.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    // Wake every worker blocked in wait_and_pop; the reader has already
    // seen the shutdown flag and is on its way out on its own.
    for queue in &world.queues {
        queue.push(queue::WorkItem::shutdown_sentinel());
    }

    let _ = reader_handle.join();
    for handle in worker_handles {
        let _ = handle.join();
    }
    let _ = tracker_handle.join();
    let _ = status_handle.join();

    startup::log_final_stats(&world.stats.snapshot());

    Ok(())
}

/// `clap`'s default behavior exits 2 on a usage error; spec.md's CLI
/// contract (mirroring the original getopt-based tool) exits 1 for both
/// `--help` and invalid arguments, and 0 only for `--version`.
fn parse_cli_or_exit() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                clap::error::ErrorKind::DisplayVersion => std::process::exit(0),
                _ => std::process::exit(1),
            }
        }
    }
}

fn read_initial_position(
    position_file: &std::path::Path,
    datadir: &str,
) -> Result<position::Position> {
    let contents = std::fs::read_to_string(position_file)
        .with_context(|| format!("reading applier position file {}", position_file.display()))?;
    position::parse_position_file(&contents, std::path::Path::new(datadir))
        .with_context(|| format!("position file {} has no recognizable position", position_file.display()))
}
