// Sober startup/shutdown log lines, no banner. Mirrors the plain
// `print_log` announcements of the original tool rather than the decorated
// terminal output of a TUI-first tool.

use tracing::info;

use crate::config::Options;

pub fn log_startup(options: &Options) {
    info!("Replication Booster starting");
    info!(
        workers = options.workers,
        offset_events = options.offset_events,
        seconds_prefetch = options.seconds_prefetch,
        host = %options.host,
        port = options.port,
        "configuration loaded"
    );
    info!(status_file = %options.status_file.display(), freq_secs = options.status_update_freq_secs, "status file configured");
}

pub fn log_final_stats(stats: &crate::stats::StatsCounters) {
    info!("Replication Booster shutting down, final statistics:");
    info!(
        parsed_events = stats.parsed_events,
        skipped_by_offset = stats.skipped_by_offset,
        unrelated_events = stats.unrelated_events,
        discarded_in_front = stats.discarded_in_front,
        pushed = stats.pushed,
        popped = stats.popped,
        old_discarded = stats.old_discarded,
        cleared = stats.cleared,
        converted = stats.converted,
        executed = stats.executed,
        errored = stats.errored,
        reached_ahead = stats.reached_ahead,
        reached_eof = stats.reached_eof,
        "final counters"
    );
}
