// Command-line surface, matching spec.md §6 one-to-one. clap handles
// `--help` and `--version`; we only validate and clamp after parsing
// (see `crate::config::Options::from_cli`).

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "replication-booster",
    version,
    about = "Prefetches a MySQL replica's relay log ahead of the SQL thread",
    long_about = None
)]
pub struct Cli {
    /// Number of worker threads/connections
    #[arg(long = "worker", short = 'w', default_value_t = 10)]
    pub workers: u32,

    /// Skip this many events at the front of every outer iteration
    #[arg(long = "offset-events", short = 'o', default_value_t = 500)]
    pub offset_events: u64,

    /// How far ahead of the applier, in seconds of event wall-clock time, to read
    #[arg(long = "sec", short = 's', default_value_t = 3)]
    pub seconds_prefetch: u64,

    /// How long to sleep (ms) when the read-ahead gate trips
    #[arg(long = "millis-at-sleep", default_value_t = 10)]
    pub millis_sleep_at_limit: u64,

    /// Replication user on the replica
    #[arg(long = "user", short = 'u', default_value = "root")]
    pub slave_user: String,

    /// Replication user's password
    #[arg(long = "password", short = 'p', default_value = "")]
    pub slave_password: String,

    /// Admin user for SHOW SLAVE STATUS / datadir lookups; defaults to --user
    #[arg(long = "admin-user")]
    pub admin_user: Option<String>,

    /// Admin user's password; defaults to --password
    #[arg(long = "admin-password")]
    pub admin_password: Option<String>,

    /// Replica host; must resolve to a local interface
    #[arg(long = "host", short = 'H', default_value = "localhost")]
    pub host: String,

    /// Replica port
    #[arg(long = "port", short = 'P', default_value_t = 3306)]
    pub port: u16,

    /// Unix socket path; when set, used instead of host/port for the connection
    #[arg(long = "socket", short = 'S')]
    pub socket: Option<String>,

    /// Where to publish the human-readable status file
    #[arg(long = "status-file", default_value = "/var/spool/replication_booster.log")]
    pub status_file: String,

    /// Seconds between status file updates; 0 disables publishing
    #[arg(long = "status-update-freq", default_value_t = 30)]
    pub status_update_freq_secs: u64,
}
