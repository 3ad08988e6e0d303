// Validated, clamped configuration built from `Cli`. Numeric options are
// clamped to sensible minima per spec.md §6 ("workers >= 1, seconds >= 1");
// the admin user/password fall back to the slave's when left unset, which is
// the intended behavior behind the original tool's self-assignment bug
// (documented as an open question this crate resolves explicitly).

use std::path::PathBuf;

use crate::cli::Cli;
use crate::db::DbConfig;

#[derive(Debug, Clone)]
pub struct Options {
    pub workers: u32,
    pub offset_events: u64,
    pub seconds_prefetch: u64,
    pub millis_sleep_at_limit: u64,
    pub host: String,
    pub port: u16,
    pub socket: Option<String>,
    pub slave: DbConfig,
    pub admin: DbConfig,
    pub status_file: PathBuf,
    pub status_update_freq_secs: u64,
}

impl Options {
    pub fn from_cli(cli: Cli) -> Self {
        let admin_user = cli.admin_user.unwrap_or_else(|| cli.slave_user.clone());
        let admin_password = cli.admin_password.unwrap_or_else(|| cli.slave_password.clone());

        let slave = DbConfig {
            host: cli.host.clone(),
            port: cli.port,
            socket: cli.socket.clone(),
            user: cli.slave_user,
            password: cli.slave_password,
        };
        let admin = DbConfig {
            host: cli.host.clone(),
            port: cli.port,
            socket: cli.socket.clone(),
            user: admin_user,
            password: admin_password,
        };

        Self {
            workers: cli.workers.max(1),
            offset_events: cli.offset_events,
            seconds_prefetch: cli.seconds_prefetch.max(1),
            millis_sleep_at_limit: cli.millis_sleep_at_limit,
            host: cli.host,
            port: cli.port,
            socket: cli.socket,
            slave,
            admin,
            status_file: PathBuf::from(cli.status_file),
            status_update_freq_secs: cli.status_update_freq_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            workers: 10,
            offset_events: 500,
            seconds_prefetch: 3,
            millis_sleep_at_limit: 10,
            slave_user: "root".into(),
            slave_password: "".into(),
            admin_user: None,
            admin_password: None,
            host: "localhost".into(),
            port: 3306,
            socket: None,
            status_file: "/var/spool/replication_booster.log".into(),
            status_update_freq_secs: 30,
        }
    }

    #[test]
    fn admin_credentials_fall_back_to_slave_when_unset() {
        let mut cli = base_cli();
        cli.slave_user = "repl".into();
        cli.slave_password = "secret".into();
        let opts = Options::from_cli(cli);
        assert_eq!(opts.admin.user, "repl");
        assert_eq!(opts.admin.password, "secret");
    }

    #[test]
    fn explicit_admin_credentials_are_not_overridden() {
        let mut cli = base_cli();
        cli.admin_user = Some("admin".into());
        cli.admin_password = Some("adminpw".into());
        let opts = Options::from_cli(cli);
        assert_eq!(opts.admin.user, "admin");
        assert_eq!(opts.admin.password, "adminpw");
    }

    #[test]
    fn zero_workers_clamps_to_one() {
        let mut cli = base_cli();
        cli.workers = 0;
        assert_eq!(Options::from_cli(cli).workers, 1);
    }

    #[test]
    fn zero_seconds_prefetch_clamps_to_one() {
        let mut cli = base_cli();
        cli.seconds_prefetch = 0;
        assert_eq!(Options::from_cli(cli).seconds_prefetch, 1);
    }
}
