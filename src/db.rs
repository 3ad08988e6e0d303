// MySQL connection helpers shared by the position tracker, the relay-log
// bootstrap step, and the worker pool.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mysql::prelude::Queryable;
use mysql::{Conn, Opts, OptsBuilder};

/// Everything needed to open a connection, already resolved (admin
/// credentials falling back to the slave's, per spec.md's connection rules).
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub socket: Option<String>,
    pub user: String,
    pub password: String,
}

pub fn connect(cfg: &DbConfig) -> Result<Conn> {
    let mut builder = OptsBuilder::new()
        .user(Some(cfg.user.as_str()))
        .pass(Some(cfg.password.as_str()))
        .tcp_port(cfg.port);

    builder = match &cfg.socket {
        Some(socket) => builder.socket(Some(socket.as_str())),
        None => builder.ip_or_hostname(Some(cfg.host.as_str())),
    };

    let opts = Opts::from(builder);
    Conn::new(opts).with_context(|| format!("connecting to MySQL at {}:{}", cfg.host, cfg.port))
}

/// `SELECT @@global.datadir`, trailing slash stripped.
pub fn fetch_datadir(conn: &mut Conn) -> Result<String> {
    let datadir: String = conn
        .query_first("SELECT @@global.datadir")
        .context("querying @@global.datadir")?
        .context("@@global.datadir returned no row")?;
    Ok(datadir.trim_end_matches('/').to_string())
}

/// Numeric server version, e.g. 50723 for 5.7.23, the same encoding the
/// original tool compares against (`version > 50100`).
pub fn fetch_server_version_numeric(conn: &mut Conn) -> Result<u64> {
    let version: String = conn
        .query_first("SELECT @@global.version")
        .context("querying @@global.version")?
        .context("@@global.version returned no row")?;
    Ok(parse_version_numeric(&version))
}

fn parse_version_numeric(version: &str) -> u64 {
    let core = version.split(|c: char| !c.is_ascii_digit() && c != '.').next().unwrap_or(version);
    let mut parts = core.split('.').map(|p| p.parse::<u64>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    major * 10000 + minor * 100 + patch
}

/// Resolves the applier position-file path, matching
/// `init_relay_log_info_path`: on servers newer than 5.1, ask the server for
/// `@@global.relay_log_info_file`; otherwise assume the legacy fixed name.
/// A relative name (bare or `./`-prefixed) is joined under `datadir`.
pub fn fetch_relay_log_info_path(conn: &mut Conn, datadir: &str, server_version: u64) -> Result<PathBuf> {
    let name = if server_version > 50100 {
        conn.query_first::<String, _>("SELECT @@global.relay_log_info_file")
            .context("querying @@global.relay_log_info_file")?
            .context("@@global.relay_log_info_file returned no row")?
    } else {
        "relay-log.info".to_string()
    };

    let path = Path::new(&name);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let trimmed = name.strip_prefix("./").unwrap_or(&name);
        Ok(Path::new(datadir).join(trimmed))
    }
}

/// `SHOW SLAVE STATUS`, extracting only the `Slave_SQL_Running` column.
/// Returns `None` if the server reports no replication channel at all
/// (empty result set).
pub fn fetch_slave_sql_running(conn: &mut Conn) -> Result<Option<bool>> {
    let mut result = conn.query_iter("SHOW SLAVE STATUS").context("querying SHOW SLAVE STATUS")?;
    let Some(row) = result.next() else {
        return Ok(None);
    };
    let row = row.context("reading SHOW SLAVE STATUS row")?;
    let columns = row.columns_ref();
    let idx = columns
        .iter()
        .position(|c| c.name_str() == "Slave_SQL_Running")
        .context("SHOW SLAVE STATUS has no Slave_SQL_Running column")?;
    let value: Option<String> = row
        .get::<Option<String>, _>(idx)
        .context("reading Slave_SQL_Running value")?;
    Ok(Some(value.as_deref() == Some("Yes")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_version_strings() {
        assert_eq!(parse_version_numeric("5.7.23-log"), 50723);
        assert_eq!(parse_version_numeric("8.0.34"), 80034);
        assert_eq!(parse_version_numeric("5.1"), 50100);
    }
}
