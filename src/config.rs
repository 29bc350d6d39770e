//! Command line and environment configuration of the `funhttp` binary.

use crate::limits::{ConnLimits, ReqLimits, ServerLimits};
use clap::Parser;
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

/// Startup settings, read once from the command line (or environment).
///
/// # Examples
/// ```
/// use clap::Parser;
/// use funhttp::Config;
///
/// let config = Config::try_parse_from(["funhttp", "8080", "--workers", "4"]).unwrap();
/// assert_eq!(config.addr().port(), 8080);
/// assert_eq!(config.server_limits().max_connections, 4);
/// ```
#[derive(Debug, Clone, Parser)]
#[command(name = "funhttp", version, about = "Tiny HTTP server with a fixed set of fun routes")]
pub struct Config {
    /// TCP port to listen on
    #[arg(default_value_t = 9000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "FUNHTTP_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Directory holding root.html, index.html and the files served under /file/
    #[arg(long, env = "FUNHTTP_WWW", default_value = "www")]
    pub www: PathBuf,

    /// Base URL the `query` parameter of /github is appended to
    #[arg(long, env = "FUNHTTP_GITHUB_API", default_value = "https://api.github.com/")]
    pub github_api: String,

    /// Upper bound for one remote fetch, in seconds
    #[arg(long, default_value_t = 20)]
    pub fetch_timeout_secs: u64,

    /// Number of connections served at once; 1 handles clients strictly in turn
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Upper bound for receiving a request head, in seconds
    #[arg(long, default_value_t = 5)]
    pub read_timeout_secs: u64,

    /// Largest request head accepted, in bytes
    #[arg(long, default_value_t = 8 * 1024)]
    pub max_head_bytes: usize,

    /// Most distinct query parameters accepted per request
    #[arg(long, default_value_t = 16)]
    pub max_query_params: usize,
}

impl Config {
    #[inline]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[inline]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn server_limits(&self) -> ServerLimits {
        ServerLimits {
            max_connections: self.workers,
            ..ServerLimits::default()
        }
    }

    pub fn req_limits(&self) -> ReqLimits {
        ReqLimits {
            head_size: self.max_head_bytes,
        }
    }

    pub fn conn_limits(&self) -> ConnLimits {
        ConnLimits {
            socket_read_timeout: Duration::from_secs(self.read_timeout_secs),
            ..ConnLimits::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["funhttp"]).unwrap();

        assert_eq!(config.addr(), "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.www, PathBuf::from("www"));
        assert_eq!(config.github_api, "https://api.github.com/");
        assert_eq!(config.fetch_timeout(), Duration::from_secs(20));
        assert_eq!(config.server_limits().max_connections, 1);
        assert_eq!(config.conn_limits().socket_read_timeout, Duration::from_secs(5));
        assert_eq!(config.req_limits().head_size, 8192);
        assert_eq!(config.max_query_params, 16);
    }

    #[test]
    fn overrides() {
        let config = Config::try_parse_from([
            "funhttp",
            "8080",
            "--host",
            "127.0.0.1",
            "--www",
            "/srv/www",
            "--workers",
            "3",
            "--read-timeout-secs",
            "1",
            "--max-head-bytes",
            "512",
            "--max-query-params",
            "4",
        ])
        .unwrap();

        assert_eq!(config.addr(), "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.www, PathBuf::from("/srv/www"));
        assert_eq!(config.server_limits().max_connections, 3);
        assert_eq!(config.conn_limits().socket_read_timeout, Duration::from_secs(1));
        assert_eq!(config.req_limits().head_size, 512);
        assert_eq!(config.max_query_params, 4);
    }

    #[test]
    fn rejects_bad_values() {
        let cases: [&[&str]; 3] = [
            &["funhttp", "http"],
            &["funhttp", "70000"],
            &["funhttp", "--host", "localhost:80"],
        ];

        for args in cases {
            assert!(Config::try_parse_from(args).is_err(), "{args:?}");
        }
    }
}
