//! Tunables for the accept queue, sockets, request heads and response buffers.
//!
//! # Examples
//!
//! Eight concurrent workers and a short read timeout:
//!
//! ```no_run
//! # funhttp::impt_default_handler!{MyHandler}
//! use funhttp::{Server, limits::{ConnLimits, ServerLimits}};
//! use tokio::net::TcpListener;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:9000").await.unwrap())
//!         .handler(MyHandler)
//!         .server_limits(ServerLimits {
//!             max_connections: 8, // one worker per connection, up to 8
//!             ..ServerLimits::default()
//!         })
//!         .connection_limits(ConnLimits {
//!             socket_read_timeout: Duration::from_secs(2),
//!             ..ConnLimits::default()
//!         })
//!         .build()
//!         .unwrap()
//!         .launch()
//!         .await;
//! }
//! ```

use std::time::Duration;

/// How many connections are served at once and how many may wait.
///
/// The accept loop pushes every accepted stream onto a shared queue. While
/// `max_pending_connections` streams are already waiting it stops accepting,
/// so further clients wait in the listen backlog. Each of the
/// `max_connections` workers pops one stream, reads its head, routes it,
/// writes the answer and closes it before popping the next.
///
/// With the default single worker, a request is fully parsed, handled and
/// answered before the next connection is taken from the queue.
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Number of worker tasks, i.e. connections served concurrently (default: `1`).
    pub max_connections: usize,

    /// Maximum number of accepted connections waiting for a worker (default: `64`).
    ///
    /// Also used as the listen backlog by [`bind`](crate::bind) in the binary.
    pub max_pending_connections: usize,

    /// Sleep between polls of an empty queue by an idle worker, or of a full
    /// queue by the accept loop (default: `200μs`).
    pub poll_interval: Duration,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_connections: 1,
            max_pending_connections: 64,
            poll_interval: Duration::from_micros(200),
        }
    }
}

/// Per-connection socket timeouts.
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Upper bound for reading the whole request head (default: `5s`).
    pub socket_read_timeout: Duration,

    /// Upper bound for writing the response (default: `5s`).
    pub socket_write_timeout: Duration,
}

impl Default for ConnLimits {
    #[inline(always)]
    fn default() -> Self {
        Self {
            socket_read_timeout: Duration::from_secs(5),
            socket_write_timeout: Duration::from_secs(5),
        }
    }
}

/// Request reading limits.
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Size of the buffer holding the request head (default: `8 KiB`).
    ///
    /// A head that does not end within this many bytes is answered with `400`.
    pub head_size: usize,
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            head_size: 8 * 1024,
        }
    }
}

/// Response buffer management.
#[derive(Debug, Clone)]
pub struct RespLimits {
    /// Initial capacity of each worker's response buffer (default: `1 KiB`).
    pub default_capacity: usize,

    /// A buffer grown beyond this (by a large file, say) is dropped and
    /// reallocated at `default_capacity` after the response is sent
    /// (default: `64 KiB`).
    pub max_capacity: usize,
}

impl Default for RespLimits {
    fn default() -> Self {
        Self {
            default_capacity: 1024,
            max_capacity: 64 * 1024,
        }
    }
}
