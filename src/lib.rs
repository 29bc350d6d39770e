//! funhttp - a tiny hand-parsed HTTP/1.x server with a fixed set of fun routes
//!
//! The server reads one request head per connection, extracts the target of
//! the first `GET` line, dispatches it through an ordered route table and
//! answers with a newline-terminated response before closing the connection.
//!
//! # Routes
//!
//! | Target                               | Result                                      |
//! |--------------------------------------|---------------------------------------------|
//! | `/`                                  | `root.html` with the served file list       |
//! | `/json`                              | random `{"header":..,"image":..}`           |
//! | `/random`                            | `index.html`                                |
//! | `/file/<path>`                       | raw file bytes or `404`                     |
//! | `/multiply?num1=3&num2=4`            | `Result is: 12`                             |
//! | `/github?query=users/x/repos`        | one line per repository                     |
//! | `/birthday?day=1&month=1`            | `Days until your next birthday: N`          |
//! | `/happyMadison?movie=happy&quote=2`  | a quote in a small HTML page                |
//!
//! Anything else is answered with `400`.
//!
//! # Examples
//!
//! Serving the routes with real collaborators:
//! ```no_run
//! use funhttp::{HttpFetcher, Server, Site, SystemClock, WwwDirectory};
//! use std::time::Duration;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let site = Site::new(
//!         WwwDirectory::new("www"),
//!         HttpFetcher::new(Duration::from_secs(20)).unwrap(),
//!         SystemClock,
//!     );
//!
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:9000").await.unwrap())
//!         .handler(site)
//!         .build()
//!         .unwrap()
//!         .launch()
//!         .await;
//! }
//! ```
//! A custom handler:
//! ```no_run
//! use funhttp::{ContentType, Handled, Handler, Request, Response, Server, StatusCode};
//! use tokio::net::TcpListener;
//!
//! struct Echo;
//!
//! impl Handler for Echo {
//!     async fn handle(&self, req: &Request, resp: &mut Response) -> Handled {
//!         resp.status(StatusCode::Ok)
//!             .content_type(ContentType::Html)
//!             .body(req.target())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:9000").await.unwrap())
//!         .handler(Echo)
//!         .build()
//!         .unwrap()
//!         .launch()
//!         .await;
//! }
//! ```

pub(crate) mod http {
    pub mod query;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod server_impl;
}
pub(crate) mod site {
    pub(crate) mod collaborators;
    pub(crate) mod routes;
    pub(crate) mod tables;
}
pub mod config;
pub(crate) mod errors;
pub mod limits;
pub(crate) mod router;

pub use crate::{
    config::Config,
    http::{
        query,
        request::Request,
        response::{
            write::{BodyWriter, WriteBuffer},
            Handled, Response,
        },
        types::{ContentType, StatusCode},
    },
    server::server_impl::{bind, BuildError, Handler, Server, ServerBuilder},
    site::{
        collaborators::{
            Clock, Directory, FetchError, Fetcher, HttpFetcher, SystemClock, WwwDirectory,
        },
        routes::Site,
    },
};

#[doc(hidden)]
pub fn run_test<F: FnOnce(&Request, &mut Response) -> Handled>(f: F) {
    f(
        &Request::new(""),
        &mut Response::new(&crate::limits::RespLimits::default()),
    );
}

#[doc(hidden)]
#[macro_export]
macro_rules! impt_default_handler {
    ($name:ident) => {
        use funhttp::{Handled, Handler, Request, Response, StatusCode};
        struct $name;

        impl Handler for $name {
            async fn handle(&self, _: &Request, resp: &mut Response) -> Handled {
                resp.status(StatusCode::Ok).body("Hello world!")
            }
        }
    };
}
