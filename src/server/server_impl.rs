use crate::{
    http::{
        request::Request,
        response::{Handled, Response},
    },
    limits::{ConnLimits, ReqLimits, RespLimits, ServerLimits},
    server::connection::HttpConnection,
};
use crossbeam::queue::SegQueue;
use socket2::{Domain, Protocol, Socket, Type};
use std::{future::Future, io, net::SocketAddr, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    net::{TcpListener, TcpStream},
    time::sleep as tokio_sleep,
};

/// Trait for handling HTTP requests and generating responses.
///
/// The handler receives the parsed [`Request`] and must finalize the
/// [`Response`]; the returned [`Handled`] proves it did.
///
/// # Examples
/// ```no_run
/// use funhttp::{ContentType, Handled, Handler, Request, Response, StatusCode};
///
/// struct Hello;
///
/// impl Handler for Hello {
///     async fn handle(&self, req: &Request, resp: &mut Response) -> Handled {
///         match req.target() {
///             "" => resp
///                 .status(StatusCode::Ok)
///                 .content_type(ContentType::Html)
///                 .body("Hello!"),
///             _ => resp
///                 .status(StatusCode::NotFound)
///                 .content_type(ContentType::Html)
///                 .body("Nothing here"),
///         }
///     }
/// }
/// ```
pub trait Handler
where
    Self: Sync + Send + 'static,
{
    /// Builds the response for one request.
    fn handle(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> impl Future<Output = Handled> + Send;
}

/// HTTP server that accepts connections and hands them to worker tasks.
///
/// Workers are spawned once by [`ServerBuilder::build`]; each one takes an
/// accepted connection from a shared queue, answers its single request and
/// closes it. See [`ServerLimits`] for the admission rules.
///
/// # Examples
/// ```no_run
/// # funhttp::impt_default_handler!{ MyHandler }
/// use funhttp::Server;
/// use tokio::net::TcpListener;
///
/// #[tokio::main]
/// async fn main() {
///     Server::builder()
///         .listener(TcpListener::bind("127.0.0.1:9000").await.unwrap())
///         .handler(MyHandler)
///         .build()
///         .unwrap()
///         .launch()
///         .await;
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    stream_queue: TcpQueue,
    server_limits: ServerLimits,
}

impl Server {
    /// Creates a new [`ServerBuilder`].
    #[inline]
    pub fn builder<H: Handler>() -> ServerBuilder<H> {
        ServerBuilder {
            listener: None,
            handler: None,

            server_limits: None,
            request_limits: None,
            connection_limits: None,
        }
    }

    /// Address the server accepts connections on.
    #[inline]
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever.
    ///
    /// A failed `accept` is logged and skipped. While the queue is full no
    /// connection is accepted; clients wait in the listen backlog instead.
    #[inline]
    pub async fn launch(self) {
        let limits = &self.server_limits;

        loop {
            if self.stream_queue.len() >= limits.max_pending_connections {
                tokio_sleep(limits.poll_interval).await;
                continue;
            }

            match self.listener.accept().await {
                Ok(value) => self.stream_queue.push(value),
                Err(err) => tracing::warn!(error = %err, "accept failed"),
            }
        }
    }

    #[inline]
    async fn get_stream(queue: &TcpQueue, poll_interval: Duration) -> (TcpStream, SocketAddr) {
        loop {
            if let Some(value) = queue.pop() {
                return value;
            }

            tokio_sleep(poll_interval).await;
        }
    }
}

//

/// Builder for configuring and creating a [`Server`] instance.
pub struct ServerBuilder<H: Handler> {
    listener: Option<TcpListener>,
    handler: Option<Arc<H>>,

    server_limits: Option<ServerLimits>,
    request_limits: Option<ReqLimits>,
    connection_limits: Option<ConnLimits>,
}

/// Reasons [`ServerBuilder::build`] can refuse to create a server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("the `listener` method must be called before `build`")]
    MissingListener,

    #[error("the `handler` method must be called before `build`")]
    MissingHandler,

    #[error("`max_connections` must be at least 1")]
    NoWorkers,

    #[error("`max_pending_connections` must be at least 1")]
    NoPendingSlots,
}

impl<H: Handler> ServerBuilder<H> {
    /// Sets the TCP listener for the server (required).
    #[inline(always)]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets the request handler for the server (required).
    #[inline(always)]
    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Configures worker count and admission queue.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # funhttp::impt_default_handler!{ MyStruct }
    /// # #[tokio::main]
    /// # async fn main() {
    /// use funhttp::{Server, limits::ServerLimits};
    /// use tokio::net::TcpListener;
    ///
    /// let server = Server::builder()
    ///     .listener(TcpListener::bind("127.0.0.1:9000").await.unwrap())
    ///     .handler(MyStruct)
    ///     .server_limits(ServerLimits {
    ///         max_connections: 4,
    ///         ..ServerLimits::default()
    ///     })
    ///     .build();
    /// # }
    /// ```
    #[inline(always)]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    /// Configures socket read and write timeouts.
    #[inline(always)]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    /// Configures the request head buffer.
    #[inline(always)]
    pub fn request_limits(mut self, limits: ReqLimits) -> Self {
        self.request_limits = Some(limits);
        self
    }

    /// Finalizes the builder, spawning the worker tasks.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn build(self) -> Result<Server, BuildError> {
        let listener = self.listener.ok_or(BuildError::MissingListener)?;
        let handler = self.handler.ok_or(BuildError::MissingHandler)?;
        let limits: AllLimits = (
            self.server_limits.unwrap_or_default(),
            self.connection_limits.unwrap_or_default(),
            self.request_limits.unwrap_or_default(),
            RespLimits::default(),
        );

        if limits.0.max_connections == 0 {
            return Err(BuildError::NoWorkers);
        }
        if limits.0.max_pending_connections == 0 {
            return Err(BuildError::NoPendingSlots);
        }

        let stream_queue = Arc::new(SegQueue::new());
        for _ in 0..limits.0.max_connections {
            Self::spawn_worker(&stream_queue, &limits, &handler);
        }

        Ok(Server {
            listener,
            stream_queue,
            server_limits: limits.0,
        })
    }

    #[inline]
    fn spawn_worker(queue: &TcpQueue, limits: &AllLimits, handler: &Arc<H>) {
        let queue = queue.clone();
        let poll_interval = limits.0.poll_interval;
        let mut conn = HttpConnection::new(handler.clone(), limits);

        tokio::spawn(async move {
            loop {
                let (mut stream, addr) = Server::get_stream(&queue, poll_interval).await;

                if let Err(err) = conn.run(&mut stream).await {
                    tracing::warn!(%addr, error = %err, "connection failed");
                }
            }
        });
    }
}

/// Binds a non-blocking listener with `SO_REUSEADDR` set and the given backlog.
///
/// Must be called inside a Tokio runtime.
pub fn bind(addr: SocketAddr, backlog: usize) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;

    TcpListener::from_std(socket.into())
}

type TcpQueue = Arc<SegQueue<(TcpStream, SocketAddr)>>;
pub(crate) type AllLimits = (ServerLimits, ConnLimits, ReqLimits, RespLimits);

#[cfg(test)]
mod tests {
    use super::*;

    struct Hello;

    impl Handler for Hello {
        async fn handle(&self, _: &Request, resp: &mut Response) -> Handled {
            resp.status(crate::StatusCode::Ok).body("hello")
        }
    }

    #[tokio::test]
    async fn build_requires_parts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        assert_eq!(
            Server::builder::<Hello>().listener(listener).build().err(),
            Some(BuildError::MissingHandler)
        );

        assert_eq!(
            Server::builder().handler(Hello).build().err(),
            Some(BuildError::MissingListener)
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let no_workers = Server::builder()
            .listener(listener)
            .handler(Hello)
            .server_limits(ServerLimits {
                max_connections: 0,
                ..ServerLimits::default()
            })
            .build();
        assert_eq!(no_workers.err(), Some(BuildError::NoWorkers));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let no_queue = Server::builder()
            .listener(listener)
            .handler(Hello)
            .server_limits(ServerLimits {
                max_pending_connections: 0,
                ..ServerLimits::default()
            })
            .build();
        assert_eq!(no_queue.err(), Some(BuildError::NoPendingSlots));
    }

    #[tokio::test]
    async fn bind_ephemeral_port() {
        let listener = bind("127.0.0.1:0".parse().unwrap(), 8).unwrap();
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);

        let server = Server::builder()
            .listener(listener)
            .handler(Hello)
            .build()
            .unwrap();
        assert_eq!(server.local_addr().unwrap(), addr);
    }
}
