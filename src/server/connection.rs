use crate::{
    errors::ErrorKind,
    http::{
        request::{Parser, Request},
        response::Response,
    },
    limits::{ConnLimits, RespLimits},
    server::server_impl::{AllLimits, Handler},
};
use std::{io, sync::Arc};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Per-worker state, reused for every connection the worker serves.
pub(crate) struct HttpConnection<H: Handler> {
    handler: Arc<H>,

    pub(crate) parser: Parser,
    pub(crate) response: Response,

    conn_limits: ConnLimits,
    resp_limits: RespLimits,
}

impl<H: Handler> HttpConnection<H> {
    #[inline]
    pub(crate) fn new(handler: Arc<H>, limits: &AllLimits) -> Self {
        let (_, conn_limits, req_limits, resp_limits) = limits;

        Self {
            handler,

            parser: Parser::new(req_limits),
            response: Response::new(resp_limits),

            conn_limits: conn_limits.clone(),
            resp_limits: resp_limits.clone(),
        }
    }

    #[inline]
    fn reset(&mut self) {
        self.parser.reset();
        self.response.reset(&self.resp_limits);
    }
}

impl<H: Handler> HttpConnection<H> {
    /// Answers the single request on `stream` and shuts the stream down.
    ///
    /// Request-level failures are answered like any other request; only a
    /// failure to deliver the response is returned.
    pub(crate) async fn run<S>(&mut self, stream: &mut S) -> Result<(), io::Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.reset();

        match self.read_request(stream).await {
            Ok(request) => {
                self.handler.handle(&request, &mut self.response).await;

                tracing::info!(
                    request = request.target(),
                    status = ?self.response.status_code().map(|code| code.as_u16()),
                    "served"
                );
            }
            Err(err) => {
                tracing::warn!(error = %err, "rejected request");
                err.write_response(&mut self.response);
            }
        }

        writer::write_bytes(
            stream,
            self.response.buffer(),
            self.conn_limits.socket_write_timeout,
        )
        .await?;
        stream.shutdown().await
    }

    #[inline(always)]
    async fn read_request<S>(&mut self, stream: &mut S) -> Result<Request, ErrorKind>
    where
        S: AsyncRead + Unpin,
    {
        self.parser
            .fill_head(stream, self.conn_limits.socket_read_timeout)
            .await?;

        Request::parse(self.parser.head())
    }
}

pub(crate) mod writer {
    use std::io;
    use tokio::{
        io::{AsyncWrite, AsyncWriteExt},
        time::{timeout, Duration},
    };

    #[inline(always)]
    pub(crate) async fn write_bytes<S>(
        stream: &mut S,
        response: &[u8],
        time: Duration,
    ) -> Result<(), io::Error>
    where
        S: AsyncWrite + Unpin,
    {
        timeout(time, stream.write_all(response)).await?
    }
}
