use crate::{errors::ErrorKind, limits::ReqLimits};
use memchr::{memchr, memchr_iter};
use std::{io, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    time::timeout,
};

/// A parsed HTTP request.
///
/// Only the request target is modeled: the text between the method and the
/// protocol version on the `GET` line, with its leading `/` removed.
/// Headers and bodies are read past and discarded.
///
/// # Input data requirements
///
/// - Lines end with `LF` or `CRLF`; the head ends at the first empty line
///   (or at end of stream).
/// - The request line must be `UTF-8`; header lines may hold any bytes.
/// - The first line whose method is `GET` is the request line. It must have
///   the form `GET SP /target SP version`; other methods are never
///   recognized.
///
/// | Request line                  | Target        |
/// |-------------------------------|---------------|
/// | `GET / HTTP/1.1`              | `""`          |
/// | `GET /random HTTP/1.1`        | `"random"`    |
/// | `GET /multiply?num1=3 HTTP/1.1` | `"multiply?num1=3"` |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    target: String,
}

impl Request {
    /// Creates a request for an already extracted target.
    #[inline]
    pub fn new<T: Into<String>>(target: T) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Request target without its leading `/` (e.g. `multiply?num1=3&num2=4`).
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Request {
    /// Parses a buffered request head.
    ///
    /// Lines are scanned as bytes up to the first blank line; the first `GET`
    /// line becomes the request. Only that line has to be `UTF-8`, other lines
    /// are never decoded.
    pub(crate) fn parse(head: &[u8]) -> Result<Request, ErrorKind> {
        let head = &head[..head_end(head).unwrap_or(head.len())];

        for line in Lines::new(head) {
            if line.is_empty() {
                break;
            }

            if Self::is_get_line(line) {
                let line = simdutf8::basic::from_utf8(line).map_err(|_| ErrorKind::InvalidEncoding)?;
                tracing::debug!(line, "received");

                return Self::parse_request_line(line).map(Request::new);
            }
        }

        Err(ErrorKind::MissingRequest)
    }

    #[inline]
    fn is_get_line(line: &[u8]) -> bool {
        line == b"GET" || line.starts_with(b"GET ")
    }

    // GET /path HTTP/1.1
    //    ^     ^
    //    first second
    fn parse_request_line(line: &str) -> Result<&str, ErrorKind> {
        let malformed = || ErrorKind::MalformedRequestLine(line.to_string());

        let rest = line.get(4..).ok_or_else(malformed)?;
        let second = memchr(b' ', rest.as_bytes()).ok_or_else(malformed)?;

        rest[..second].strip_prefix('/').ok_or_else(malformed)
    }
}

/// Index just past the blank line ending the head, if any.
#[inline]
fn head_end(buffer: &[u8]) -> Option<usize> {
    if buffer.starts_with(b"\n") {
        return Some(1);
    }
    if buffer.starts_with(b"\r\n") {
        return Some(2);
    }

    memchr_iter(b'\n', buffer).find_map(|i| match buffer.get(i + 1..) {
        Some([b'\n', ..]) => Some(i + 2),
        Some([b'\r', b'\n', ..]) => Some(i + 3),
        _ => None,
    })
}

// Splits on `\n`, trimming one trailing `\r` per line.
struct Lines<'a> {
    rest: Option<&'a [u8]>,
}

impl<'a> Lines<'a> {
    #[inline]
    fn new(src: &'a [u8]) -> Self {
        Lines {
            rest: (!src.is_empty()).then_some(src),
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let rest = self.rest?;
        let (line, tail) = match memchr(b'\n', rest) {
            Some(i) => (&rest[..i], Some(&rest[i + 1..]).filter(|t| !t.is_empty())),
            None => (rest, None),
        };

        self.rest = tail;
        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }
}

//

/// Fixed-size buffer that collects a request head from a stream.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Parser {
    len: usize,
    buffer: Box<[u8]>,
}

impl Parser {
    #[inline(always)]
    pub(crate) fn new(limits: &ReqLimits) -> Self {
        Parser {
            len: 0,
            buffer: vec![0; limits.head_size].into_boxed_slice(),
        }
    }

    #[inline]
    pub(crate) fn reset(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub(crate) fn head(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Reads until the head is complete, the peer stops sending, or the
    /// buffer is full. The whole read is bounded by `time`.
    pub(crate) async fn fill_head<R>(
        &mut self,
        stream: &mut R,
        time: Duration,
    ) -> Result<usize, ErrorKind>
    where
        R: AsyncRead + Unpin,
    {
        match timeout(time, self.read_head(stream)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "read timeout").into()),
        }
    }

    async fn read_head<R>(&mut self, stream: &mut R) -> Result<usize, ErrorKind>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if self.len == self.buffer.len() {
                return Err(ErrorKind::HeadTooLarge(self.buffer.len()));
            }

            let n = stream.read(&mut self.buffer[self.len..]).await?;
            if n == 0 {
                return Ok(self.len);
            }

            self.len += n;

            if head_end(self.head()).is_some() {
                return Ok(self.len);
            }
        }
    }
}
