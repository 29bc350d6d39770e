//! Response builder writing the server's newline-terminated wire format.

use crate::{
    http::types::{ContentType, StatusCode},
    limits::RespLimits,
    BodyWriter, WriteBuffer,
};

#[derive(Debug)]
/// Output of one handled request, built in place by the handler.
///
/// Produces `"<version> <code> <reason>\n<headers>\n\n<body>"`. Lines end with a
/// bare `\n` (not `\r\n`) and no `content-length` is sent: the connection is
/// closed once the response is written, which delimits the body.
///
/// Methods are chained in a fixed order:
/// - structured: [`status()`](Response::status) -> headers -> any body method
/// - unstructured: [`raw()`](Response::raw) alone, for bodies sent without a
///   status line
///
/// Instances are created by the server and passed to
/// [`Handler::handle`](crate::Handler::handle).
///
/// # Examples
/// ```
/// use funhttp::{ContentType, Handled, Request, Response, StatusCode};
///
/// // Body of a `Handler::handle` implementation
/// async fn handle(_req: &Request, resp: &mut Response) -> Handled {
///     resp.status(StatusCode::Ok)
///         .content_type(ContentType::Html)
///         .body("<h1>Hello World</h1>")
/// }
/// ```
///
/// # Panics
/// Calling the methods out of order panics in `debug` builds.
pub struct Response {
    buffer: Vec<u8>,
    status: Option<StatusCode>,
    content_type: Option<ContentType>,
    start_body: usize,
    state: ResponseState,
}

/// Proof that a [`Response`] was finalized.
#[doc(hidden)]
#[derive(Debug)]
pub struct Handled(());

#[derive(Debug, PartialEq)]
enum ResponseState {
    Clean,
    Headers,
    Complete,
}

impl Response {
    #[inline(always)]
    pub(crate) fn new(limits: &RespLimits) -> Self {
        Self {
            buffer: Vec::with_capacity(limits.default_capacity),
            status: None,
            content_type: None,
            start_body: 0,
            state: ResponseState::Clean,
        }
    }

    #[inline(always)]
    pub(crate) fn reset(&mut self, limits: &RespLimits) {
        if self.buffer.capacity() > limits.max_capacity {
            self.buffer = Vec::with_capacity(limits.default_capacity);
        } else {
            self.buffer.clear();
        }

        self.status = None;
        self.content_type = None;
        self.start_body = 0;
        self.state = ResponseState::Clean;
    }

    #[inline(always)]
    pub(crate) fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

/// Inspection of a finalized response
impl Response {
    /// Status code, or `None` for an unstructured response.
    #[inline]
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    /// Content type set through [`content_type()`](Response::content_type).
    #[inline]
    pub fn content_type_value(&self) -> Option<ContentType> {
        self.content_type
    }

    /// Body bytes written so far (the whole output for unstructured responses).
    #[inline]
    pub fn body_bytes(&self) -> &[u8] {
        &self.buffer[self.start_body..]
    }

    /// Whether a finalizing method has been called.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.state == ResponseState::Complete
    }
}

impl Response {
    /// Writes the status line.
    ///
    /// # Panics
    /// Error message: `status() opens the response and may appear once`
    ///
    /// Panics in `debug` mode when called twice or after any body method.
    #[inline]
    #[track_caller]
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        debug_assert!(
            self.state == ResponseState::Clean,
            "status() opens the response and may appear once"
        );

        self.buffer.extend_from_slice(status.to_first_line());
        self.buffer.push(b'\n');
        self.status = Some(status);
        self.state = ResponseState::Headers;
        self
    }

    /// Adds the `Content-Type` header.
    #[inline]
    #[track_caller]
    pub fn content_type(&mut self, content_type: ContentType) -> &mut Self {
        self.content_type = Some(content_type);
        self.header("Content-Type", content_type.as_str())
    }

    /// Writes one `name: value` header line.
    ///
    /// # Examples
    /// ```
    /// # funhttp::run_test(|_, resp| {
    /// use funhttp::StatusCode;
    ///
    /// resp.status(StatusCode::Ok)
    ///     .header("X-Custom-Id", 128)
    ///     .body("ok")
    /// # });
    /// ```
    ///
    /// # Panics
    /// Error message: `header() needs status() first and no body yet`
    #[inline]
    #[track_caller]
    pub fn header<N: WriteBuffer, V: WriteBuffer>(&mut self, name: N, value: V) -> &mut Self {
        debug_assert!(
            self.state == ResponseState::Headers,
            "header() needs status() first and no body yet"
        );

        name.write_to(&mut self.buffer);
        self.buffer.extend_from_slice(b": ");
        value.write_to(&mut self.buffer);
        self.buffer.push(b'\n');
        self
    }

    /// Writes `data` as the body and completes the response.
    ///
    /// # Panics
    /// Error message: `body needs status() first`
    #[inline]
    #[track_caller]
    pub fn body<T: WriteBuffer>(&mut self, data: T) -> Handled {
        debug_assert!(
            self.state == ResponseState::Headers,
            "body needs status() first"
        );

        self.start_body();
        data.write_to(&mut self.buffer);
        self.end_body()
    }

    /// Lets `f` stream the body into a [`BodyWriter`], then completes the response.
    ///
    /// # Examples
    /// ```
    /// # funhttp::run_test(|_, resp| {
    /// use funhttp::StatusCode;
    /// use std::io::Write;
    ///
    /// resp.status(StatusCode::Ok)
    ///     .body_with(|writer| {
    ///         writer.write("Result is: ");
    ///         let _ = write!(writer, "{}", 6 * 7);
    ///     })
    /// # });
    /// ```
    ///
    /// # Panics
    /// Error message: `body needs status() first`
    #[inline]
    #[track_caller]
    pub fn body_with<F: FnOnce(&mut BodyWriter)>(&mut self, f: F) -> Handled {
        debug_assert!(
            self.state == ResponseState::Headers,
            "body needs status() first"
        );

        self.start_body();
        f(&mut BodyWriter(&mut self.buffer));
        self.end_body()
    }

    /// Writes `data` as the whole output, without status line or headers.
    ///
    /// Used for requests that never got far enough to be routed.
    ///
    /// # Panics
    /// Error message: `An unstructured response must use exactly one method`
    #[inline]
    #[track_caller]
    pub fn raw<T: WriteBuffer>(&mut self, data: T) -> Handled {
        debug_assert!(
            self.state == ResponseState::Clean,
            "An unstructured response must use exactly one method"
        );

        data.write_to(&mut self.buffer);
        self.end_body()
    }
}

impl Response {
    #[inline(always)]
    fn start_body(&mut self) {
        self.buffer.push(b'\n');
        self.start_body = self.buffer.len();
    }

    #[inline(always)]
    fn end_body(&mut self) -> Handled {
        self.state = ResponseState::Complete;
        Handled(())
    }
}

pub mod write {
    use std::io::Write;

    /// Sink handed to [`body_with`](super::Response::body_with); also an [`io::Write`](std::io::Write).
    #[derive(Debug)]
    pub struct BodyWriter<'a>(pub(crate) &'a mut Vec<u8>);

    impl BodyWriter<'_> {
        /// Appends `value` to the body.
        #[inline]
        pub fn write<T: WriteBuffer>(&mut self, value: T) {
            value.write_to(self.0);
        }
    }

    impl std::io::Write for BodyWriter<'_> {
        #[inline]
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        #[inline]
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Anything that can be copied into a [`Response`](super::Response): text,
    /// bytes, `i32` and `i64` out of the box.
    ///
    /// # Examples
    /// ```
    /// use funhttp::WriteBuffer;
    ///
    /// struct Shout(&'static str);
    ///
    /// impl WriteBuffer for Shout {
    ///     fn write_to(&self, buffer: &mut Vec<u8>) {
    ///         buffer.extend(self.0.bytes().map(|b| b.to_ascii_uppercase()));
    ///     }
    /// }
    /// ```
    pub trait WriteBuffer {
        fn write_to(&self, buffer: &mut Vec<u8>);
    }

    macro_rules! impl_write_buffer {
        (number => $($t:ty),*) => {
            $(impl WriteBuffer for $t {
                #[inline] fn write_to(&self, buffer: &mut Vec<u8>) {
                    // Writing into a `Vec` cannot fail
                    let _ = write!(buffer, "{}", self);
                }
            })*
        };
    }

    impl<T: WriteBuffer + ?Sized> WriteBuffer for &T {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            T::write_to(*self, buffer);
        }
    }
    impl WriteBuffer for str {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            buffer.extend_from_slice(self.as_bytes());
        }
    }
    impl WriteBuffer for [u8] {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            buffer.extend_from_slice(self);
        }
    }
    impl WriteBuffer for String {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            buffer.extend_from_slice(self.as_bytes());
        }
    }
    impl WriteBuffer for Vec<u8> {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            buffer.extend_from_slice(self);
        }
    }
    impl<const N: usize> WriteBuffer for [u8; N] {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            buffer.extend_from_slice(self);
        }
    }
    impl_write_buffer! {
        number => i32, i64
    }
}


#[cfg(test)]
mod body_tests {
    use super::*;
    use crate::tools::*;

    #[test]
    fn wire_format() {
        let mut resp = Response::new(&RespLimits::default());
        resp.status(StatusCode::Ok)
            .content_type(ContentType::Html)
            .body("Result is: 12");

        assert_eq!(
            str_op(resp.buffer()),
            "HTTP/1.1 200 OK\nContent-Type: text/html; charset=utf-8\n\nResult is: 12"
        );
        assert_eq!(resp.body_bytes(), b"Result is: 12");
        assert_eq!(resp.content_type_value(), Some(ContentType::Html));
        assert!(resp.is_complete());
    }

    #[test]
    fn empty_body() {
        let mut resp = Response::new(&RespLimits::default());
        resp.status(StatusCode::NotFound)
            .content_type(ContentType::Binary)
            .body("");

        assert_eq!(
            str_op(resp.buffer()),
            "HTTP/1.1 404 Not Found\nContent-Type: application/octet-stream\n\n"
        );
        assert!(resp.body_bytes().is_empty());
    }

    #[test]
    fn body_with_numbers() {
        let mut resp = Response::new(&RespLimits::default());
        resp.status(StatusCode::Ok).body_with(|w| {
            w.write("n=");
            w.write(-42i32);
            w.write(",");
            w.write(8_589_934_592i64);
            w.write(b"!");
        });

        assert_eq!(resp.body_bytes(), b"n=-42,8589934592!");
    }

    #[test]
    fn raw_output() {
        let mut resp = Response::new(&RespLimits::default());
        resp.raw("<html>Illegal request: no GET</html>");

        assert_eq!(resp.status_code(), None);
        assert_eq!(str_op(resp.buffer()), "<html>Illegal request: no GET</html>");
        assert_eq!(resp.body_bytes(), resp.buffer());
    }

    #[test]
    fn reset() {
        let limits = RespLimits::default();
        let mut resp = Response::new(&limits);
        resp.status(StatusCode::Ok).body("x");
        resp.reset(&limits);

        assert!(resp.buffer().is_empty());
        assert_eq!(resp.status_code(), None);
        assert!(!resp.is_complete());
    }

    #[test]
    #[should_panic(expected = "header() needs status() first and no body yet")]
    fn header_after_body() {
        let mut resp = Response::new(&RespLimits::default());
        resp.status(StatusCode::Ok).body("");
        resp.header("Name", "value");
    }
}
