use crate::{ContentType, Handled, Response, StatusCode};
use std::{fmt, io};
use thiserror::Error;

/// Failures while reading or parsing a request, before any route runs.
///
/// Each one is terminal for its connection only: it is turned into a response
/// by [`ErrorKind::write_response`] and the server moves on.
#[derive(Debug, PartialEq, Error)]
pub(crate) enum ErrorKind {
    /// No line starting with `GET` before the blank line ending the head.
    #[error("no GET request line")]
    MissingRequest,

    /// A `GET` line without a `/`-prefixed target between two spaces.
    #[error("Malformed request line: '{0}'")]
    MalformedRequestLine(String),

    /// The head did not end within the configured buffer.
    #[error("Request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    /// The `GET` line holds bytes that are not `UTF-8`.
    #[error("Request line is not valid UTF-8")]
    InvalidEncoding,

    #[error("{0}")]
    Io(IoError),
}

impl ErrorKind {
    pub(crate) fn write_response(&self, response: &mut Response) -> Handled {
        match self {
            Self::MissingRequest => response.raw("<html>Illegal request: no GET</html>"),
            Self::MalformedRequestLine(_) | Self::HeadTooLarge(_) | Self::InvalidEncoding => {
                response
                    .status(StatusCode::BadRequest)
                    .content_type(ContentType::Html)
                    .body(self.to_string())
            }
            Self::Io(_) => response.raw(format!("<html>ERROR: {self}</html>")),
        }
    }
}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

#[derive(Debug)]
pub(crate) struct IoError(pub(crate) io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
