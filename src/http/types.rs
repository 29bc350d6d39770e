//! Core HTTP protocol types

// STATUS_CODE

macro_rules! set_status_codes {
    ($(
        $(#[$docs:meta])+
        $name:ident = ($num:expr, $str:expr);
    )+) => {
        /// HTTP status codes a route can answer with.
        ///
        /// The server never emits anything outside this set: every failure is
        /// either a `400`, a missing file (`404`) or an unstructured body.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $(#[$docs])+
            $name = $num,
        )+ }

        impl StatusCode {
            // Returns the status line without its terminator (e.g., `b"HTTP/1.1 200 OK"`).
            #[inline]
            pub(crate) const fn to_first_line(&self) -> &'static [u8] {
                match self { $(
                    StatusCode::$name => concat!("HTTP/1.1 ", $num, " ", $str).as_bytes(),
                )+ }
            }

            /// Numeric value of the status code.
            #[inline]
            pub const fn as_u16(&self) -> u16 {
                *self as u16
            }
        }
    }
}

set_status_codes! {
    /// [[RFC9110, Section 15.3.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.1)]
    Ok = (200, "OK");
    /// [[RFC9110, Section 15.5.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.1)]
    BadRequest = (400, "Bad Request");
    /// [[RFC9110, Section 15.5.5](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.5)]
    NotFound = (404, "Not Found");
}

// CONTENT_TYPE

/// Value of the single `Content-Type` header every structured response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `text/html; charset=utf-8`, used by every page and every error.
    Html,
    /// `application/json; charset=utf-8`, used by the `json` route only.
    Json,
    /// `application/octet-stream`, raw file passthrough without a charset.
    Binary,
}

impl ContentType {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ContentType::Html => "text/html; charset=utf-8",
            ContentType::Json => "application/json; charset=utf-8",
            ContentType::Binary => "application/octet-stream",
        }
    }
}
