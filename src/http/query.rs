//! URL query string decoder with percent-decoding and flexible collection support.

use memchr::{memchr, memchr2};
use thiserror::Error;

/// URL query string decoder.
///
/// Splits a query of the form `k1=v1&k2=v2` on `&`, then splits every segment
/// on its **first** `=` (so a value may itself contain `=`). Keys and values are
/// percent-decoded with UTF-8 semantics: `+` becomes a space and `%XX` becomes
/// the corresponding byte.
///
/// Every segment must contain a `=`. A bare `flag` or an empty segment between
/// two `&` is rejected with [`Error::MalformedQueryPair`] instead of being
/// silently dropped. An entirely empty query yields an empty collection.
///
/// # Examples
/// ```rust
/// use funhttp::query::{Query, QueryParams};
///
/// let params: QueryParams = Query::parse("num1=3&num2=4", 10).unwrap();
/// assert_eq!(params.get("num1"), Some("3"));
/// assert_eq!(params.get("num2"), Some("4"));
///
/// // Later occurrences overwrite earlier ones
/// let params: QueryParams = Query::parse("a=1&a=2", 10).unwrap();
/// assert_eq!(params.get("a"), Some("2"));
///
/// // Decoding
/// let params: QueryParams = Query::parse("q=hello+world%2Fme&eq=a=b", 10).unwrap();
/// assert_eq!(params.get("q"), Some("hello world/me"));
/// assert_eq!(params.get("eq"), Some("a=b"));
///
/// // A segment without `=`
/// assert!(Query::parse::<QueryParams>("flag", 10).is_err());
/// ```
pub struct Query;

impl Query {
    /// Decodes a query string into a new collection.
    ///
    /// # Arguments
    /// - `query`: the raw (still encoded) query, without the leading `?`
    /// - `limit`: maximum number of parameters to accept
    #[inline]
    pub fn parse<C: QueryCollector>(query: &str, limit: usize) -> Result<C, Error> {
        let mut result = C::with_capacity(limit.min(16));
        Self::parse_into(&mut result, query, limit)?;
        Ok(result)
    }

    /// Decodes a query string into an existing collection.
    ///
    /// Parameters are appended, so a collection can be reused for several
    /// queries. Nothing is added if any segment fails to decode.
    pub fn parse_into<C: QueryCollector>(
        result: &mut C,
        query: &str,
        limit: usize,
    ) -> Result<(), Error> {
        if query.is_empty() {
            return Ok(());
        }

        let data = query.as_bytes();
        let mut decoded = Vec::new();

        let mut start = 0;
        loop {
            // Find next '&' or end of string
            let end = memchr(b'&', &data[start..])
                .map(|pos| start + pos)
                .unwrap_or(data.len());

            let segment = &query[start..end];
            let index = memchr(b'=', segment.as_bytes())
                .ok_or_else(|| Error::MalformedQueryPair(segment.to_string()))?;

            decoded.push((decode(&segment[..index])?, decode(&segment[index + 1..])?));

            if end == data.len() {
                break;
            }
            start = end + 1;
        }

        for (key, value) in decoded {
            if result.length() >= limit && !result.contains(&key) {
                return Err(Error::OverLimit(limit));
            }
            result.add_param(key, value);
        }

        Ok(())
    }
}

/// Percent-decodes a single query component.
///
/// `+` decodes to a space and `%XX` to the byte `0xXX`. The decoded bytes must
/// form valid UTF-8.
///
/// # Examples
/// ```rust
/// use funhttp::query::decode;
///
/// assert_eq!(decode("a+b%3Dc").unwrap(), "a b=c");
/// assert_eq!(decode("%E2%9C%93").unwrap(), "\u{2713}");
/// assert!(decode("%G1").is_err());
/// assert!(decode("100%").is_err());
/// ```
pub fn decode(component: &str) -> Result<String, Error> {
    let src = component.as_bytes();
    let invalid = || Error::InvalidEncoding(component.to_string());

    let mut buf = Vec::with_capacity(src.len());
    let mut pos = 0;

    while let Some(offset) = memchr2(b'%', b'+', &src[pos..]) {
        let index = pos + offset;
        buf.extend_from_slice(&src[pos..index]);

        match src[index] {
            b'+' => {
                buf.push(b' ');
                pos = index + 1;
            }
            _ => {
                let hex = src.get(index + 1..index + 3).ok_or_else(invalid)?;
                let high = hex_value(hex[0]).ok_or_else(invalid)?;
                let low = hex_value(hex[1]).ok_or_else(invalid)?;

                buf.push(high << 4 | low);
                pos = index + 3;
            }
        }
    }
    buf.extend_from_slice(&src[pos..]);

    simdutf8::basic::from_utf8(&buf)
        .map(str::to_owned)
        .map_err(|_| invalid())
}

/// Percent-encodes a single query component (the inverse of [`decode`]).
///
/// ASCII alphanumerics and `-_.*` pass through, a space becomes `+`, every
/// other byte becomes `%XX`.
pub fn encode(component: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut result = String::with_capacity(component.len());
    for &byte in component.as_bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                result.push(byte as char)
            }
            b' ' => result.push('+'),
            _ => {
                result.push('%');
                result.push(HEX[(byte >> 4) as usize] as char);
                result.push(HEX[(byte & 0x0F) as usize] as char);
            }
        }
    }
    result
}

#[inline(always)]
const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// A trait for types that can collect decoded query parameters.
///
/// # Examples
/// ```rust
/// use funhttp::query::{Query, QueryCollector};
///
/// struct Keys(Vec<String>);
///
/// impl QueryCollector for Keys {
///     fn add_param(&mut self, key: String, _: String) {
///         self.0.push(key);
///     }
///
///     fn length(&self) -> usize {
///         self.0.len()
///     }
///
///     fn contains(&self, key: &str) -> bool {
///         self.0.iter().any(|k| k == key)
///     }
///
///     fn with_capacity(capacity: usize) -> Self {
///         Keys(Vec::with_capacity(capacity))
///     }
/// }
///
/// let keys: Keys = Query::parse("a=1&b=2", 10).unwrap();
/// assert_eq!(keys.0, ["a", "b"]);
/// ```
pub trait QueryCollector
where
    Self: Sized,
{
    /// Adds a decoded parameter to the collection.
    fn add_param(&mut self, key: String, value: String);

    /// Returns the current number of parameters in the collection.
    fn length(&self) -> usize;

    /// Whether adding `key` again would replace an existing entry
    /// rather than grow the collection.
    fn contains(&self, key: &str) -> bool;

    /// Creates a new collection with the specified capacity.
    fn with_capacity(capacity: usize) -> Self;
}

/// Ordered mapping from parameter name to value.
///
/// Keys keep the position of their first occurrence; a repeated key
/// overwrites the earlier value (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Returns the value stored for `key`.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value stored for `key` if it is present and non-empty.
    #[inline]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl QueryCollector for QueryParams {
    fn add_param(&mut self, key: String, value: String) {
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.pairs.push((key, value)),
        }
    }

    #[inline(always)]
    fn length(&self) -> usize {
        self.pairs.len()
    }

    #[inline(always)]
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[inline(always)]
    fn with_capacity(capacity: usize) -> Self {
        QueryParams {
            pairs: Vec::with_capacity(capacity),
        }
    }
}

/// Error types that can occur while decoding a query string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A `&`-separated segment has no `=` separator.
    #[error("Malformed query parameter '{0}': expected key=value")]
    MalformedQueryPair(String),

    /// A component holds a truncated or non-hex `%` sequence, or decodes to
    /// bytes that are not UTF-8.
    #[error("Invalid encoding in query component '{0}'")]
    InvalidEncoding(String),

    /// The number of parameters exceeded the specified limit.
    #[error("Query parameter limit exceeded: limit={0}")]
    OverLimit(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(params: &QueryParams) -> Vec<(&str, &str)> {
        params.iter().collect()
    }

    #[test]
    fn basic() {
        let params: QueryParams = Query::parse("num1=3&num2=4", 8).unwrap();

        assert_eq!(params.len(), 2);
        assert_eq!(pairs(&params), [("num1", "3"), ("num2", "4")]);
    }

    #[test]
    fn empty_query() {
        let params: QueryParams = Query::parse("", 8).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn first_equals_splits() {
        let params: QueryParams = Query::parse("expr=a=b=c&empty=", 8).unwrap();

        assert_eq!(params.get("expr"), Some("a=b=c"));
        assert_eq!(params.get("empty"), Some(""));
        assert_eq!(params.get_non_empty("empty"), None);
    }

    #[test]
    fn last_write_wins() {
        let params: QueryParams = Query::parse("a=1&b=2&a=3", 8).unwrap();

        assert_eq!(pairs(&params), [("a", "3"), ("b", "2")]);
    }

    #[test]
    fn malformed_pairs() {
        #[rustfmt::skip]
        let cases = [
            ("flag",          "flag"),
            ("a=1&flag",      "flag"),
            ("a=1&&b=2",      ""),
            ("a=1&",          ""),
            ("&",             ""),
        ];

        for (query, segment) in cases {
            assert_eq!(
                Query::parse::<QueryParams>(query, 8),
                Err(Error::MalformedQueryPair(segment.to_string())),
                "{query}"
            );
        }
    }

    #[test]
    fn percent_decoding() {
        #[rustfmt::skip]
        let cases = [
            ("plain",         Some("plain")),
            ("a+b",           Some("a b")),
            ("a%20b",         Some("a b")),
            ("%26%3D%2B",     Some("&=+")),
            ("%c3%a9t%C3%A9", Some("été")),
            ("users%2Frepos", Some("users/repos")),
            ("",              Some("")),

            ("%",             None),
            ("%2",            None),
            ("%zz",           None),
            ("%FF",           None), // not UTF-8
            ("%C3",           None), // truncated sequence
        ];

        for (input, expected) in cases {
            match expected {
                Some(expected) => assert_eq!(decode(input).unwrap(), expected),
                None => assert_eq!(
                    decode(input),
                    Err(Error::InvalidEncoding(input.to_string()))
                ),
            }
        }
    }

    #[test]
    fn invalid_encoding_in_pair() {
        assert_eq!(
            Query::parse::<QueryParams>("a=%G0", 8),
            Err(Error::InvalidEncoding("%G0".to_string()))
        );
    }

    #[test]
    fn encode_then_decode() {
        let cases = [
            "a&b=c",
            "1 + 1 = 2",
            "50% off",
            "Grüße, 世界 🫖",
            "users/amehlhase316/repos",
            "",
        ];

        for key in cases {
            let query = format!("{}={}", encode(key), encode(key));
            let params: QueryParams = Query::parse(&query, 8).unwrap();

            assert_eq!(params.len(), 1);
            assert_eq!(params.get(key), Some(key));
        }
    }

    #[test]
    fn encode_then_decode_generated() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        const PIECES: &[&str] = &[
            "a", "Z", "7", "&", "=", "+", " ", "%", "%2", "/", "?", "#", "-_.*", "é", "世", "🫖", "\n",
        ];
        let mut rng = StdRng::seed_from_u64(0x5EED);

        for round in 0..400 {
            let len = rng.gen_range(0..24);
            let text = if round % 2 == 0 {
                (0..len)
                    .map(|_| PIECES[rng.gen_range(0..PIECES.len())])
                    .collect::<String>()
            } else {
                let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
                String::from_utf8_lossy(&bytes).into_owned()
            };

            assert_eq!(decode(&encode(&text)).as_deref(), Ok(text.as_str()));

            let query = format!("{}={}&x={}", encode(&text), encode(&text), encode(&text));
            let params: QueryParams = Query::parse(&query, 8).unwrap();
            assert_eq!(params.get(&text), Some(text.as_str()), "{text:?}");
            assert_eq!(params.get("x"), Some(text.as_str()), "{text:?}");
        }
    }

    #[test]
    fn limit_error() {
        assert_eq!(
            Query::parse::<QueryParams>("a=1&b=2", 1),
            Err(Error::OverLimit(1))
        );
        // Duplicates do not grow the map
        assert!(Query::parse::<QueryParams>("a=1&a=2", 1).is_ok());
    }
}
