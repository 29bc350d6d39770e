//! Ordered route table.
//!
//! Targets are matched against [`ROUTES`] top to bottom, first match wins.
//! Literal routes compare case-insensitively; prefix routes are
//! case-sensitive and hand the remainder of the target to the handler.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    Root,
    RandomJson,
    RandomPage,
    File,
    Query(QueryRoute),
    Unknown,
}

/// Routes whose suffix is a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryRoute {
    Multiply,
    Github,
    Birthday,
    HappyMadison,
}

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Empty,
    Exact(&'static str),
    Prefix(&'static str),
}

impl Pattern {
    /// Returns what is left of `target` after a match.
    #[inline]
    fn strip<'a>(&self, target: &'a str) -> Option<&'a str> {
        match *self {
            Pattern::Empty => target.is_empty().then_some(""),
            Pattern::Exact(literal) => target.eq_ignore_ascii_case(literal).then_some(""),
            Pattern::Prefix(prefix) => target.strip_prefix(prefix),
        }
    }
}

#[rustfmt::skip]
const ROUTES: [(Pattern, Route); 8] = [
    (Pattern::Empty,                   Route::Root),
    (Pattern::Exact("json"),           Route::RandomJson),
    (Pattern::Exact("random"),         Route::RandomPage),
    (Pattern::Prefix("file/"),         Route::File),
    (Pattern::Prefix("multiply?"),     Route::Query(QueryRoute::Multiply)),
    (Pattern::Prefix("github?"),       Route::Query(QueryRoute::Github)),
    (Pattern::Prefix("birthday?"),     Route::Query(QueryRoute::Birthday)),
    (Pattern::Prefix("happyMadison?"), Route::Query(QueryRoute::HappyMadison)),
];

/// Resolves a target to its route and the unconsumed suffix
/// (a file path or a still-encoded query string).
pub(crate) fn resolve(target: &str) -> (Route, &str) {
    ROUTES
        .iter()
        .find_map(|(pattern, route)| pattern.strip(target).map(|rest| (*route, rest)))
        .unwrap_or((Route::Unknown, target))
}
