use crate::{
    query::{Query, QueryParams},
    router::{self, QueryRoute, Route},
    site::{
        collaborators::{Clock, Directory, Fetcher},
        tables::{Movie, IMAGES},
    },
    ContentType, Handled, Handler, Request, Response, StatusCode, WriteBuffer,
};
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

const ROOT_TEMPLATE: &str = "root.html";
const RANDOM_PAGE: &str = "index.html";
const LINKS_PLACEHOLDER: &str = "${links}";

const DEFAULT_GITHUB_API: &str = "https://api.github.com/";
const DEFAULT_QUERY_PARTS: usize = 16;

const MULTIPLY_MISSING: &str =
    "You need to provide two numbers to multiply. You did not provide 2 numbers.";
const MULTIPLY_INVALID: &str = "Invalid input: The parameters 'num1' and 'num2' must be integers.";
const BIRTHDAY_MISSING: &str = "You need to provide two numbers, one for the integer \
    representation of the month that you were born and the other for the day in which you were \
    born.";
const BIRTHDAY_INVALID: &str = "Invalid input";
const QUOTE_NOT_A_NUMBER: &str = "Invalid quote number";
const QUOTE_OUT_OF_RANGE: &str = "Invalid quote number. Try 1, 2, or 3.";
const MOVIE_UNKNOWN: &str = "Invalid movie. Try 'happy' or 'madison'.";
const URL_FORMAT_HINT: &str = "Please check the formatting of your url. <br />";
const UNKNOWN_REQUEST: &str = "I am not sure what you want me to do...";

/// The fun routes, served over a directory, a remote fetcher and a clock.
///
/// Every request is resolved through the route table and answered by exactly
/// one of the route handlers below. Failures of a single request become `400`
/// or `404` responses; nothing is retried.
///
/// # Examples
/// ```
/// use funhttp::{HttpFetcher, Site, SystemClock, WwwDirectory};
/// use std::time::Duration;
///
/// let site = Site::new(
///     WwwDirectory::new("www"),
///     HttpFetcher::new(Duration::from_secs(20)).unwrap(),
///     SystemClock,
/// )
/// .github_api("https://api.github.com/")
/// .query_parts(8);
/// ```
#[derive(Debug)]
pub struct Site<D, F, C> {
    directory: D,
    fetcher: F,
    clock: C,
    github_api: String,
    query_parts: usize,
}

impl<D: Directory, F: Fetcher, C: Clock> Site<D, F, C> {
    pub fn new(directory: D, fetcher: F, clock: C) -> Self {
        Self {
            directory,
            fetcher,
            clock,
            github_api: DEFAULT_GITHUB_API.to_string(),
            query_parts: DEFAULT_QUERY_PARTS,
        }
    }

    /// Base URL the `query` parameter of `/github` is appended to.
    pub fn github_api<S: Into<String>>(mut self, base: S) -> Self {
        self.github_api = base.into();
        self
    }

    /// Maximum number of distinct query parameters accepted per request
    /// (default: `16`).
    pub fn query_parts(mut self, limit: usize) -> Self {
        self.query_parts = limit;
        self
    }
}

impl<D: Directory, F: Fetcher, C: Clock> Handler for Site<D, F, C> {
    async fn handle(&self, request: &Request, response: &mut Response) -> Handled {
        match router::resolve(request.target()) {
            (Route::Root, _) => self.root(response),
            (Route::RandomJson, _) => random_json(response),
            (Route::RandomPage, _) => self.random_page(response),
            (Route::File, path) => self.file(path, response),
            (Route::Query(route), query) => {
                let params = match Query::parse::<QueryParams>(query, self.query_parts) {
                    Ok(params) => params,
                    Err(err) => return html(response, StatusCode::BadRequest, err.to_string()),
                };

                match route {
                    QueryRoute::Multiply => multiply(&params, response),
                    QueryRoute::Github => self.github(&params, response).await,
                    QueryRoute::Birthday => birthday(&params, self.clock.today(), response),
                    QueryRoute::HappyMadison => happy_madison(&params, response),
                }
            }
            (Route::Unknown, _) => unknown(response),
        }
    }
}

impl<D: Directory, F: Fetcher, C: Clock> Site<D, F, C> {
    fn root(&self, response: &mut Response) -> Handled {
        let page = self.directory.read(ROOT_TEMPLATE).and_then(|page| {
            let links = file_list(&self.directory.list()?);
            Ok(String::from_utf8_lossy(&page).replace(LINKS_PLACEHOLDER, &links))
        });

        match page {
            Ok(page) => html(response, StatusCode::Ok, page),
            Err(err) => io_failure(response, ROOT_TEMPLATE, err),
        }
    }

    fn random_page(&self, response: &mut Response) -> Handled {
        match self.directory.read(RANDOM_PAGE) {
            Ok(page) => html(response, StatusCode::Ok, page),
            Err(err) => io_failure(response, RANDOM_PAGE, err),
        }
    }

    fn file(&self, path: &str, response: &mut Response) -> Handled {
        match self.directory.read(path) {
            Ok(data) => response
                .status(StatusCode::Ok)
                .content_type(ContentType::Binary)
                .body(data),
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path, error = %err, "file not readable");
                }
                html(response, StatusCode::NotFound, format!("File not found: {path}"))
            }
        }
    }

    async fn github(&self, params: &QueryParams, response: &mut Response) -> Handled {
        let Some(query) = params.get("query") else {
            let message = format!("{URL_FORMAT_HINT}missing 'query' parameter");
            return html(response, StatusCode::BadRequest, message);
        };

        let url = format!("{}{}", self.github_api, query);
        let json = match self.fetcher.fetch(&url).await {
            Ok(json) if !json.trim().is_empty() => json,
            Ok(_) => {
                let message = format!("Could not fetch json for url: {url}");
                return html(response, StatusCode::BadRequest, message);
            }
            Err(err) => {
                tracing::warn!(%url, error = %err, "fetch failed");
                let message = format!("Could not fetch json for url: {url} <br />{err}");
                return html(response, StatusCode::BadRequest, message);
            }
        };

        match serde_json::from_str::<Vec<Repository>>(&json) {
            Ok(repositories) => response
                .status(StatusCode::Ok)
                .content_type(ContentType::Html)
                .body_with(|writer| {
                    for repo in &repositories {
                        let _ = write!(
                            writer,
                            "full_name: {}\tid: {}\towner/login: {}\n<br />",
                            repo.full_name, repo.id, repo.owner.login
                        );
                    }
                }),
            Err(err) => html(
                response,
                StatusCode::BadRequest,
                format!("{URL_FORMAT_HINT}{err}"),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: String,
    id: i64,
    owner: Owner,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

#[derive(Debug, Serialize)]
struct ImageCard<'a> {
    header: &'a str,
    image: &'a str,
}

fn random_json(response: &mut Response) -> Handled {
    let (header, image) = IMAGES[rand::thread_rng().gen_range(0..IMAGES.len())];

    response
        .status(StatusCode::Ok)
        .content_type(ContentType::Json)
        .body_with(|writer| {
            let _ = serde_json::to_writer(writer, &ImageCard { header, image });
        })
}

fn multiply(params: &QueryParams, response: &mut Response) -> Handled {
    let (Some(num1), Some(num2)) = (params.get_non_empty("num1"), params.get_non_empty("num2"))
    else {
        return html(response, StatusCode::BadRequest, MULTIPLY_MISSING);
    };

    match (num1.parse::<i32>(), num2.parse::<i32>()) {
        (Ok(num1), Ok(num2)) => response
            .status(StatusCode::Ok)
            .content_type(ContentType::Html)
            .body_with(|writer| {
                writer.write("Result is: ");
                writer.write(num1.wrapping_mul(num2));
            }),
        _ => html(response, StatusCode::BadRequest, MULTIPLY_INVALID),
    }
}

fn birthday(params: &QueryParams, today: NaiveDate, response: &mut Response) -> Handled {
    let (Some(day), Some(month)) = (params.get_non_empty("day"), params.get_non_empty("month"))
    else {
        return html(response, StatusCode::BadRequest, BIRTHDAY_MISSING);
    };

    let days = match (day.parse::<i32>(), month.parse::<i32>()) {
        (Ok(day), Ok(month)) => days_until_birthday(today, month, day),
        _ => None,
    };

    match days {
        Some(days) => response
            .status(StatusCode::Ok)
            .content_type(ContentType::Html)
            .body_with(|writer| {
                writer.write("Days until your next birthday: ");
                writer.write(days);
            }),
        None => html(response, StatusCode::BadRequest, BIRTHDAY_INVALID),
    }
}

/// Days from `today` to the first `month`/`day` strictly after it, or `None`
/// if no year has that date.
fn days_until_birthday(today: NaiveDate, month: i32, day: i32) -> Option<i64> {
    let month = u32::try_from(month).ok()?;
    let day = u32::try_from(day).ok()?;

    // 2000 is a leap year, so 29 Feb passes
    NaiveDate::from_ymd_opt(2000, month, day)?;

    // A leap day recurs at most 8 years apart
    (today.year()..=today.year() + 8)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| *date > today)
        .map(|date| (date - today).num_days())
}

fn happy_madison(params: &QueryParams, response: &mut Response) -> Handled {
    let (Some(movie), Some(quote)) = (params.get("movie"), params.get("quote")) else {
        return unknown(response);
    };

    let Ok(number) = quote.parse::<i32>() else {
        return html(response, StatusCode::BadRequest, QUOTE_NOT_A_NUMBER);
    };
    let Some(movie) = Movie::parse(movie) else {
        return html(response, StatusCode::BadRequest, MOVIE_UNKNOWN);
    };

    match movie.quote(number) {
        Some(quote) => response
            .status(StatusCode::Ok)
            .content_type(ContentType::Html)
            .body_with(|writer| {
                writer.write("<html><body><h1>Quote:</h1><p>");
                writer.write(quote);
                writer.write("</p></body></html>");
            }),
        None => html(response, StatusCode::BadRequest, QUOTE_OUT_OF_RANGE),
    }
}

fn unknown(response: &mut Response) -> Handled {
    html(response, StatusCode::BadRequest, UNKNOWN_REQUEST)
}

/// `<ul>` of the served names, or a notice when there are none.
fn file_list(names: &[String]) -> String {
    if names.is_empty() {
        return "No files in directory".to_string();
    }

    let mut list = String::from("<ul>\n");
    for name in names {
        list.push_str("<li>");
        list.push_str(name);
        list.push_str("</li>");
    }
    list.push_str("</ul>\n");
    list
}

#[inline]
fn html<T: WriteBuffer>(response: &mut Response, status: StatusCode, body: T) -> Handled {
    response
        .status(status)
        .content_type(ContentType::Html)
        .body(body)
}

fn io_failure(response: &mut Response, path: &str, err: io::Error) -> Handled {
    tracing::warn!(path, error = %err, "page not readable");
    response.raw(format!("<html>ERROR: {err}</html>"))
}
