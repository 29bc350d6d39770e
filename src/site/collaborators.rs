//! Capabilities the routes depend on: the served directory, the remote JSON
//! fetcher and today's date.

use chrono::NaiveDate;
use std::{
    fs,
    future::Future,
    io,
    path::{Component, Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Read access to the served directory.
pub trait Directory: Send + Sync + 'static {
    /// Names of the directory's entries, sorted.
    fn list(&self) -> io::Result<Vec<String>>;

    /// Contents of the file at `path`, relative to the directory.
    ///
    /// Fails with [`io::ErrorKind::NotFound`] for paths that leave the directory.
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// [`Directory`] backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct WwwDirectory {
    root: PathBuf,
}

impl WwwDirectory {
    #[inline]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl Directory for WwwDirectory {
    fn list(&self) -> io::Result<Vec<String>> {
        let mut names = fs::read_dir(&self.root)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<Vec<_>>>()?;

        names.sort_unstable();
        Ok(names)
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        let relative = Path::new(path);
        let contained = relative
            .components()
            .all(|part| matches!(part, Component::Normal(_) | Component::CurDir));

        if !contained {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "path leaves the served directory",
            ));
        }

        fs::read(self.root.join(relative))
    }
}

//

/// Fetches the body of a URL.
///
/// Implementations bound the whole exchange in time and report non-success
/// statuses as errors; nothing is retried.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("upstream answered with status {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// [`Fetcher`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            // api.github.com rejects requests without one
            .user_agent(concat!("funhttp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

//

/// Source of the current date.
pub trait Clock: Send + Sync + 'static {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    fn www(files: &[(&str, &str)]) -> (tempfile::TempDir, WwwDirectory) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }

        let www = WwwDirectory::new(dir.path());
        (dir, www)
    }

    #[test]
    fn list_is_sorted() {
        let (_dir, www) = www(&[("b.txt", "b"), ("a.txt", "a"), ("root.html", "")]);

        assert_eq!(www.list().unwrap(), ["a.txt", "b.txt", "root.html"]);
    }

    #[test]
    fn list_empty() {
        let (_dir, www) = www(&[]);

        assert!(www.list().unwrap().is_empty());
    }

    #[test]
    fn read_relative() {
        let (dir, www) = www(&[("a.txt", "hello")]);
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), "nested").unwrap();

        let cases = [("a.txt", "hello"), ("./a.txt", "hello"), ("sub/b.txt", "nested")];

        for (path, content) in cases {
            assert_eq!(www.read(path).unwrap(), content.as_bytes(), "{path:?}");
        }
    }

    #[test]
    fn read_outside_is_not_found() {
        let (_dir, www) = www(&[("a.txt", "hello")]);

        let cases = ["missing.txt", "../a.txt", "sub/../../a.txt", "/etc/hostname"];

        for path in cases {
            assert_eq!(
                www.read(path).unwrap_err().kind(),
                io::ErrorKind::NotFound,
                "{path:?}"
            );
        }
    }

    #[test]
    fn fetch_error_messages() {
        #[rustfmt::skip]
        let cases = [
            (FetchError::Status(404),                  "upstream answered with status 404"),
            (FetchError::Timeout("deadline".into()),   "request timed out: deadline"),
            (FetchError::Transport("refused".into()),  "refused"),
        ];

        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
        }
    }

    // Accepts one connection, reads the request and answers with `reply`.
    async fn upstream(reply: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/users/x/repos", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = [0; 4096];
            let _ = stream.read(&mut request).await;
            stream.write_all(reply).await.unwrap();
        });

        url
    }

    fn fetcher(millis: u64) -> HttpFetcher {
        HttpFetcher::new(Duration::from_millis(millis)).unwrap()
    }

    #[tokio::test]
    async fn fetch_body() {
        let url = upstream(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n[]").await;

        assert_eq!(fetcher(2000).fetch(&url).await, Ok("[]".to_string()));
    }

    #[tokio::test]
    async fn fetch_error_status() {
        #[rustfmt::skip]
        let cases: [(&'static [u8], u16); 2] = [
            (b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", 404),
            (b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", 503),
        ];

        for (reply, status) in cases {
            let url = upstream(reply).await;
            assert_eq!(fetcher(2000).fetch(&url).await, Err(FetchError::Status(status)));
        }
    }

    #[tokio::test]
    async fn fetch_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/slow", listener.local_addr().unwrap());

        // Holds the connection open without ever answering
        let silent = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(stream);
        });

        let result = fetcher(200).fetch(&url).await;
        silent.abort();

        assert!(matches!(result, Err(FetchError::Timeout(_))), "{result:?}");
    }

    #[tokio::test]
    async fn fetch_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let result = fetcher(2000).fetch(&url).await;

        assert!(matches!(result, Err(FetchError::Transport(_))), "{result:?}");
    }
}
