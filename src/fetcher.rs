//! Page fetching with scoped sessions.
//!
//! A job acquires exactly one session from a [`PageFetcher`], loads every page
//! through it, and gives it back when the job leaves per-link processing.
//! [`SessionGuard`] ties the release to scope, so it also happens when the job
//! future is dropped mid-flight or a parser panics.
//!
//! [`HttpFetcher`] is the production implementation: a session is a
//! `reqwest::Client` configured for the job, and every page load is bounded
//! by a timeout.

use crate::error::FetchError;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Acquires sessions and loads pages through them.
pub trait PageFetcher {
    /// The per-job resource (browser context, HTTP client, connection).
    type Session;

    async fn acquire_session(&self) -> Result<Self::Session, FetchError>;

    /// Retrieve the raw HTML at `url`.
    ///
    /// Implementations must give up after a bounded time and report
    /// [`FetchError::Timeout`].
    async fn load_page(&self, session: &Self::Session, url: &str) -> Result<String, FetchError>;

    /// Release the session immediately.
    fn release_session(&self, session: Self::Session);
}

/// Releases its session back to the fetcher when dropped.
pub struct SessionGuard<'a, F: PageFetcher> {
    fetcher: &'a F,
    session: Option<F::Session>,
}

impl<'a, F: PageFetcher> SessionGuard<'a, F> {
    /// Acquire a session from `fetcher` and guard it.
    pub async fn acquire(fetcher: &'a F) -> Result<Self, FetchError> {
        let session = fetcher.acquire_session().await?;
        Ok(Self {
            fetcher,
            session: Some(session),
        })
    }

    /// Load a page through the guarded session.
    pub async fn load_page(&self, url: &str) -> Result<String, FetchError> {
        self.fetcher.load_page(self.session(), url).await
    }

    fn session(&self) -> &F::Session {
        // Only `release` and `drop` take the session, and both consume the guard.
        self.session
            .as_ref()
            .expect("session is held until the guard is consumed")
    }

    /// Release now instead of at end of scope.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(session) = self.session.take() {
            self.fetcher.release_session(session);
        }
    }
}

impl<F: PageFetcher> Drop for SessionGuard<'_, F> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// One HTTP client per job.
#[derive(Debug)]
pub struct HttpSession {
    pub id: Uuid,
    client: reqwest::Client,
}

impl Deref for HttpSession {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Fetches pages over plain HTTP with `reqwest`.
#[derive(Debug)]
pub struct HttpFetcher {
    user_agent: String,
    accept_language: String,
    timeout: Duration,
    open_sessions: AtomicUsize,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>, accept_language: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept_language: accept_language.into(),
            timeout,
            open_sessions: AtomicUsize::new(0),
        }
    }

    /// Sessions acquired but not yet released.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }
}

impl PageFetcher for HttpFetcher {
    type Session = HttpSession;

    #[instrument(level = "debug", skip_all)]
    async fn acquire_session(&self) -> Result<HttpSession, FetchError> {
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(&self.accept_language)
            .map_err(|e| FetchError::Session(format!("invalid Accept-Language header: {e}")))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Session(e.to_string()))?;

        let session = HttpSession {
            id: Uuid::new_v4(),
            client,
        };
        let open = self.open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(session_id = %session.id, open, "Acquired fetch session");
        Ok(session)
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn load_page(&self, session: &HttpSession, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let request = async {
            let response = session.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            Ok::<_, FetchError>(response.text().await?)
        };

        // The client has no timeout of its own; every expiry maps to `Timeout`.
        let res = match tokio::time::timeout(self.timeout, request).await {
            Ok(Err(FetchError::Request(e))) if e.is_timeout() => Err(FetchError::Timeout(self.timeout)),
            Ok(res) => res,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };
        let dt = t0.elapsed();

        match &res {
            Ok(body) => info!(bytes = body.len(), elapsed_ms = dt.as_millis() as u64, "Loaded page"),
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "Page load failed"),
        }
        res
    }

    fn release_session(&self, session: HttpSession) {
        let open = self.open_sessions.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!(session_id = %session.id, open, "Released fetch session");
        drop(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[derive(Default)]
    struct CountingFetcher {
        acquired: AtomicUsize,
        released: AtomicUsize,
        fail_acquire: AtomicBool,
    }

    impl PageFetcher for CountingFetcher {
        type Session = u32;

        async fn acquire_session(&self) -> Result<u32, FetchError> {
            if self.fail_acquire.load(Ordering::SeqCst) {
                return Err(FetchError::Session("no browser".to_string()));
            }
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        }

        async fn load_page(&self, session: &u32, url: &str) -> Result<String, FetchError> {
            Ok(format!("{session}:{url}"))
        }

        fn release_session(&self, _session: u32) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let fetcher = CountingFetcher::default();
        {
            let guard = SessionGuard::acquire(&fetcher).await.unwrap();
            assert_eq!(guard.load_page("https://a").await.unwrap(), "7:https://a");
        }
        assert_eq!(fetcher.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_release_happens_once() {
        let fetcher = CountingFetcher::default();
        let guard = SessionGuard::acquire(&fetcher).await.unwrap();
        guard.release();
        assert_eq!(fetcher.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_acquire_releases_nothing() {
        let fetcher = CountingFetcher::default();
        fetcher.fail_acquire.store(true, Ordering::SeqCst);
        assert!(SessionGuard::acquire(&fetcher).await.is_err());
        assert_eq!(fetcher.released.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_guard_releases_when_future_is_cancelled() {
        let fetcher = CountingFetcher::default();
        let job = async {
            let _guard = SessionGuard::acquire(&fetcher).await.unwrap();
            tokio::time::sleep(Duration::from_secs(3600)).await;
        };
        let res = tokio::time::timeout(Duration::from_millis(10), job).await;
        assert!(res.is_err());
        assert_eq!(fetcher.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_http_session_accounting() {
        let fetcher = HttpFetcher::new("test-agent", "ko-KR", Duration::from_secs(5));
        let session = fetcher.acquire_session().await.unwrap();
        assert_eq!(fetcher.open_sessions(), 1);
        fetcher.release_session(session);
        assert_eq!(fetcher.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_http_silent_server_times_out() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let (socket, _) = listener.accept().await.unwrap();
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(200);
        let fetcher = HttpFetcher::new("test-agent", "ko-KR", timeout);
        let session = fetcher.acquire_session().await.unwrap();
        for _ in 0..3 {
            let err = fetcher
                .load_page(&session, &format!("http://{addr}/"))
                .await
                .unwrap_err();
            assert!(matches!(err, FetchError::Timeout(d) if d == timeout), "{err}");
            assert_eq!(err.to_string(), "timed out after 200ms");
        }
        fetcher.release_session(session);
        server.abort();
    }

    #[tokio::test]
    async fn test_http_invalid_header_is_session_error() {
        let fetcher = HttpFetcher::new("test-agent", "bad\nvalue", Duration::from_secs(5));
        let err = fetcher.acquire_session().await.unwrap_err();
        assert!(matches!(err, FetchError::Session(_)));
        assert_eq!(fetcher.open_sessions(), 0);
    }
}
