//! HTTP session used for every upstream request
//!
//! The pipeline only ever needs "GET this URL and give me status + body", so
//! that capability is a trait. Login and cookie handling stay inside the
//! concrete `HttpSession`; the fetchers never touch auth state.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use std::time::Duration as StdDuration;
use tracing::{debug, info};

/// Raw response of one GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to issue an (optionally authenticated) GET request.
///
/// `Err` means the request never produced a response (transport or auth
/// failure). Any HTTP status, including errors, comes back as `Ok`.
#[async_trait]
pub trait MarketSession: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// reqwest-backed session
pub struct HttpSession {
    client: reqwest::Client,
    authenticated: bool,
}

impl HttpSession {
    /// Session without credentials, used for public catalog listings
    pub fn anonymous() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            authenticated: false,
        })
    }

    /// Session carrying a `steamLoginSecure` cookie.
    ///
    /// Fails when the token is missing or cannot be sent as a header; the run
    /// must not start without a usable login.
    pub fn authenticated(login_secure: &str) -> Result<Self> {
        let token = login_secure.trim();
        if token.is_empty() {
            return Err(Error::Auth("steamLoginSecure token is empty".to_string()));
        }

        let mut cookie = HeaderValue::from_str(&format!("steamLoginSecure={}", token))
            .map_err(|e| Error::Auth(format!("Invalid steamLoginSecure token: {}", e)))?;
        cookie.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie);

        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Created authenticated market session");

        Ok(Self {
            client,
            authenticated: true,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

#[async_trait]
impl MarketSession for HttpSession {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!(url = url, authenticated = self.authenticated, "Sending GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request failed: {} (url: {})", e, url)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory session for tests

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub enum Reply {
        Status(u16, String),
        TransportError,
    }

    impl Reply {
        pub fn ok(body: &str) -> Self {
            Reply::Status(200, body.to_string())
        }
    }

    /// Routes are matched by substring of the requested URL, first match
    /// wins. Each route replays its replies in order and then keeps
    /// repeating the last one.
    #[derive(Default)]
    pub struct ScriptedSession {
        routes: Mutex<Vec<(String, VecDeque<Reply>)>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSession {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(self, pattern: &str, replies: Vec<Reply>) -> Self {
            self.routes
                .lock()
                .unwrap()
                .push((pattern.to_string(), replies.into_iter().collect()));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn calls_matching(&self, pattern: &str) -> usize {
            self.calls().iter().filter(|url| url.contains(pattern)).count()
        }
    }

    #[async_trait]
    impl MarketSession for ScriptedSession {
        async fn get(&self, url: &str) -> Result<HttpResponse> {
            self.calls.lock().unwrap().push(url.to_string());

            let reply = {
                let mut routes = self.routes.lock().unwrap();
                let route = routes
                    .iter_mut()
                    .find(|(pattern, _)| url.contains(pattern.as_str()));
                match route {
                    Some((_, replies)) if replies.len() > 1 => replies.pop_front(),
                    Some((_, replies)) => replies.front().cloned(),
                    None => None,
                }
            };

            match reply {
                Some(Reply::Status(status, body)) => Ok(HttpResponse::new(status, body)),
                Some(Reply::TransportError) => {
                    Err(Error::Network("scripted transport failure".to_string()))
                }
                None => Ok(HttpResponse::new(404, "no route")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticated_rejects_empty_token() {
        let result = HttpSession::authenticated("   ");
        assert!(matches!(result, Err(Error::Auth(_))));
    }

    #[test]
    fn test_authenticated_rejects_header_breaking_token() {
        let result = HttpSession::authenticated("abc\ndef");
        assert!(matches!(result, Err(Error::Auth(_))));
    }

    #[test]
    fn test_authenticated_session() {
        let session = HttpSession::authenticated("76561198000000000%7C%7Ctoken").unwrap();
        assert!(session.is_authenticated());
        assert!(!HttpSession::anonymous().unwrap().is_authenticated());
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(429, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }
}
